//! InputSnapshot — покадровый срез намерений от исключённого input-слоя.
//!
//! Core не опрашивает устройства: host заполняет снапшот перед кадром.
//! Для headless-тестов снапшот выставляется руками (mock input).

use bevy::prelude::*;

#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub jump_down: bool,
    pub jump_pressed: bool,
    pub dash_down: bool,
    pub dash_pressed: bool,
    pub attack_pressed: bool,
    pub special_pressed: bool,
    pub throw_pressed: bool,
    pub heal_down: bool,
}

impl InputSnapshot {
    /// Направление по горизонтали: -1 / 0 / +1
    pub fn direction(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Ввод, способный отменить dash после cancel-окна
    pub fn dash_cancel_input(&self) -> bool {
        self.attack_pressed || self.special_pressed || self.throw_pressed || self.heal_down
    }

    /// Сброс one-shot флагов в конце кадра (host может звать сам)
    pub fn clear_pressed(&mut self) {
        self.jump_pressed = false;
        self.dash_pressed = false;
        self.attack_pressed = false;
        self.special_pressed = false;
        self.throw_pressed = false;
    }
}
