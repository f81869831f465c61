//! Arena — геометрия мира: пол, стены, spawn-точки.
//!
//! Единственная коллизия в core — axis-aligned контакт с полом и стенами
//! (non-goal: никакого rigid-body разрешения).

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Arena {
    /// Уровень пола (y-up: боец стоит на floor_y)
    pub floor_y: f32,
    /// Левая/правая стены (границы мира)
    pub wall_left_x: f32,
    pub wall_right_x: f32,
    /// Центр арены по X
    pub center_x: f32,
    /// Смещение spawn-точек от центра
    pub spawn_offset: f32,
    /// Запас за стенами, после которого снаряд уничтожается
    pub projectile_margin: f32,
}

impl Default for Arena {
    fn default() -> Self {
        // 1280x720, бойцы в центре, стены = границы мира
        Self {
            floor_y: 0.0,
            wall_left_x: 40.0,
            wall_right_x: 1240.0,
            center_x: 640.0,
            spawn_offset: 160.0,
            projectile_margin: 50.0,
        }
    }
}

impl Arena {
    pub fn spawn_x(&self, side: crate::components::Side) -> f32 {
        match side {
            crate::components::Side::Yin => self.center_x - self.spawn_offset,
            crate::components::Side::Yang => self.center_x + self.spawn_offset,
        }
    }

    pub fn projectile_out_of_bounds(&self, x: f32) -> bool {
        x < self.wall_left_x - self.projectile_margin
            || x > self.wall_right_x + self.projectile_margin
    }
}
