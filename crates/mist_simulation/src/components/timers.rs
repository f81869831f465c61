//! Timing windows бойца.
//!
//! Каждое окно — timestamp "now + offset", активно iff now < until.
//! Дисциплина владения: у каждого окна ровно один writer-подсистема
//! (movement / combat resolver / AI), читать может кто угодно.

use bevy::prelude::*;

use crate::catalog::ActionId;

/// Окна движения. Writer: movement controller.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct MovementTimers {
    pub dash_until: f64,
    pub dash_started_at: f64,
    pub dash_cooldown_until: f64,
    pub dash_direction: f32,
    pub jump_buffer_until: f64,
    pub coyote_until: f64,
    pub wall_grace_until: f64,
    pub landing_lock_until: f64,
    /// Writer-исключение: movement_lock пишут и movement, и combat
    /// (hurt/death) — но всегда через max(), окно только расширяется
    pub movement_lock_until: f64,
    pub heal_lock_until: f64,
    pub jumps_remaining: u8,
    pub air_sprint_carry: bool,
    pub was_on_floor: bool,
    pub prev_jump_down: bool,
}

impl Default for MovementTimers {
    fn default() -> Self {
        Self {
            dash_until: 0.0,
            dash_started_at: 0.0,
            dash_cooldown_until: 0.0,
            dash_direction: 1.0,
            jump_buffer_until: 0.0,
            coyote_until: 0.0,
            wall_grace_until: 0.0,
            landing_lock_until: 0.0,
            movement_lock_until: 0.0,
            heal_lock_until: 0.0,
            jumps_remaining: 2,
            air_sprint_carry: false,
            was_on_floor: true,
            prev_jump_down: false,
        }
    }
}

impl MovementTimers {
    pub fn dashing(&self, now_ms: f64) -> bool {
        now_ms < self.dash_until
    }

    /// Dash можно отменить qualifying-вводом только после cancel-окна
    pub fn dash_cancel_eligible(&self, now_ms: f64, cancel_ms: f64) -> bool {
        now_ms >= self.dash_started_at + cancel_ms
    }

    pub fn lock_movement(&mut self, until_ms: f64) {
        self.movement_lock_until = self.movement_lock_until.max(until_ms);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Окна боя. Writer: combat resolver (stun, whiff, hit gate);
/// special/throw cooldowns пишет тот, кто исполняет ввод (control).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct CombatTimers {
    pub stun_until: f64,
    /// Gate на повторные попадания этого атакующего за один замах
    pub melee_gate_until: f64,
    /// 0 = нет незакрытой committal-атаки
    pub whiff_check_at: f64,
    /// "landed" — атака попала до whiff-check (подавляет self-stun)
    pub whiff_landed: bool,
    pub special_cooldown_until: f64,
    pub throw_cooldown_until: f64,
}

impl CombatTimers {
    pub fn stunned(&self, now_ms: f64) -> bool {
        now_ms < self.stun_until
    }

    /// Открывает whiff-окно committal-атаки: к моменту check_at должно
    /// случиться ровно одно из {landed, self-stun}
    pub fn arm_whiff(&mut self, check_at_ms: f64) {
        self.whiff_check_at = check_at_ms;
        self.whiff_landed = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Счётчик комбо атакующего
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct ComboState {
    pub count: u32,
    pub reset_at_ms: f64,
}

impl ComboState {
    pub fn register_hit(&mut self, now_ms: f64, reset_window_ms: f64) {
        self.count = (self.count + 1).min(99);
        self.reset_at_ms = now_ms + reset_window_ms;
    }

    pub fn tick(&mut self, now_ms: f64) {
        if self.count > 0 && now_ms > self.reset_at_ms {
            self.count = 0;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Цепочка ручных combo-атак (attack1 → attack2 → attack3).
/// Используется только control-слоем (человеческий ввод).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct ComboChain {
    pub index: u8,
    pub queued: bool,
    pub last_attack_at_ms: f64,
}

impl ComboChain {
    /// Следующая атака цепочки (циклично 1→2→3→1)
    pub fn next_attack(&mut self) -> ActionId {
        let id = match self.index % 3 {
            0 => ActionId::Attack1,
            1 => ActionId::Attack2,
            _ => ActionId::Attack3,
        };
        self.index = (self.index + 1) % 3;
        id
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_sequence_and_reset() {
        let mut combo = ComboState::default();

        // 0→1→2→3 при попаданиях внутри окна
        combo.register_hit(0.0, 900.0);
        combo.register_hit(100.0, 900.0);
        combo.register_hit(200.0, 900.0);
        assert_eq!(combo.count, 3);

        // Окно не истекло — счётчик держится
        combo.tick(1000.0);
        assert_eq!(combo.count, 3);

        // Истекло — сброс в 0
        combo.tick(1101.0);
        assert_eq!(combo.count, 0);
    }

    #[test]
    fn test_combo_chain_cycles() {
        let mut chain = ComboChain::default();
        assert_eq!(chain.next_attack(), ActionId::Attack1);
        assert_eq!(chain.next_attack(), ActionId::Attack2);
        assert_eq!(chain.next_attack(), ActionId::Attack3);
        assert_eq!(chain.next_attack(), ActionId::Attack1);
    }

    #[test]
    fn test_dash_cancel_window() {
        let mut timers = MovementTimers::default();
        timers.dash_started_at = 1000.0;
        timers.dash_until = 1160.0;

        // До истечения cancel-окна dash не отменяется
        assert!(!timers.dash_cancel_eligible(1000.0, 70.0));
        assert!(!timers.dash_cancel_eligible(1069.0, 70.0));
        // После — отменяется всегда
        assert!(timers.dash_cancel_eligible(1070.0, 70.0));
        assert!(timers.dash_cancel_eligible(1159.0, 70.0));
    }

    #[test]
    fn test_movement_lock_only_extends() {
        let mut timers = MovementTimers::default();
        timers.lock_movement(500.0);
        timers.lock_movement(300.0); // Меньшее окно не сужает
        assert_eq!(timers.movement_lock_until, 500.0);
        timers.lock_movement(800.0);
        assert_eq!(timers.movement_lock_until, 800.0);
    }
}
