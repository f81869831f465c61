//! Movement controller: платформенная физика бойца.
//!
//! Неявные состояния {grounded-idle, grounded-move, airborne-rise,
//! airborne-fall, wall-slide, dashing, locked} выражены через timing
//! windows и Body-флаги, а не отдельный enum — каждое состояние
//! выводится из них детерминированно.
//!
//! Все системы работают в FixedUpdate; ожидания — только timestamp'ы.

use bevy::prelude::*;

pub mod controller;
pub mod physics;

pub use controller::apply_input_control;
pub use physics::integrate_bodies;

/// Параметры движения (px, px/s, px/s², мс)
#[derive(Resource, Debug, Clone)]
pub struct MovementTuning {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub air_speed: f32,
    pub accel_ground: f32,
    pub decel_ground: f32,
    pub accel_air: f32,
    pub decel_air: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub jump_cut_velocity: f32,
    pub wall_slide_speed: f32,
    pub wall_jump_push: f32,
    pub coyote_ms: f64,
    pub jump_buffer_ms: f64,
    pub wall_grace_ms: f64,
    pub landing_lag_ms: f64,
    pub dash_speed: f32,
    pub dash_duration_ms: f64,
    pub dash_cooldown_ms: f64,
    pub dash_cancel_ms: f64,
    pub max_jumps: u8,
    /// Нижняя граница airborne-контроля (у апекса прыжка управляемость выше)
    pub air_control_floor: f32,
    /// Скорость падения, при которой контроль достигает нижней границы
    pub air_control_falloff: f32,
    pub attack_recovery_scale: f64,
    pub heavy_recovery_scale: f64,
    pub combo_chain_window_ms: f64,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            walk_speed: 150.0,
            run_speed: 260.0,
            air_speed: 150.0,
            accel_ground: 2200.0,
            decel_ground: 2600.0,
            accel_air: 1400.0,
            decel_air: 1600.0,
            gravity: 1200.0,
            jump_velocity: 546.0,
            jump_cut_velocity: 220.0,
            wall_slide_speed: 110.0,
            wall_jump_push: 300.0,
            coyote_ms: 120.0,
            jump_buffer_ms: 120.0,
            wall_grace_ms: 140.0,
            landing_lag_ms: 80.0,
            dash_speed: 598.0,
            dash_duration_ms: 160.0,
            dash_cooldown_ms: 320.0,
            dash_cancel_ms: 70.0,
            max_jumps: 2,
            air_control_floor: 0.35,
            air_control_falloff: 1200.0,
            attack_recovery_scale: 0.6,
            heavy_recovery_scale: 1.2,
            combo_chain_window_ms: 420.0,
        }
    }
}

/// Event: пыль под ногами (landing, dash) — hook для визуального слоя
#[derive(Event, Debug, Clone)]
pub struct DustPuff {
    pub position: Vec2,
    pub flipped: bool,
}

/// Линейное приближение к цели с ограниченным шагом
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MovementTuning>()
            .add_event::<DustPuff>()
            .add_systems(
                FixedUpdate,
                apply_input_control.in_set(crate::SimSet::Control),
            )
            .add_systems(FixedUpdate, integrate_bodies.in_set(crate::SimSet::Physics));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_clamps_step() {
        assert_eq!(move_towards(0.0, 100.0, 30.0), 30.0);
        assert_eq!(move_towards(90.0, 100.0, 30.0), 100.0);
        assert_eq!(move_towards(0.0, -100.0, 30.0), -30.0);
        assert_eq!(move_towards(5.0, 5.0, 30.0), 5.0);
    }
}
