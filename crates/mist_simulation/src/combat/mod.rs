//! Combat resolver: melee, снаряды, whiff punishment, hit feedback.
//!
//! Порядок внутри кадра:
//! 1. resolve_melee — контактные удары (attack1-3, dash attack)
//! 2. update_projectiles — полёт/lifetime/границы мира
//! 3. resolve_projectile_hits — AABB overlap и урон снарядов
//! 4. check_whiffs — наказание промахнувшихся committal-атак
//! 5. tick_combos — сброс истёкших комбо-окон
//!
//! Hit-stop пишется только отсюда (FrameClock::begin_hitstop).

use bevy::prelude::*;

pub mod events;
pub mod melee;
pub mod projectile;
pub mod whiff;

pub use events::{HitConfirmed, HitFeedback, HitSource};
pub use melee::resolve_melee;
pub use whiff::{check_whiffs, tick_combos};

use crate::components::Side;

/// Параметры боя
#[derive(Resource, Debug, Clone)]
pub struct CombatTuning {
    pub melee_range: f32,
    pub base_damage: u32,
    pub combo_damage_step: u32,
    pub combo_reset_ms: f64,
    /// Gate атакующего: не больше одного попадания за замах
    pub melee_gate_ms: f64,
    /// Knockback жертвы (px/s), per Side
    knockback: [f32; 2],
    pub projectile_speed: f32,
    pub projectile_lifetime_ms: f64,
    pub projectile_damage: u32,
    /// Stun от снаряда заметно длиннее melee-stagger: снаряд — сильный
    /// punish, но ограниченный ресурс
    pub projectile_stun_ms: f64,
    pub whiff_stun_ms: f64,
    pub hitstop_ms: f64,
    pub hitstop_heavy_ms: f64,
    pub heavy_damage_threshold: u32,
    pub shake_ms: f64,
    pub shake_heavy_ms: f64,
    pub fighter_half_extents: Vec2,
    pub projectile_half_extents: Vec2,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            melee_range: 90.0,
            base_damage: 10,
            combo_damage_step: 5,
            combo_reset_ms: 900.0,
            melee_gate_ms: 180.0,
            knockback: [220.0, 200.0],
            projectile_speed: 520.0,
            projectile_lifetime_ms: 1000.0,
            projectile_damage: 10,
            projectile_stun_ms: 3000.0,
            whiff_stun_ms: 1000.0,
            hitstop_ms: 35.0,
            hitstop_heavy_ms: 60.0,
            heavy_damage_threshold: 30,
            shake_ms: 70.0,
            shake_heavy_ms: 120.0,
            fighter_half_extents: Vec2::new(48.0, 80.0),
            projectile_half_extents: Vec2::new(16.0, 16.0),
        }
    }
}

impl CombatTuning {
    pub fn knockback_for(&self, victim: Side) -> f32 {
        self.knockback[victim.index()]
    }

    pub fn melee_damage(&self, combo_count: u32) -> u32 {
        self.base_damage + combo_count * self.combo_damage_step
    }
}

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatTuning>()
            .init_resource::<HitFeedback>()
            .add_event::<HitConfirmed>()
            .add_systems(
                FixedUpdate,
                (
                    resolve_melee,
                    projectile::update_projectiles,
                    projectile::resolve_projectile_hits,
                    check_whiffs,
                    tick_combos,
                )
                    .chain()
                    .in_set(crate::SimSet::Resolve),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_melee_damage_scales_with_combo() {
        let tuning = CombatTuning::default();
        // Комбо 0→1→2→3: урон растёт ровно на step за попадание
        assert_eq!(tuning.melee_damage(0), 10);
        assert_eq!(tuning.melee_damage(1), 15);
        assert_eq!(tuning.melee_damage(2), 20);
        assert_eq!(tuning.melee_damage(3), 25);
    }

    #[test]
    fn test_projectile_stun_longer_than_whiff() {
        let tuning = CombatTuning::default();
        assert!(tuning.projectile_stun_ms > tuning.whiff_stun_ms);
    }
}
