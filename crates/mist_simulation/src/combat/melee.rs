//! Melee-резолвер: контактные удары двух бойцов.

use bevy::prelude::*;

use crate::catalog::MoveCatalog;
use crate::catalog::ActionId;
use crate::clock::FrameClock;
use crate::combat::{CombatTuning, HitConfirmed, HitFeedback, HitSource};
use crate::components::*;

type MeleeItem<'a> = (
    Entity,
    &'a Fighter,
    &'a Transform,
    Mut<'a, Health>,
    Mut<'a, Body>,
    Mut<'a, ActionState>,
    Mut<'a, MovementTimers>,
    Mut<'a, CombatTimers>,
    Mut<'a, ComboState>,
);

/// Система: melee-удары.
///
/// Попадание = атакующий в melee-анимации И горизонтальная дистанция
/// в пределах melee_range, с gate'ом на повторные попадания за замах.
pub fn resolve_melee(
    mut clock: ResMut<FrameClock>,
    catalog: Res<MoveCatalog>,
    tuning: Res<CombatTuning>,
    mut feedback: ResMut<HitFeedback>,
    mut hits: EventWriter<HitConfirmed>,
    mut fighters: Query<(
        Entity,
        &Fighter,
        &Transform,
        &mut Health,
        &mut Body,
        &mut ActionState,
        &mut MovementTimers,
        &mut CombatTimers,
        &mut ComboState,
    )>,
) {
    let now = clock.now();
    let mut pairs = fighters.iter_combinations_mut();
    while let Some([mut a, mut b]) = pairs.fetch_next() {
        strike(now, &catalog, &tuning, &mut clock, &mut feedback, &mut hits, &mut a, &mut b);
        strike(now, &catalog, &tuning, &mut clock, &mut feedback, &mut hits, &mut b, &mut a);
    }
}

#[allow(clippy::too_many_arguments)]
fn strike(
    now: f64,
    catalog: &MoveCatalog,
    tuning: &CombatTuning,
    clock: &mut FrameClock,
    feedback: &mut HitFeedback,
    hits: &mut EventWriter<HitConfirmed>,
    attacker: &mut MeleeItem,
    defender: &mut MeleeItem,
) {
    let (atk_entity, atk_fighter, atk_tf, atk_health, _, atk_action, _, atk_ct, atk_combo) =
        attacker;
    let (def_entity, def_fighter, def_tf, def_health, def_body, def_action, def_mt, _, _) =
        defender;

    if !atk_health.is_alive() || !def_health.is_alive() {
        return;
    }
    if !atk_action.current.is_melee_attack() {
        return;
    }
    if now < atk_ct.melee_gate_until {
        return;
    }

    let dx = (atk_tf.translation.x - def_tf.translation.x).abs();
    if dx > tuning.melee_range {
        return;
    }

    // Подтверждённый удар
    atk_ct.melee_gate_until = now + tuning.melee_gate_ms;
    let damage = tuning.melee_damage(atk_combo.count);
    def_health.take_damage(damage);

    // Knockback от атакующего
    let dir = if def_tf.translation.x < atk_tf.translation.x { -1.0 } else { 1.0 };
    def_body.velocity.x = dir * tuning.knockback_for(def_fighter.side);

    atk_combo.register_hit(now, tuning.combo_reset_ms);
    // Атака попала — whiff punishment подавлен
    atk_ct.whiff_landed = true;

    // Hit feedback: hit-stop + screen shake, масштаб по тяжести урона
    let heavy = damage >= tuning.heavy_damage_threshold;
    clock.begin_hitstop(if heavy { tuning.hitstop_heavy_ms } else { tuning.hitstop_ms });
    feedback.shake_until_ms = now + if heavy { tuning.shake_heavy_ms } else { tuning.shake_ms };
    feedback.last_hit_heavy = heavy;

    // Жертва уходит в hurt поверх движения
    def_action.request(ActionId::Hurt, 6, false, now, catalog);
    def_mt.lock_movement(now + catalog.duration_ms(ActionId::Hurt));

    crate::log(&format!(
        "{} hits {} with {:?} for {} (combo {})",
        atk_fighter.side.label(),
        def_fighter.side.label(),
        atk_action.current,
        damage,
        atk_combo.count
    ));

    hits.write(HitConfirmed {
        attacker: *atk_entity,
        attacker_side: atk_fighter.side,
        defender: *def_entity,
        move_id: atk_action.current,
        damage,
        source: HitSource::Melee,
    });
}
