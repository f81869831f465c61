//! Снаряды: спавн, полёт, lifetime и попадания.

use bevy::prelude::*;

use crate::catalog::{ActionId, MoveCatalog};
use crate::clock::FrameClock;
use crate::combat::{CombatTuning, HitConfirmed, HitFeedback, HitSource};
use crate::components::{
    ActionState, Arena, Body, CombatTimers, Fighter, Health, MovementTimers, Projectile, Side,
};

/// Спавн снаряда. Вызывается из контроллеров (input и AI) —
/// сам по себе лимиты не проверяет, «один в полёте» и запас
/// проверяет вызывающая сторона.
#[allow(clippy::too_many_arguments)]
pub fn spawn_projectile(
    commands: &mut Commands,
    owner: Entity,
    owner_side: Side,
    origin: Vec2,
    direction: f32,
    speed: f32,
    lifetime_ms: f64,
    damage: u32,
) {
    commands.spawn((
        Transform::from_translation(origin.extend(0.0)),
        Projectile {
            owner,
            owner_side,
            velocity: Vec2::new(direction.signum() * speed, 0.0),
            remaining_lifetime_ms: lifetime_ms,
            damage,
        },
    ));
}

/// Полёт снарядов: интеграция, lifetime, границы мира.
pub fn update_projectiles(
    mut commands: Commands,
    clock: Res<FrameClock>,
    arena: Res<Arena>,
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile)>,
) {
    let dt = clock.delta_secs();
    if dt == 0.0 {
        return;
    }
    let delta_ms = clock.delta_ms();

    for (entity, mut transform, mut projectile) in projectiles.iter_mut() {
        transform.translation.x += projectile.velocity.x * dt;
        transform.translation.y += projectile.velocity.y * dt;
        projectile.remaining_lifetime_ms -= delta_ms;

        if projectile.remaining_lifetime_ms <= 0.0
            || arena.projectile_out_of_bounds(transform.translation.x)
        {
            commands.entity(entity).despawn();
        }
    }
}

type VictimItem<'a> = (
    Entity,
    &'a Fighter,
    &'a Transform,
    Mut<'a, Health>,
    Mut<'a, Body>,
    Mut<'a, ActionState>,
    Mut<'a, MovementTimers>,
    Mut<'a, CombatTimers>,
);

/// AABB overlap снаряд × боец противоположной стороны.
///
/// Попадание — сильный punish: длинный stun, heavy hit-stop.
pub fn resolve_projectile_hits(
    mut commands: Commands,
    mut clock: ResMut<FrameClock>,
    catalog: Res<MoveCatalog>,
    tuning: Res<CombatTuning>,
    mut feedback: ResMut<HitFeedback>,
    mut hits: EventWriter<HitConfirmed>,
    projectiles: Query<(Entity, &Transform, &Projectile)>,
    mut fighters: Query<
        (
            Entity,
            &Fighter,
            &Transform,
            &mut Health,
            &mut Body,
            &mut ActionState,
            &mut MovementTimers,
            &mut CombatTimers,
        ),
        Without<Projectile>,
    >,
) {
    let now = clock.now();

    for (proj_entity, proj_tf, projectile) in projectiles.iter() {
        for victim in fighters.iter_mut() {
            let hit = try_hit(
                now,
                &catalog,
                &tuning,
                &mut feedback,
                &mut hits,
                proj_tf,
                projectile,
                victim,
            );
            if hit {
                commands.entity(proj_entity).despawn();
                clock.begin_hitstop(tuning.hitstop_heavy_ms);
                break;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn try_hit(
    now: f64,
    catalog: &MoveCatalog,
    tuning: &CombatTuning,
    feedback: &mut HitFeedback,
    hits: &mut EventWriter<HitConfirmed>,
    proj_tf: &Transform,
    projectile: &Projectile,
    victim: VictimItem,
) -> bool {
    let (entity, fighter, transform, mut health, mut body, mut action, mut mt, mut ct) = victim;

    if fighter.side == projectile.owner_side || !health.is_alive() {
        return false;
    }

    let half = tuning.fighter_half_extents + tuning.projectile_half_extents;
    let dx = (proj_tf.translation.x - transform.translation.x).abs();
    let dy = (proj_tf.translation.y - (transform.translation.y + tuning.fighter_half_extents.y)).abs();
    if dx > half.x || dy > half.y {
        return false;
    }

    health.take_damage(projectile.damage);

    let dir = projectile.velocity.x.signum();
    body.velocity.x = dir * tuning.knockback_for(fighter.side);

    // Долгий stun: AI/инпут жертвы заблокирован до stun_until
    ct.stun_until = now + tuning.projectile_stun_ms;
    action.request(ActionId::Hurt, 6, false, now, catalog);
    mt.lock_movement(now + catalog.duration_ms(ActionId::Hurt));

    feedback.shake_until_ms = now + tuning.shake_heavy_ms;
    feedback.last_hit_heavy = true;

    crate::log(&format!(
        "{} struck by projectile for {} (stunned {}ms)",
        fighter.side.label(),
        projectile.damage,
        tuning.projectile_stun_ms as u64
    ));

    hits.write(HitConfirmed {
        attacker: projectile.owner,
        attacker_side: projectile.owner_side,
        defender: entity,
        move_id: ActionId::Throw,
        damage: projectile.damage,
        source: HitSource::Projectile,
    });

    true
}
