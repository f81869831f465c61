//! AI-решения: spacing, mixups, выбор атак, bookkeeping попаданий.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{choose_move, AiController, Callout, MoveChosen, SpacingPhase};
use crate::catalog::{ActionId, MoveCatalog};
use crate::clock::FrameClock;
use crate::combat::{projectile::spawn_projectile, CombatTuning, HitConfirmed};
use crate::components::{
    ActionState, Body, CombatTimers, Facing, Fighter, Health, MovementTimers, Projectile,
    ProjectileStock, Side,
};
use crate::movement::{controller::start_dash, MovementTuning};
use crate::DeterministicRng;

/// Гистерезис фаз: границы входа и минимальное удержание
const RESET_ENTER_DIST: f32 = 120.0;
const ENGAGE_ENTER_DIST: f32 = 240.0;
const RESET_DWELL_MS: f64 = 400.0;
const NEUTRAL_DWELL_MS: f64 = 420.0;
const ENGAGE_DWELL_MS: f64 = 520.0;

/// Желаемая дистанция по фазе
const RESET_DIST: f32 = 220.0;
const NEUTRAL_DIST: f32 = 150.0;
const ENGAGE_DIST: f32 = 90.0;
/// Мёртвая зона доруливания
const SPACING_DEADBAND: f32 = 12.0;
const APPROACH_SPEED: f32 = 170.0;
const APPROACH_RAMP: f32 = 1400.0;

/// Вероятности mixup'ов на средней дистанции
const FEINT_CHANCE: f32 = 0.28;
const JUKE_CHANCE: f32 = 0.22;
const PAUSE_CHANCE: f32 = 0.18;

const FEINT_MS: f64 = 180.0;
const JUKE_MS: f64 = 160.0;
const PAUSE_MS: f64 = 220.0;

const MOVE_RECOVERY_MS: f64 = 150.0;
/// Special откатывается дольше обычных ударов (как и у ручного ввода)
const SPECIAL_RECOVERY_MS: f64 = 360.0;
const THROW_COOLDOWN_MS: f64 = 700.0;
const ENGAGE_COOLDOWN_MS: f64 = 900.0;
const FINISHER_COOLDOWN_MS: f64 = 1500.0;

struct OpponentView {
    x: f32,
    alive: bool,
}

type AiItem<'a> = (
    Entity,
    &'a Fighter,
    &'a Transform,
    &'a Health,
    Mut<'a, Body>,
    Mut<'a, Facing>,
    Mut<'a, ActionState>,
    Mut<'a, MovementTimers>,
    Mut<'a, CombatTimers>,
    Mut<'a, ProjectileStock>,
    Mut<'a, AiController>,
);

/// Главный AI-цикл. Дискретные решения — раз в decision_interval,
/// доруливание дистанции — каждый кадр вне коммита.
#[allow(clippy::too_many_arguments)]
pub fn ai_decide(
    mut commands: Commands,
    clock: Res<FrameClock>,
    catalog: Res<MoveCatalog>,
    movement: Res<MovementTuning>,
    combat: Res<CombatTuning>,
    mut rng: ResMut<DeterministicRng>,
    mut chosen: EventWriter<MoveChosen>,
    mut callouts: EventWriter<Callout>,
    projectiles: Query<&Projectile>,
    mut fighters: Query<(
        Entity,
        &Fighter,
        &Transform,
        &Health,
        &mut Body,
        &mut Facing,
        &mut ActionState,
        &mut MovementTimers,
        &mut CombatTimers,
        &mut ProjectileStock,
        &mut AiController,
    )>,
) {
    let now = clock.now();
    if clock.in_hitstop() {
        return;
    }
    let dt = clock.delta_secs();

    // Снимок противников до мутабельного прохода
    let snapshot: Vec<(Entity, Side, f32, bool)> = fighters
        .iter()
        .map(|(e, f, tf, h, ..)| (e, f.side, tf.translation.x, h.is_alive()))
        .collect();

    for item in fighters.iter_mut() {
        let (entity, fighter, ..) = &item;
        let opponent = snapshot
            .iter()
            .find(|(e, side, ..)| *e != *entity && *side == fighter.side.opponent())
            .map(|&(_, _, x, alive)| OpponentView { x, alive });
        let Some(opponent) = opponent else {
            continue;
        };

        drive_fighter(
            now,
            dt,
            &mut commands,
            &catalog,
            &movement,
            &combat,
            &mut rng,
            &mut chosen,
            &mut callouts,
            &projectiles,
            item,
            &opponent,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn drive_fighter(
    now: f64,
    dt: f32,
    commands: &mut Commands,
    catalog: &MoveCatalog,
    movement: &MovementTuning,
    combat: &CombatTuning,
    rng: &mut DeterministicRng,
    chosen: &mut EventWriter<MoveChosen>,
    callouts: &mut EventWriter<Callout>,
    projectiles: &Query<&Projectile>,
    item: AiItem,
    opponent: &OpponentView,
) {
    let (
        entity,
        fighter,
        transform,
        health,
        mut body,
        mut facing,
        mut action,
        mut mt,
        mut ct,
        mut stock,
        mut ai,
    ) = item;

    if !health.is_alive() {
        body.velocity.x = 0.0;
        return;
    }

    // Stun: боец заморожен, hurt уже запрошен резолвером
    if ct.stunned(now) {
        body.velocity.x = 0.0;
        return;
    }

    let dx = opponent.x - transform.translation.x;
    let dist = dx.abs();
    facing.face_towards(dx);

    if !opponent.alive {
        body.velocity.x = 0.0;
        action.request(ActionId::Idle, 1, true, now, catalog);
        return;
    }

    // Коммит в текущее действие
    if now < ai.action_until_ms {
        return;
    }

    if now >= ai.next_decision_at_ms {
        ai.next_decision_at_ms = now + ai.profile.decision_interval_ms;

        update_phase(now, dist, &mut ai);

        let acted = decide_discrete(
            now,
            dx,
            dist,
            health,
            commands,
            catalog,
            movement,
            combat,
            rng,
            chosen,
            callouts,
            projectiles,
            entity,
            fighter,
            transform,
            &mut body,
            &facing,
            &mut action,
            &mut mt,
            &mut ct,
            &mut stock,
            &mut ai,
        );
        if acted {
            return;
        }
    }

    steer(now, dt, dx, dist, catalog, &mut body, &mut action, &mt, &mut ai);
}

fn update_phase(now: f64, dist: f32, ai: &mut AiController) {
    if now < ai.phase_until_ms {
        return;
    }
    let (phase, dwell) = if dist < RESET_ENTER_DIST {
        (SpacingPhase::Reset, RESET_DWELL_MS)
    } else if dist > ENGAGE_ENTER_DIST {
        (SpacingPhase::Engage, ENGAGE_DWELL_MS)
    } else {
        (SpacingPhase::Neutral, NEUTRAL_DWELL_MS)
    };
    if phase != ai.phase {
        ai.phase = phase;
        crate::log(&format!("AI phase -> {}", phase.label()));
    }
    // Dwell перевзводится при каждой переоценке, не только при смене —
    // иначе после первого истечения фаза дёргается на каждом решении
    ai.phase_until_ms = now + dwell;
}

/// Дискретное решение. true — действие выбрано, доруливание в этом
/// кадре не нужно.
#[allow(clippy::too_many_arguments)]
fn decide_discrete(
    now: f64,
    dx: f32,
    dist: f32,
    health: &Health,
    commands: &mut Commands,
    catalog: &MoveCatalog,
    movement: &MovementTuning,
    combat: &CombatTuning,
    rng: &mut DeterministicRng,
    chosen: &mut EventWriter<MoveChosen>,
    callouts: &mut EventWriter<Callout>,
    projectiles: &Query<&Projectile>,
    entity: Entity,
    fighter: &Fighter,
    transform: &Transform,
    body: &mut Body,
    facing: &Facing,
    action: &mut ActionState,
    mt: &mut MovementTimers,
    ct: &mut CombatTimers,
    stock: &mut ProjectileStock,
    ai: &mut AiController,
) -> bool {
    let dir = if dx >= 0.0 { 1.0 } else { -1.0 };

    // Desperation-добивание: собственный HP на дне, противник в досягаемости —
    // обычный weighted draw пропускается, идёт сильнейший приём
    if health.current < ai.profile.finisher_hp_threshold
        && dist <= ai.profile.finisher_range
        && now >= ai.finisher_cooldown_until_ms
    {
        let id = ai.profile.finisher_move;
        if commit_attack(now, id, catalog, movement, body, action, mt, ct, ai, chosen, fighter.side)
        {
            ai.finisher_cooldown_until_ms = now + FINISHER_COOLDOWN_MS;
            callouts.write(Callout {
                side: fighter.side,
                text: format!("{} GOES FOR THE KILL", fighter.side.label()),
            });
            return true;
        }
    }

    // Melee: взвешенный выбор из готовых кандидатов
    if dist <= ai.profile.melee_range {
        let candidates: Vec<(ActionId, f32)> = ai
            .profile
            .candidates
            .iter()
            .copied()
            .filter(|(id, _)| ai.move_ready(*id, now))
            .collect();

        if let Some(id) =
            choose_move(&ai.stats, ai.last_move, ai.repeat_count, &candidates, &mut rng.rng)
        {
            return commit_attack(
                now,
                id,
                catalog,
                movement,
                body,
                action,
                mt,
                ct,
                ai,
                chosen,
                fighter.side,
            );
        }
        return false;
    }

    // Средняя дистанция: mixup или бросок
    if dist <= ai.profile.throw_range {
        let roll: f32 = rng.rng.gen();

        if roll < FEINT_CHANCE {
            // Feint: шаг вперёд под defend-стойкой, без атаки
            body.velocity.x = dir * APPROACH_SPEED;
            action.request(ActionId::Defend, 2, false, now, catalog);
            ai.action_until_ms = now + FEINT_MS;
            return true;
        }
        if roll < FEINT_CHANCE + JUKE_CHANCE {
            // Juke: шаг назад
            body.velocity.x = -dir * APPROACH_SPEED;
            action.request(ActionId::Run, 1, true, now, catalog);
            ai.action_until_ms = now + JUKE_MS;
            return true;
        }
        if roll < FEINT_CHANCE + JUKE_CHANCE + PAUSE_CHANCE {
            // Пауза: стоим, читаем противника
            body.velocity.x = 0.0;
            action.request(ActionId::Idle, 1, true, now, catalog);
            ai.action_until_ms = now + PAUSE_MS;
            return true;
        }

        // Бросок: один снаряд в полёте, запас и cooldown
        let in_flight = projectiles.iter().any(|p| p.owner == entity);
        if !in_flight && now >= ai.throw_cooldown_until_ms && stock.try_take() {
            let dur = catalog.duration_ms(ActionId::Throw);
            action.request(ActionId::Throw, 4, false, now, catalog);
            body.velocity.x = 0.0;
            spawn_projectile(
                commands,
                entity,
                fighter.side,
                Vec2::new(
                    transform.translation.x + facing.sign * 30.0,
                    transform.translation.y + 14.0,
                ),
                facing.sign,
                ai.profile.projectile_speed,
                ai.profile.projectile_lifetime_ms,
                combat.projectile_damage,
            );
            ai.throw_cooldown_until_ms = now + THROW_COOLDOWN_MS;
            ai.note_move(ActionId::Throw, now + dur + MOVE_RECOVERY_MS);
            ai.action_until_ms = now + dur;
            chosen.write(MoveChosen { side: fighter.side, move_id: ActionId::Throw });
            return true;
        }
        return false;
    }

    // Далеко: рывок сближения только в фазе Engage
    if dist >= ai.profile.engage_range
        && ai.phase == SpacingPhase::Engage
        && now >= ai.dash_cooldown_until_ms
    {
        if ai.profile.engage_with_dash {
            start_dash(now, movement, mt, body, dir, !body.on_floor);
            action.request(ActionId::Dash, 3, false, now, catalog);
            // Dash держится весь активный интервал рывка
            action.expires_at_ms = mt.dash_until;
            ai.dash_cooldown_until_ms = now + ENGAGE_COOLDOWN_MS;
            ai.action_until_ms = mt.dash_until;
        } else {
            let id = ActionId::DashAttack;
            let dur = catalog.duration_ms(id);
            action.request(id, 4, false, now, catalog);
            body.velocity.x = dir * ai.profile.rush_speed;
            ct.arm_whiff(now + dur);
            ai.dash_cooldown_until_ms = now + ENGAGE_COOLDOWN_MS;
            ai.note_move(id, now + dur + move_recovery_ms(id));
            ai.action_until_ms = now + dur;
            chosen.write(MoveChosen { side: fighter.side, move_id: id });
        }
        return true;
    }

    false
}

/// Коммит в melee-атаку: запрос действия, recovery-лок, whiff-таймер,
/// статистика и событие для HUD.
#[allow(clippy::too_many_arguments)]
fn commit_attack(
    now: f64,
    id: ActionId,
    catalog: &MoveCatalog,
    movement: &MovementTuning,
    body: &mut Body,
    action: &mut ActionState,
    mt: &mut MovementTimers,
    ct: &mut CombatTimers,
    ai: &mut AiController,
    chosen: &mut EventWriter<MoveChosen>,
    side: Side,
) -> bool {
    if !action.request(id, 4, false, now, catalog) {
        return false;
    }
    let dur = catalog.duration_ms(id);
    body.velocity.x = 0.0;
    mt.lock_movement(now + dur * movement.attack_recovery_scale);
    if id.is_committal() {
        ct.arm_whiff(now + dur);
    }
    ai.note_move(id, now + dur + move_recovery_ms(id));
    ai.action_until_ms = now + dur;
    chosen.write(MoveChosen { side, move_id: id });
    true
}

/// Откат движения после применения (прибавляется к длительности анимации)
fn move_recovery_ms(id: ActionId) -> f64 {
    if id == ActionId::Special {
        SPECIAL_RECOVERY_MS
    } else {
        MOVE_RECOVERY_MS
    }
}

#[allow(clippy::too_many_arguments)]
fn steer(
    now: f64,
    dt: f32,
    dx: f32,
    dist: f32,
    catalog: &MoveCatalog,
    body: &mut Body,
    action: &mut ActionState,
    mt: &MovementTimers,
    ai: &mut AiController,
) {
    let desired = match ai.phase {
        SpacingPhase::Reset => RESET_DIST,
        SpacingPhase::Neutral => NEUTRAL_DIST,
        SpacingPhase::Engage => ENGAGE_DIST,
    };

    let err = dist - desired;
    let target_speed = if err.abs() <= SPACING_DEADBAND {
        0.0
    } else {
        let towards = if dx >= 0.0 { 1.0 } else { -1.0 };
        // err > 0 — слишком далеко, идём к противнику
        if err > 0.0 {
            towards * APPROACH_SPEED
        } else {
            -towards * APPROACH_SPEED
        }
    };

    let max_delta = APPROACH_RAMP * dt;
    ai.approach_speed = crate::movement::move_towards(ai.approach_speed, target_speed, max_delta);

    if body.on_floor && now >= mt.movement_lock_until && now >= mt.landing_lock_until {
        body.velocity.x = ai.approach_speed;
    }

    if ai.approach_speed.abs() > 20.0 {
        action.request(ActionId::Run, 1, true, now, catalog);
    } else {
        action.request(ActionId::Idle, 1, true, now, catalog);
    }
}

/// Bookkeeping попаданий: подтверждённый удар пишется в статистику
/// атакующего AI. Успешная адаптация подсвечивается callout'ом.
pub fn ai_record_hits(
    mut hits: EventReader<HitConfirmed>,
    mut callouts: EventWriter<Callout>,
    mut controllers: Query<(&Fighter, &mut AiController)>,
) {
    for hit in hits.read() {
        if let Ok((fighter, mut ai)) = controllers.get_mut(hit.attacker) {
            ai.stats.record_hit(hit.move_id);

            let stats = ai.stats.stats(hit.move_id);
            if stats.uses >= 3 && stats.accuracy() > 0.7 {
                callouts.write(Callout {
                    side: fighter.side,
                    text: format!("{} ADAPTS: {:?}", fighter.side.label(), hit.move_id),
                });
            }
        }
    }
}
