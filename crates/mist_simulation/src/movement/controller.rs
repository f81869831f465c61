//! Input-driven контроллер: исполняет InputSnapshot бойца.
//!
//! Порядок обработки внутри кадра повторяет каскад приоритетов:
//! stun → heal lock → special/throw/heal → attack combo → dash →
//! movement lock → разгон/торможение → анимации → wall slide →
//! jump buffer / coyote / double jump / wall jump.
//!
//! AI-бойцы этим контроллером не управляются (см. ai::decision) —
//! физика у них общая (physics::integrate_bodies).

use bevy::prelude::*;

use crate::ai::AiController;
use crate::catalog::{ActionId, MoveCatalog};
use crate::clock::FrameClock;
use crate::combat::{projectile::spawn_projectile, CombatTuning};
use crate::components::*;
use crate::movement::{move_towards, DustPuff, MovementTuning};

#[allow(clippy::too_many_arguments)]
pub fn apply_input_control(
    mut commands: Commands,
    clock: Res<FrameClock>,
    catalog: Res<MoveCatalog>,
    tuning: Res<MovementTuning>,
    combat: Res<CombatTuning>,
    mut dust: EventWriter<DustPuff>,
    projectiles: Query<&Projectile>,
    mut fighters: Query<
        (
            Entity,
            &Fighter,
            &Health,
            &InputSnapshot,
            &Transform,
            &mut Body,
            &mut Facing,
            &mut ActionState,
            &mut MovementTimers,
            &mut CombatTimers,
            &mut ComboChain,
            &mut ProjectileStock,
        ),
        Without<AiController>,
    >,
) {
    let now = clock.now();
    let dt = clock.delta_secs();

    for (
        entity,
        fighter,
        health,
        input,
        transform,
        mut body,
        mut facing,
        mut action,
        mut timers,
        mut combat_timers,
        mut chain,
        mut stock,
    ) in fighters.iter_mut()
    {
        // Мёртвый боец не принимает ввод до reset раунда
        if !health.is_alive() {
            body.velocity.x = 0.0;
            continue;
        }

        if combat_timers.stunned(now) {
            body.velocity.x = 0.0;
            action.request(ActionId::Hurt, 6, false, now, &catalog);
            continue;
        }

        if now < timers.heal_lock_until {
            body.velocity.x = 0.0;
            action.request(ActionId::Heal, 6, false, now, &catalog);
            continue;
        }

        // --- Каскад боевых вводов -------------------------------------
        if input.special_pressed && now >= combat_timers.special_cooldown_until {
            body.velocity.x = 0.0;
            let duration = catalog.duration_ms(ActionId::Special);
            timers.lock_movement(now + duration * tuning.heavy_recovery_scale);
            combat_timers.special_cooldown_until = now + duration + 360.0;
            action.request(ActionId::Special, 5, false, now, &catalog);
        } else if input.throw_pressed {
            let in_flight = projectiles.iter().any(|p| p.owner == entity);
            // Бросок отклоняется при пустом stock или снаряде в полёте —
            // это нормальный отказ, не ошибка
            if !in_flight && stock.try_take() {
                body.velocity.x = 0.0;
                let duration = catalog.duration_ms(ActionId::Throw);
                timers.lock_movement(now + duration * tuning.heavy_recovery_scale);
                action.request(ActionId::Throw, 5, false, now, &catalog);
                spawn_projectile(
                    &mut commands,
                    entity,
                    fighter.side,
                    Vec2::new(
                        transform.translation.x + facing.sign * 30.0,
                        transform.translation.y + 14.0,
                    ),
                    facing.sign,
                    combat.projectile_speed,
                    combat.projectile_lifetime_ms,
                    combat.projectile_damage,
                );
            }
        } else if input.heal_down {
            body.velocity.x = 0.0;
            let duration = catalog.duration_ms(ActionId::Heal);
            timers.heal_lock_until = timers.heal_lock_until.max(now + duration);
            let heal_lock = timers.heal_lock_until;
            timers.lock_movement(heal_lock);
            action.request(ActionId::Heal, 6, false, now, &catalog);
        }

        // --- Combo-атаки (attack1 → attack2 → attack3) ----------------
        if chain.queued && action.expired(now) {
            chain.queued = false;
            play_combo_attack(
                now, &catalog, &tuning, &mut chain, &mut timers, &mut combat_timers, &mut action,
            );
        }
        if input.attack_pressed {
            body.velocity.x = 0.0;
            timers.lock_movement(
                now + catalog.duration_ms(ActionId::Attack1) * tuning.attack_recovery_scale,
            );
            if action.current.is_melee_attack() && !action.expired(now) {
                // Атака ещё играет — буферизуем следующую в цепочке
                chain.queued = true;
            } else {
                if now - chain.last_attack_at_ms > tuning.combo_chain_window_ms {
                    chain.index = 0;
                }
                play_combo_attack(
                    now, &catalog, &tuning, &mut chain, &mut timers, &mut combat_timers,
                    &mut action,
                );
            }
        }

        let on_floor = body.on_floor;

        // Landing lag: переход воздух → земля глушит контроль на окно
        if on_floor && !timers.was_on_floor {
            timers.landing_lock_until = now + tuning.landing_lag_ms;
            dust.write(DustPuff {
                position: Vec2::new(transform.translation.x, transform.translation.y),
                flipped: facing.sign < 0.0,
            });
        }

        // --- Dash ------------------------------------------------------
        if input.dash_pressed && now >= timers.dash_cooldown_until {
            start_dash(now, &tuning, &mut timers, &mut body, facing.sign, !on_floor);
            // Dash держит анимацию на всю активную фазу, не на hold-окно
            if action.request(ActionId::Dash, 4, false, now, &catalog) {
                action.expires_at_ms = timers.dash_until;
            }
            if on_floor {
                dust.write(DustPuff {
                    position: Vec2::new(transform.translation.x, transform.translation.y),
                    flipped: facing.sign < 0.0,
                });
            }
        }

        if timers.dashing(now) {
            body.velocity.x = timers.dash_direction * tuning.dash_speed;
            facing.sign = timers.dash_direction;
            // Cancel-окно: первые dash_cancel_ms dash непрерываем,
            // после — любой qualifying-ввод завершает его досрочно
            if input.dash_cancel_input() && timers.dash_cancel_eligible(now, tuning.dash_cancel_ms)
            {
                timers.dash_until = now;
            } else {
                timers.was_on_floor = on_floor;
                continue;
            }
        }

        if now < timers.movement_lock_until {
            body.velocity.x = 0.0;
            timers.was_on_floor = on_floor;
            continue;
        }

        // Sprint, зажатый в момент отрыва, сохраняет run-скорость в воздухе
        if !on_floor && timers.was_on_floor {
            timers.air_sprint_carry = input.dash_down;
        } else if on_floor && !timers.was_on_floor {
            timers.air_sprint_carry = false;
        }
        timers.was_on_floor = on_floor;

        // --- Разгон / торможение --------------------------------------
        let desired_speed = if on_floor {
            if input.dash_down {
                tuning.run_speed
            } else {
                tuning.walk_speed
            }
        } else if timers.air_sprint_carry {
            tuning.run_speed
        } else {
            tuning.air_speed
        };
        let input_dir = input.direction();
        let target_vx = input_dir * desired_speed;
        // Контроль в воздухе падает с вертикальной скоростью (у апекса — максимум)
        let control = if on_floor {
            1.0
        } else {
            (1.0 - body.velocity.y.abs() / tuning.air_control_falloff)
                .clamp(tuning.air_control_floor, 1.0)
        };
        let rate = if input_dir == 0.0 {
            if on_floor { tuning.decel_ground } else { tuning.decel_air }
        } else {
            if on_floor { tuning.accel_ground } else { tuning.accel_air }
        } * control;
        let vx = move_towards(body.velocity.x, target_vx, rate * dt);
        body.velocity.x = if now >= timers.landing_lock_until { vx } else { 0.0 };

        if input_dir != 0.0 {
            facing.face_towards(input_dir);
            if on_floor {
                let id = if input.dash_down { ActionId::Run } else { ActionId::Walk };
                action.request(id, 1, true, now, &catalog);
            }
        } else if on_floor {
            action.request(ActionId::Idle, 0, true, now, &catalog);
        }

        if !on_floor {
            let id = if body.velocity.y > 0.0 { ActionId::Jump } else { ActionId::JumpFall };
            action.request(id, 2, true, now, &catalog);
        } else {
            timers.jumps_remaining = tuning.max_jumps;
            timers.coyote_until = now + tuning.coyote_ms;
        }

        // --- Wall slide ------------------------------------------------
        if !on_floor && body.touching_wall() {
            timers.wall_grace_until = now + tuning.wall_grace_ms;
            body.velocity.y = body.velocity.y.max(-tuning.wall_slide_speed);
            facing.sign = if body.touching_wall_right { -1.0 } else { 1.0 };
            action.request(ActionId::WallSlide, 2, true, now, &catalog);
        }

        // --- Jump buffer / jump cut -----------------------------------
        if input.jump_pressed {
            timers.jump_buffer_until = now + tuning.jump_buffer_ms;
        }
        if !input.jump_down && timers.prev_jump_down && body.velocity.y > tuning.jump_cut_velocity
        {
            // Отпустили прыжок на подъёме — срезаем высоту
            body.velocity.y = tuning.jump_cut_velocity;
        }
        timers.prev_jump_down = input.jump_down;

        if timers.jump_buffer_until >= now {
            let can_coyote = now <= timers.coyote_until;
            let can_wall = now <= timers.wall_grace_until;

            if !on_floor && can_wall && body.touching_wall() {
                // Wall jump: импульс от стены + вертикальный прыжок
                let push = if body.touching_wall_left {
                    tuning.wall_jump_push
                } else {
                    -tuning.wall_jump_push
                };
                body.velocity.x = push;
                body.velocity.y = tuning.jump_velocity;
                facing.sign = push.signum();
                action.request(ActionId::WallJump, 4, false, now, &catalog);
                timers.jumps_remaining = 1;
                timers.jump_buffer_until = 0.0;
            } else if on_floor || can_coyote || timers.jumps_remaining > 0 {
                let id = if on_floor { ActionId::JumpStart } else { ActionId::Jump };
                action.request(id, 3, false, now, &catalog);
                body.velocity.y = tuning.jump_velocity;
                // Coyote-прыжок списывает один прыжок, как и земной —
                // двойного списания нет
                timers.jumps_remaining = timers.jumps_remaining.saturating_sub(1);
                timers.jump_buffer_until = 0.0;
            }
        }
    }
}

fn play_combo_attack(
    now: f64,
    catalog: &MoveCatalog,
    tuning: &MovementTuning,
    chain: &mut ComboChain,
    timers: &mut MovementTimers,
    combat_timers: &mut CombatTimers,
    action: &mut ActionState,
) {
    let id = chain.next_attack();
    chain.last_attack_at_ms = now;
    chain.queued = false;
    let duration = catalog.duration_ms(id);
    timers.lock_movement(now + duration * tuning.attack_recovery_scale);
    if action.request(id, 4, false, now, catalog) {
        // Committal: промах к концу анимации будет наказан self-stun
        combat_timers.arm_whiff(now + duration);
    }
}

/// Запуск dash: фиксированная скорость, lock обычного контроля, cooldown
pub fn start_dash(
    now: f64,
    tuning: &MovementTuning,
    timers: &mut MovementTimers,
    body: &mut Body,
    direction: f32,
    in_air: bool,
) {
    timers.dash_until = now + tuning.dash_duration_ms;
    timers.dash_cooldown_until = now + tuning.dash_cooldown_ms;
    timers.dash_started_at = now;
    timers.dash_direction = direction;
    body.velocity.x = direction * tuning.dash_speed;
    if in_air {
        body.velocity.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_headless_app, spawn_fighter, step};

    #[test]
    fn test_air_dash_zeroes_vertical() {
        let tuning = MovementTuning::default();
        let mut timers = MovementTimers::default();
        let mut body = Body {
            velocity: Vec2::new(0.0, -300.0),
            ..Default::default()
        };

        start_dash(0.0, &tuning, &mut timers, &mut body, -1.0, true);
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.velocity.x, -tuning.dash_speed);
    }

    #[test]
    fn test_buffered_jump_fires_on_landing() {
        let mut app = create_headless_app(3);
        let yin = spawn_fighter(app.world_mut(), Side::Yin, false);

        // Боец падает с небольшой высоты без воздушных прыжков и coyote:
        // сработать может только буфер в момент касания пола
        {
            let world = app.world_mut();
            world.get_mut::<Transform>(yin).unwrap().translation.y += 8.0;
            let mut body = world.get_mut::<Body>(yin).unwrap();
            body.on_floor = false;
            let mut timers = world.get_mut::<MovementTimers>(yin).unwrap();
            timers.jumps_remaining = 0;
            timers.coyote_until = 0.0;
            timers.was_on_floor = false;
        }
        step(&mut app);

        // Прыжок нажат в падении, до касания пола
        {
            let mut input = app.world_mut().get_mut::<InputSnapshot>(yin).unwrap();
            input.jump_pressed = true;
            input.jump_down = true;
        }
        step(&mut app);
        app.world_mut().get_mut::<InputSnapshot>(yin).unwrap().jump_pressed = false;

        // В воздухе буфер не срабатывает
        assert!(app.world().get::<Body>(yin).unwrap().velocity.y <= 0.0);

        let mut jumped = false;
        for _ in 0..30 {
            step(&mut app);
            if app.world().get::<Body>(yin).unwrap().velocity.y > 0.0 {
                jumped = true;
                break;
            }
        }
        assert!(jumped, "buffered jump must fire on landing");
    }

    #[test]
    fn test_dash_cancel_blocked_inside_window() {
        let mut app = create_headless_app(3);
        let yin = spawn_fighter(app.world_mut(), Side::Yin, false);
        step(&mut app);

        {
            let mut input = app.world_mut().get_mut::<InputSnapshot>(yin).unwrap();
            input.dash_pressed = true;
            input.dash_down = true;
        }
        step(&mut app);
        {
            let mut input = app.world_mut().get_mut::<InputSnapshot>(yin).unwrap();
            input.dash_pressed = false;
            input.dash_down = false;
            // Qualifying-ввод сразу после старта dash'а
            input.attack_pressed = true;
        }
        step(&mut app);

        // Внутри cancel-окна атака dash не прерывает
        let dash_speed = app.world().resource::<MovementTuning>().dash_speed;
        let body = app.world().get::<Body>(yin).unwrap();
        assert_eq!(body.velocity.x, dash_speed, "dash must not cancel inside the window");

        // После истечения окна тот же ввод завершает dash досрочно
        for _ in 0..4 {
            step(&mut app);
        }
        let now = app.world().resource::<crate::clock::FrameClock>().now();
        let timers = app.world().get::<MovementTimers>(yin).unwrap();
        assert!(!timers.dashing(now), "dash must cancel after the window");
    }

    #[test]
    fn test_air_control_scaling() {
        let tuning = MovementTuning::default();
        // У апекса (vy ≈ 0) контроль полный
        let apex = (1.0f32 - 0.0 / tuning.air_control_falloff)
            .clamp(tuning.air_control_floor, 1.0);
        assert_eq!(apex, 1.0);
        // На большой скорости падения — упирается в пол
        let steep = (1.0f32 - 2000.0 / tuning.air_control_falloff)
            .clamp(tuning.air_control_floor, 1.0);
        assert_eq!(steep, tuning.air_control_floor);
    }
}
