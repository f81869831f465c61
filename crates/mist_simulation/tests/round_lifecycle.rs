//! Жизненный цикл раунда: смерть → intermission → перезапуск.

use bevy::prelude::*;
use mist_simulation::{
    create_headless_app, spawn_fighter, step, ActionId, ActionState, AiController, Arena, Body,
    Fighter, Health, RoundState, Side, FIXED_STEP_MS,
};

const INTERMISSION_TICKS: usize = (10_000.0 / FIXED_STEP_MS) as usize;

fn kill(app: &mut App, entity: Entity) {
    let mut health = app.world_mut().get_mut::<Health>(entity).unwrap();
    let max = health.max;
    health.take_damage(max);
}

#[test]
fn test_death_ends_round() {
    let mut app = create_headless_app(5);
    let yin = spawn_fighter(app.world_mut(), Side::Yin, true);
    let yang = spawn_fighter(app.world_mut(), Side::Yang, true);

    kill(&mut app, yin);
    step(&mut app);

    let state = app.world().resource::<RoundState>();
    assert!(!state.round_active());
    assert_eq!(state.wins, [0, 1], "yang must take the round");

    // Труп играет death, победитель жив
    let action = app.world().get::<ActionState>(yin).unwrap();
    assert_eq!(action.current, ActionId::Death);
    assert!(app.world().get::<Health>(yang).unwrap().is_alive());
}

#[test]
fn test_intermission_freezes_world() {
    let mut app = create_headless_app(5);
    let yin = spawn_fighter(app.world_mut(), Side::Yin, true);
    spawn_fighter(app.world_mut(), Side::Yang, true);

    kill(&mut app, yin);
    step(&mut app);

    // Десяток кадров intermission: никто не двигается
    for _ in 0..10 {
        step(&mut app);

        let world = app.world_mut();
        let mut query = world.query::<(&Fighter, &Body)>();
        for (fighter, body) in query.iter(world) {
            assert_eq!(
                body.velocity,
                Vec2::ZERO,
                "{} moved during intermission",
                fighter.side.label()
            );
        }
    }

    let state = app.world().resource::<RoundState>();
    assert_eq!(state.round_number, 1, "round must not restart mid-intermission");
}

#[test]
fn test_round_restarts_after_intermission() {
    let mut app = create_headless_app(5);
    let yin = spawn_fighter(app.world_mut(), Side::Yin, true);
    let yang = spawn_fighter(app.world_mut(), Side::Yang, true);

    // Подкидываем статистику: она обязана пережить перезапуск
    app.world_mut()
        .get_mut::<AiController>(yang)
        .unwrap()
        .stats
        .record_use(ActionId::Attack1);

    kill(&mut app, yin);
    step(&mut app);
    assert!(!app.world().resource::<RoundState>().round_active());

    // Шагаем до кадра перезапуска: позиции проверяются до того,
    // как AI снова начнёт доруливать дистанцию
    for _ in 0..(INTERMISSION_TICKS + 5) {
        step(&mut app);
        if app.world().resource::<RoundState>().round_active() {
            break;
        }
    }

    let state = app.world().resource::<RoundState>();
    assert!(state.round_active());
    assert_eq!(state.round_number, 2);
    assert_eq!(state.wins, [0, 1], "score survives the restart");

    let arena = app.world().resource::<Arena>().clone();
    for (entity, side) in [(yin, Side::Yin), (yang, Side::Yang)] {
        let health = app.world().get::<Health>(entity).unwrap();
        assert_eq!(health.current, health.max, "{} hp restored", side.label());

        let x = app.world().get::<Transform>(entity).unwrap().translation.x;
        assert_eq!(x, arena.spawn_x(side), "{} back at spawn", side.label());
    }

    // Адаптация копится на весь матч, не на раунд
    let stats = &app.world().get::<AiController>(yang).unwrap().stats;
    assert_eq!(stats.stats(ActionId::Attack1).uses, 1);
}

#[test]
fn test_killing_blow_is_recorded_in_stats() {
    let mut app = create_headless_app(21);
    let yin = spawn_fighter(app.world_mut(), Side::Yin, true);
    let yang = spawn_fighter(app.world_mut(), Side::Yang, true);

    // Инь на волоске: первый же пропущенный удар завершает раунд
    {
        let mut health = app.world_mut().get_mut::<Health>(yin).unwrap();
        let near_death = health.max - 1;
        health.take_damage(near_death);
    }

    let mut ended = false;
    for _ in 0..3600 {
        step(&mut app);
        if !app.world().resource::<RoundState>().round_active() {
            ended = true;
            break;
        }
    }
    assert!(ended, "duel never ended with yin at 1 hp");
    assert_eq!(app.world().resource::<RoundState>().wins, [0, 1]);

    // Добивающий удар обязан попасть в статистику победителя,
    // хотя раунд закончился в том же кадре
    let stats = &app.world().get::<AiController>(yang).unwrap().stats;
    let hits: u32 = stats.iter().map(|(_, s)| s.hits).sum();
    assert!(hits >= 1, "the round-ending hit was never booked");
}
