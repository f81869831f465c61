//! MIST Simulation Core
//!
//! Headless ECS-симуляция дуэли двух ниндзя на Bevy 0.16.
//! Детерминированный fixed timestep 60Hz: одинаковый seed — одинаковый бой.
//!
//! Слои не смешиваются:
//! - симуляция ничего не рисует и не читает ввод напрямую
//!   (InputSnapshot пишет host, HudSnapshot читает host);
//! - единственный источник времени — FrameClock.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod ai;
pub mod catalog;
pub mod clock;
pub mod combat;
pub mod components;
pub mod hud;
pub mod logger;
pub mod movement;
pub mod round;

pub use ai::{
    AiController, AiPlugin, AiProfile, Callout, MoveChosen, MoveStatistics, SpacingPhase,
};
pub use catalog::{ActionId, MoveCatalog, MoveEntry};
pub use clock::{advance_clock, FrameClock, FIXED_STEP_MS, MAX_FRAME_DELTA_MS};
pub use combat::{CombatPlugin, CombatTuning, HitConfirmed, HitFeedback, HitSource};
pub use components::*;
pub use hud::{HudPlugin, HudSnapshot};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_sink,
    set_sink_if_needed, LogLevel, LogSink,
};
pub use movement::{DustPuff, MovementPlugin, MovementTuning};
pub use round::{round_active, FighterDied, RoundPlugin, RoundState};

/// Порядок подсистем внутри кадра.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Продвижение FrameClock (всегда первым)
    Clock,
    /// AI-решения
    Decide,
    /// Контроллеры движения (input и AI steering уже отработал в Decide)
    Control,
    /// Интеграция кинематики
    Physics,
    /// Combat resolver
    Resolve,
    /// Жизненный цикл раундов
    Round,
    /// HUD-снапшот (по итогам кадра)
    Output,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG (seed по умолчанию; host перевставляет свой)
            .insert_resource(DeterministicRng::new(42))
            .init_resource::<FrameClock>()
            .init_resource::<MoveCatalog>()
            .init_resource::<Arena>()
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Clock,
                    SimSet::Decide,
                    SimSet::Control,
                    SimSet::Physics,
                    SimSet::Resolve,
                    SimSet::Round,
                    SimSet::Output,
                )
                    .chain(),
            )
            // Боевые подсистемы стоят во время intermission;
            // Clock/Round/Output работают всегда
            .configure_sets(
                FixedUpdate,
                (SimSet::Decide, SimSet::Control, SimSet::Physics, SimSet::Resolve)
                    .run_if(round_active),
            )
            .add_systems(FixedUpdate, advance_clock.in_set(SimSet::Clock))
            .add_plugins((AiPlugin, MovementPlugin, CombatPlugin, RoundPlugin, HudPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin)
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Один детерминированный тик симуляции.
///
/// FixedUpdate гоняется напрямую, мимо wall-clock аккумулятора —
/// N вызовов дают ровно N тиков независимо от скорости хоста.
/// Штатная очистка событий (schedule First) при этом не выполняется,
/// поэтому буферы двигаются вручную — иначе они растут без предела.
pub fn step(app: &mut App) {
    let world = app.world_mut();
    world.run_schedule(FixedUpdate);

    world.resource_mut::<Events<HitConfirmed>>().update();
    world.resource_mut::<Events<MoveChosen>>().update();
    world.resource_mut::<Events<Callout>>().update();
    world.resource_mut::<Events<DustPuff>>().update();
    world.resource_mut::<Events<FighterDied>>().update();
}

/// Спавнит бойца на стартовой позиции его стороны.
/// Остальные компоненты добавляются через Required Components.
pub fn spawn_fighter(world: &mut World, side: Side, ai_controlled: bool) -> Entity {
    let arena = world.resource::<Arena>().clone();
    let x = arena.spawn_x(side);
    let facing = if x < arena.center_x { 1.0 } else { -1.0 };

    let mut entity = world.spawn((
        Fighter { side },
        Transform::from_xyz(x, arena.floor_y, 0.0),
        Facing { sign: facing },
    ));
    if ai_controlled {
        entity.insert(AiController::new(AiProfile::for_side(side)));
    }
    let id = entity.id();

    log_info(&format!("spawned {} at x={x:.0} (ai={ai_controlled})", side.label()));
    id
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
