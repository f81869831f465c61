//! Жизненный цикл раундов: смерть, intermission, перезапуск.

use bevy::prelude::*;

use crate::ai::{AiController, Callout};
use crate::catalog::{ActionId, MoveCatalog};
use crate::clock::FrameClock;
use crate::components::{
    ActionState, Arena, Body, ComboChain, ComboState, CombatTimers, Facing, Fighter, Health,
    MovementTimers, Projectile, ProjectileStock, Side,
};

/// Пауза между смертью и следующим раундом
pub const INTERMISSION_MS: f64 = 10_000.0;

/// Состояние матча. round_over_until_ms == 0 — раунд идёт.
#[derive(Resource, Debug, Clone)]
pub struct RoundState {
    pub round_number: u32,
    pub round_over_until_ms: f64,
    /// Счёт побед per Side
    pub wins: [u32; 2],
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            round_number: 1,
            round_over_until_ms: 0.0,
            wins: [0, 0],
        }
    }
}

impl RoundState {
    pub fn round_active(&self) -> bool {
        self.round_over_until_ms == 0.0
    }
}

/// Событие: боец погиб, раунд окончен.
#[derive(Event, Debug, Clone)]
pub struct FighterDied {
    pub side: Side,
    pub round: u32,
}

/// Run condition: боевые системы работают только в активном раунде.
pub fn round_active(state: Res<RoundState>) -> bool {
    state.round_active()
}

/// Смерть: первый боец с hp == 0 завершает раунд.
pub fn detect_deaths(
    clock: Res<FrameClock>,
    catalog: Res<MoveCatalog>,
    mut state: ResMut<RoundState>,
    mut died: EventWriter<FighterDied>,
    mut callouts: EventWriter<Callout>,
    mut fighters: Query<
        (&Fighter, &Health, &mut Body, &mut ActionState, &mut MovementTimers),
        With<Fighter>,
    >,
) {
    if !state.round_active() {
        return;
    }
    let now = clock.now();

    let mut dead_side: Option<Side> = None;
    for (fighter, health, mut body, mut action, mut mt) in fighters.iter_mut() {
        if health.is_alive() {
            continue;
        }
        body.velocity.x = 0.0;
        action.request(ActionId::Death, 7, false, now, &catalog);
        // Труп не двигается до конца intermission
        mt.lock_movement(now + INTERMISSION_MS);
        dead_side = Some(fighter.side);
    }

    let Some(loser) = dead_side else {
        return;
    };

    let winner = loser.opponent();
    state.wins[winner.index()] += 1;
    state.round_over_until_ms = now + INTERMISSION_MS;

    crate::log(&format!(
        "{} wins round {} ({}:{})",
        winner.label(),
        state.round_number,
        state.wins[0],
        state.wins[1]
    ));

    died.write(FighterDied { side: loser, round: state.round_number });
    callouts.write(Callout {
        side: winner,
        text: format!("{} WINS ROUND {}", winner.label(), state.round_number),
    });
}

/// Intermission: мир стоит, живой победитель — в idle, труп — в death.
pub fn freeze_intermission(
    clock: Res<FrameClock>,
    catalog: Res<MoveCatalog>,
    state: Res<RoundState>,
    mut fighters: Query<(&Health, &mut Body, &mut ActionState), With<Fighter>>,
) {
    if state.round_active() {
        return;
    }
    let now = clock.now();

    for (health, mut body, mut action) in fighters.iter_mut() {
        body.velocity = Vec2::ZERO;
        if health.is_alive() {
            action.request(ActionId::Idle, 1, true, now, &catalog);
        }
    }
}

/// Перезапуск раунда по истечении intermission.
///
/// Боевое состояние сбрасывается полностью; статистика движений AI
/// переживает раунды — адаптация копится весь матч.
pub fn reset_round(
    mut commands: Commands,
    clock: Res<FrameClock>,
    arena: Res<Arena>,
    mut state: ResMut<RoundState>,
    projectiles: Query<Entity, With<Projectile>>,
    mut fighters: Query<
        (
            &Fighter,
            &mut Transform,
            &mut Health,
            &mut Body,
            &mut Facing,
            &mut ActionState,
            &mut MovementTimers,
            &mut CombatTimers,
            &mut ComboState,
            &mut ComboChain,
            &mut ProjectileStock,
            Option<&mut AiController>,
        ),
        With<Fighter>,
    >,
) {
    let now = clock.now();
    if state.round_active() || now < state.round_over_until_ms {
        return;
    }

    state.round_number += 1;
    state.round_over_until_ms = 0.0;

    for entity in projectiles.iter() {
        commands.entity(entity).despawn();
    }

    for (
        fighter,
        mut transform,
        mut health,
        mut body,
        mut facing,
        mut action,
        mut mt,
        mut ct,
        mut combo,
        mut chain,
        mut stock,
        ai,
    ) in fighters.iter_mut()
    {
        health.reset();
        stock.refill();
        combo.reset();
        chain.reset();
        mt.reset();
        ct.reset();
        action.reset();

        transform.translation.x = arena.spawn_x(fighter.side);
        transform.translation.y = arena.floor_y;
        body.velocity = Vec2::ZERO;
        body.on_floor = true;
        facing.face_towards(arena.center_x - transform.translation.x);

        if let Some(mut ai) = ai {
            ai.reset_for_round();
        }
    }

    crate::log(&format!("round {} begins", state.round_number));
}

pub struct RoundPlugin;

impl Plugin for RoundPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoundState>()
            .add_event::<FighterDied>()
            .add_systems(
                FixedUpdate,
                (detect_deaths, freeze_intermission, reset_round)
                    .chain()
                    .in_set(crate::SimSet::Round),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_state_defaults_active() {
        let state = RoundState::default();
        assert_eq!(state.round_number, 1);
        assert!(state.round_active());
    }

    #[test]
    fn test_round_over_marks_inactive() {
        let mut state = RoundState::default();
        state.round_over_until_ms = 5000.0;
        assert!(!state.round_active());
    }

    #[test]
    fn test_wins_indexing() {
        let mut state = RoundState::default();
        state.wins[Side::Yang.index()] += 1;
        assert_eq!(state.wins, [0, 1]);
    }
}
