//! HUD-снапшот: сериализуемая сводка кадра для host-слоя.
//!
//! Симуляция ничего не рисует; host (терминал, веб-клиент) читает
//! HudSnapshot после каждого тика и рендерит сам.

use bevy::prelude::*;
use serde::Serialize;

use crate::ai::{AiController, Callout, MoveChosen};
use crate::clock::FrameClock;
use crate::combat::HitFeedback;
use crate::components::{ComboState, Fighter, Health};
use crate::round::RoundState;

/// Время жизни callout-строки на экране
const CALLOUT_MS: f64 = 900.0;
/// Глубина тикера последних движений
const TICKER_LEN: usize = 8;

#[derive(Debug, Clone, Default, Serialize)]
pub struct FighterPanel {
    pub health: u32,
    pub max_health: u32,
    pub combo: u32,
    /// (движение, uses, hits) в фиксированном порядке
    pub move_table: Vec<(String, u32, u32)>,
    /// Самое точное движение: "ATTACK2 80%"
    pub best_move: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerEntry {
    pub side: String,
    pub move_id: String,
}

/// Снимок состояния боя на конец кадра.
#[derive(Resource, Debug, Clone, Default, Serialize)]
pub struct HudSnapshot {
    pub round_number: u32,
    pub wins: [u32; 2],
    pub intermission: bool,
    pub shaking: bool,
    /// Тяжёлый последний удар: host трясёт камеру сильнее
    pub last_hit_heavy: bool,
    pub panels: [FighterPanel; 2],
    pub ticker: Vec<TickerEntry>,
    /// Транзитный callout; очищается по истечении
    pub callout: Option<String>,
    #[serde(skip)]
    callout_until_ms: f64,
}

pub fn update_hud(
    clock: Res<FrameClock>,
    round: Res<RoundState>,
    feedback: Res<HitFeedback>,
    mut snapshot: ResMut<HudSnapshot>,
    mut chosen: EventReader<MoveChosen>,
    mut callouts: EventReader<Callout>,
    fighters: Query<(&Fighter, &Health, &ComboState, Option<&AiController>)>,
) {
    let now = clock.now();

    snapshot.round_number = round.round_number;
    snapshot.wins = round.wins;
    snapshot.intermission = !round.round_active();
    snapshot.shaking = feedback.shaking(now);
    snapshot.last_hit_heavy = feedback.last_hit_heavy;

    for (fighter, health, combo, ai) in fighters.iter() {
        let panel = &mut snapshot.panels[fighter.side.index()];
        panel.health = health.current;
        panel.max_health = health.max;
        panel.combo = combo.count;

        if let Some(ai) = ai {
            panel.move_table = ai
                .stats
                .iter()
                .map(|(id, s)| (format!("{id:?}"), s.uses, s.hits))
                .collect();
            panel.best_move = ai.stats.best_move().map(|(id, s)| {
                format!("{:?} {}%", id, (s.accuracy() * 100.0).round() as u32)
            });
        }
    }

    for event in chosen.read() {
        snapshot.ticker.push(TickerEntry {
            side: event.side.label().to_string(),
            move_id: format!("{:?}", event.move_id),
        });
        if snapshot.ticker.len() > TICKER_LEN {
            snapshot.ticker.remove(0);
        }
        // Выбранное движение — тоже callout; явные Callout-события ниже
        // перекрывают его в этом же кадре
        snapshot.callout = Some(format!("{}: {}", event.side.label(), event.move_id.label()));
        snapshot.callout_until_ms = now + CALLOUT_MS;
    }

    for callout in callouts.read() {
        snapshot.callout = Some(callout.text.clone());
        snapshot.callout_until_ms = now + CALLOUT_MS;
    }
    if snapshot.callout.is_some() && now >= snapshot.callout_until_ms {
        snapshot.callout = None;
    }
}

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudSnapshot>()
            .add_systems(FixedUpdate, update_hud.in_set(crate::SimSet::Output));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionId;
    use crate::components::Side;

    #[test]
    fn test_ticker_bounded() {
        let mut snapshot = HudSnapshot::default();
        for i in 0..20 {
            snapshot.ticker.push(TickerEntry {
                side: "YIN".to_string(),
                move_id: format!("{:?}", ActionId::Attack1),
            });
            if snapshot.ticker.len() > TICKER_LEN {
                snapshot.ticker.remove(0);
            }
            let _ = i;
        }
        assert_eq!(snapshot.ticker.len(), TICKER_LEN);
    }

    #[test]
    fn test_callout_expiry_logic() {
        let mut snapshot = HudSnapshot::default();
        snapshot.callout = Some("YIN ADAPTS".to_string());
        snapshot.callout_until_ms = 1000.0;

        let now = 999.0;
        assert!(now < snapshot.callout_until_ms);

        let now = 1000.0;
        if snapshot.callout.is_some() && now >= snapshot.callout_until_ms {
            snapshot.callout = None;
        }
        assert!(snapshot.callout.is_none());
    }

    #[test]
    fn test_hud_surfaces_heavy_hit_feedback() {
        let mut app = crate::create_headless_app(2);
        crate::step(&mut app);

        {
            let mut feedback = app.world_mut().resource_mut::<HitFeedback>();
            feedback.shake_until_ms = 1_000_000.0;
            feedback.last_hit_heavy = true;
        }
        crate::step(&mut app);

        let hud = app.world().resource::<HudSnapshot>();
        assert!(hud.shaking);
        assert!(hud.last_hit_heavy);
    }

    #[test]
    fn test_panel_indexing_by_side() {
        let snapshot = HudSnapshot::default();
        assert_eq!(snapshot.panels.len(), 2);
        assert_eq!(Side::Yin.index(), 0);
        assert_eq!(Side::Yang.index(), 1);
    }
}
