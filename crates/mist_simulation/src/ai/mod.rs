//! Адаптивный AI-дуэлянт.
//!
//! Каждый AI-боец держит собственный AiController: фаза spacing'а
//! с гистерезисом, статистика движений (точность), cooldown'ы.
//! Решения принимаются с фиксированным интервалом профиля, между
//! решениями контроллер только доруливает дистанцию.

use std::collections::BTreeMap;

use bevy::prelude::*;

pub mod decision;
pub mod stats;

pub use stats::{choose_move, MoveStats, MoveStatistics};

use crate::catalog::ActionId;
use crate::components::Side;

/// Фаза spacing'а. Переключение — с гистерезисом по дистанции
/// и минимальным временем удержания, иначе AI дёргается на границе.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpacingPhase {
    /// Разрыв дистанции после размена
    Reset,
    #[default]
    Neutral,
    /// Сближение для атаки
    Engage,
}

impl SpacingPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SpacingPhase::Reset => "RESET",
            SpacingPhase::Neutral => "NEUTRAL",
            SpacingPhase::Engage => "ENGAGE",
        }
    }
}

/// Статичный профиль AI-бойца: темп решений, дистанции, набор ударов.
#[derive(Debug, Clone)]
pub struct AiProfile {
    pub decision_interval_ms: f64,
    /// Дистанция melee-атаки
    pub melee_range: f32,
    /// Дистанция броска снаряда
    pub throw_range: f32,
    /// Дальше этого — фаза Engage рвётся вперёд
    pub engage_range: f32,
    /// Desperation-добивание: сильнейший приём при собственном hp ниже порога
    pub finisher_move: ActionId,
    pub finisher_range: f32,
    pub finisher_hp_threshold: u32,
    /// Рывок сближения: Dash (телепорт-скорость) или DashAttack-раш
    pub engage_with_dash: bool,
    pub rush_speed: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime_ms: f64,
    /// Кандидаты melee-атак с базовыми весами
    pub candidates: Vec<(ActionId, f32)>,
}

impl AiProfile {
    /// Инь: быстрый агрессор. Частые решения, dash-сближение,
    /// быстрый снаряд, Special как добивание.
    pub fn yin() -> Self {
        Self {
            decision_interval_ms: 200.0,
            melee_range: 80.0,
            throw_range: 300.0,
            engage_range: 520.0,
            finisher_move: ActionId::Special,
            finisher_range: 100.0,
            finisher_hp_threshold: 280,
            engage_with_dash: true,
            rush_speed: 320.0,
            projectile_speed: 520.0,
            projectile_lifetime_ms: 1000.0,
            candidates: vec![
                (ActionId::Attack1, 1.0),
                (ActionId::Attack2, 0.9),
                (ActionId::Attack3, 0.7),
                (ActionId::Special, 0.6),
            ],
        }
    }

    /// Ян: медленный тяжеловес. Редкие решения, DashAttack-раш,
    /// медленный живучий снаряд.
    pub fn yang() -> Self {
        Self {
            decision_interval_ms: 360.0,
            melee_range: 80.0,
            throw_range: 300.0,
            engage_range: 520.0,
            finisher_move: ActionId::DashAttack,
            finisher_range: 100.0,
            finisher_hp_threshold: 280,
            engage_with_dash: false,
            rush_speed: 320.0,
            projectile_speed: 320.0,
            projectile_lifetime_ms: 1200.0,
            candidates: vec![
                (ActionId::Attack1, 1.0),
                (ActionId::Attack2, 0.8),
                (ActionId::DashAttack, 0.5),
                (ActionId::Special, 0.3),
            ],
        }
    }

    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Yin => Self::yin(),
            Side::Yang => Self::yang(),
        }
    }
}

/// Состояние AI-контроллера одного бойца.
#[derive(Component, Debug, Clone)]
pub struct AiController {
    pub profile: AiProfile,
    pub phase: SpacingPhase,
    /// Минимальное удержание текущей фазы
    pub phase_until_ms: f64,
    pub next_decision_at_ms: f64,
    /// Коммит в текущее действие: до этого момента новые решения не принимаются
    pub action_until_ms: f64,
    pub last_move: Option<ActionId>,
    pub repeat_count: u32,
    pub stats: MoveStatistics,
    pub dash_cooldown_until_ms: f64,
    pub throw_cooldown_until_ms: f64,
    pub finisher_cooldown_until_ms: f64,
    /// Per-move готовность: движение недоступно до move_ready_at
    pub move_ready_at_ms: BTreeMap<ActionId, f64>,
    /// Текущая скорость доруливания (рампится к цели)
    pub approach_speed: f32,
}

impl AiController {
    pub fn new(profile: AiProfile) -> Self {
        Self {
            profile,
            phase: SpacingPhase::Neutral,
            phase_until_ms: 0.0,
            next_decision_at_ms: 0.0,
            action_until_ms: 0.0,
            last_move: None,
            repeat_count: 0,
            stats: MoveStatistics::default(),
            dash_cooldown_until_ms: 0.0,
            throw_cooldown_until_ms: 0.0,
            finisher_cooldown_until_ms: 0.0,
            move_ready_at_ms: BTreeMap::new(),
            approach_speed: 0.0,
        }
    }

    pub fn move_ready(&self, id: ActionId, now_ms: f64) -> bool {
        self.move_ready_at_ms.get(&id).map_or(true, |&t| now_ms >= t)
    }

    /// Фиксирует выбор движения: статистика use, repeat-счётчик,
    /// per-move cooldown.
    pub fn note_move(&mut self, id: ActionId, ready_again_at_ms: f64) {
        self.stats.record_use(id);
        if self.last_move == Some(id) {
            self.repeat_count += 1;
        } else {
            self.repeat_count = 1;
        }
        self.last_move = Some(id);
        self.move_ready_at_ms.insert(id, ready_again_at_ms);
    }

    /// Сброс боевого состояния между раундами. Статистика движений
    /// переживает раунды: адаптация — на весь матч.
    pub fn reset_for_round(&mut self) {
        self.phase = SpacingPhase::Neutral;
        self.phase_until_ms = 0.0;
        self.next_decision_at_ms = 0.0;
        self.action_until_ms = 0.0;
        self.last_move = None;
        self.repeat_count = 0;
        self.dash_cooldown_until_ms = 0.0;
        self.throw_cooldown_until_ms = 0.0;
        self.finisher_cooldown_until_ms = 0.0;
        self.move_ready_at_ms.clear();
        self.approach_speed = 0.0;
    }
}

/// Событие: AI выбрал движение (для HUD-тикера и статистики).
#[derive(Event, Debug, Clone)]
pub struct MoveChosen {
    pub side: Side,
    pub move_id: ActionId,
}

/// Событие: текстовый callout для HUD ("YIN ADAPTS" и т.п.).
#[derive(Event, Debug, Clone)]
pub struct Callout {
    pub side: Side,
    pub text: String,
}

pub struct AiPlugin;

impl Plugin for AiPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MoveChosen>()
            .add_event::<Callout>()
            .add_systems(FixedUpdate, decision::ai_decide.in_set(crate::SimSet::Decide))
            // Бухгалтерия попаданий не гейтится раундом: добивающий удар
            // подтверждается в том же кадре, в котором раунд заканчивается
            .add_systems(
                FixedUpdate,
                decision::ai_record_hits
                    .after(crate::SimSet::Resolve)
                    .before(crate::SimSet::Round),
            );
    }
}
