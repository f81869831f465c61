//! ActionState — приоритетный арбитраж действий бойца.
//!
//! Единственная точка сериализации: все подсистемы (movement, combat, AI)
//! запрашивают действие через request(), и только она решает, кто владеет
//! текущей анимацией в этом кадре. Физики здесь нет.

use bevy::prelude::*;

use crate::catalog::{ActionId, MoveCatalog};

/// Минимальное окно удержания принятого действия (мс)
pub const MIN_HOLD_MS: f64 = 40.0;

/// Доля длительности анимации, защищённая от перезаписи равным приоритетом
pub const HOLD_FRACTION: f64 = 0.22;

/// Текущее действие бойца + его приоритет и срок защиты.
///
/// Правило: запрос принимается iff priority >= текущего ИЛИ окно истекло
/// (now >= expires_at). По истечении окна приоритет концептуально падает
/// до нуля — следующий запрос любого приоритета берёт верх. Movement
/// controller обязан каждый кадр перезапрашивать idle/run, чтобы
/// отображаемое действие не отставало от физики.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ActionState {
    pub current: ActionId,
    pub priority: u8,
    pub expires_at_ms: f64,
    pub looping: bool,
}

impl Default for ActionState {
    fn default() -> Self {
        Self {
            current: ActionId::Idle,
            priority: 0,
            expires_at_ms: 0.0,
            looping: true,
        }
    }
}

impl ActionState {
    /// Арбитраж запроса. true = принято (действие перезаписано).
    ///
    /// При отказе caller не должен трогать состояние бойца в этом кадре:
    /// текущее действие продолжает выполняться.
    pub fn request(
        &mut self,
        id: ActionId,
        priority: u8,
        allow_loop_blend: bool,
        now_ms: f64,
        catalog: &MoveCatalog,
    ) -> bool {
        let can_override = priority >= self.priority || now_ms >= self.expires_at_ms;
        if !can_override {
            return false;
        }

        let entry = catalog.entry(id);
        let hold_ms = if entry.looping && allow_loop_blend {
            // Blended loop: перебивается чем угодно уже в следующем кадре
            0.0
        } else {
            (entry.duration_ms() * HOLD_FRACTION).max(MIN_HOLD_MS)
        };

        self.current = id;
        self.priority = priority;
        self.expires_at_ms = now_ms + hold_ms;
        self.looping = entry.looping;
        true
    }

    pub fn is(&self, id: ActionId) -> bool {
        self.current == id
    }

    pub fn expired(&self, now_ms: f64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Сброс на idle (reset раунда)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MoveCatalog {
        MoveCatalog::default()
    }

    #[test]
    fn test_higher_priority_overrides_live_action() {
        let catalog = catalog();
        let mut state = ActionState::default();

        assert!(state.request(ActionId::Attack1, 4, false, 0.0, &catalog));
        // p2 >= p1 при живом окне — принимается (для всех пар p1 <= p2)
        for p2 in 4..=7 {
            let mut s = state.clone();
            assert!(s.request(ActionId::Hurt, p2, false, 1.0, &catalog), "p2 = {p2}");
        }
    }

    #[test]
    fn test_lower_priority_rejected_while_unexpired() {
        let catalog = catalog();
        let mut state = ActionState::default();
        assert!(state.request(ActionId::Special, 5, false, 0.0, &catalog));

        // p1 < p2 при неистёкшем окне — отказ, действие не меняется
        assert!(!state.request(ActionId::Run, 1, true, 1.0, &catalog));
        assert!(state.is(ActionId::Special));
        assert_eq!(state.priority, 5);
    }

    #[test]
    fn test_expiry_resets_priority_conceptually() {
        let catalog = catalog();
        let mut state = ActionState::default();
        assert!(state.request(ActionId::Special, 5, false, 0.0, &catalog));
        let after = state.expires_at_ms + 1.0;

        // Окно истекло: запрос любого приоритета берёт верх,
        // но до него current остаётся прежним
        assert!(state.is(ActionId::Special));
        assert!(state.request(ActionId::Idle, 0, true, after, &catalog));
        assert!(state.is(ActionId::Idle));
        assert_eq!(state.priority, 0);
    }

    #[test]
    fn test_hold_duration_formula() {
        let catalog = catalog();
        let mut state = ActionState::default();

        // Non-loop: hold = max(40, duration * 0.22)
        state.request(ActionId::Attack3, 4, false, 100.0, &catalog);
        let expected = (catalog.duration_ms(ActionId::Attack3) * HOLD_FRACTION).max(MIN_HOLD_MS);
        assert!((state.expires_at_ms - 100.0 - expected).abs() < 1e-9);

        // Короткая анимация упирается в минимум 40мс
        state.request(ActionId::Jump, 3, false, 100.0, &catalog);
        assert!(state.expires_at_ms - 100.0 >= MIN_HOLD_MS);
    }

    #[test]
    fn test_loop_blend_holds_zero() {
        let catalog = catalog();
        let mut state = ActionState::default();

        state.request(ActionId::Run, 1, true, 50.0, &catalog);
        assert_eq!(state.expires_at_ms, 50.0);
        // Следующий кадр: перебивается даже нулевым приоритетом
        assert!(state.request(ActionId::Idle, 0, true, 50.1, &catalog));
    }
}
