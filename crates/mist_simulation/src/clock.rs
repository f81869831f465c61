//! FrameClock — источник времени для всей симуляции.
//!
//! Вся логика ожидания (cooldowns, buffers, stun, intermission) хранится
//! как timestamp "now + offset" и сравнивается с FrameClock::now() —
//! никаких блокирующих вызовов. Окно активно iff now < until.
//!
//! Hit-stop — единственное процессно-глобальное состояние: time_scale = 0
//! на несколько десятков миллисекунд. Пишет его только combat resolver
//! (через begin_hitstop), снимается автоматически по expiry в unscaled
//! времени.

use bevy::prelude::*;

/// Верхняя граница кадровой дельты: затянувшийся кадр не взрывает физику
pub const MAX_FRAME_DELTA_MS: f64 = 50.0;

/// Номинальный шаг фиксированной симуляции (60Hz)
pub const FIXED_STEP_MS: f64 = 1000.0 / 60.0;

#[derive(Resource, Debug, Clone)]
pub struct FrameClock {
    /// Монотонное scaled-время (мс). Все timing windows сравниваются с ним.
    now_ms: f64,
    /// Unscaled время (мс) — по нему истекает hit-stop
    real_ms: f64,
    /// Scaled дельта текущего кадра (мс); 0 во время hit-stop
    delta_ms: f64,
    /// Hit-stop активен пока real_ms < hitstop_until_ms
    hitstop_until_ms: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            now_ms: 0.0,
            real_ms: 0.0,
            delta_ms: 0.0,
            hitstop_until_ms: 0.0,
        }
    }
}

impl FrameClock {
    /// Текущее scaled-время (мс)
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Scaled дельта кадра в секундах (для интеграции скоростей)
    pub fn delta_secs(&self) -> f32 {
        (self.delta_ms / 1000.0) as f32
    }

    /// Scaled дельта кадра в миллисекундах (lifetime-счётчики)
    pub fn delta_ms(&self) -> f64 {
        self.delta_ms
    }

    pub fn time_scale(&self) -> f64 {
        if self.real_ms < self.hitstop_until_ms {
            0.0
        } else {
            1.0
        }
    }

    pub fn in_hitstop(&self) -> bool {
        self.time_scale() == 0.0
    }

    /// Окно активно iff now < until
    pub fn window_active(&self, until_ms: f64) -> bool {
        self.now_ms < until_ms
    }

    /// Продвигает часы на сырую кадровую дельту.
    ///
    /// Отрицательная/NaN дельта — нарушение инварианта на границе кадра:
    /// кадр пропускается целиком (delta = 0), состояние не портится.
    pub fn advance(&mut self, raw_delta_ms: f64) {
        if !raw_delta_ms.is_finite() || raw_delta_ms < 0.0 {
            crate::log_warning(&format!(
                "FrameClock: rejected frame delta {raw_delta_ms} (skipping frame)"
            ));
            self.delta_ms = 0.0;
            return;
        }

        let clamped = raw_delta_ms.min(MAX_FRAME_DELTA_MS);
        let before = self.now_ms;

        self.real_ms += clamped;
        self.delta_ms = clamped * self.time_scale();
        self.now_ms += self.delta_ms;

        // Часы монотонны; регрессия — фатальная ошибка в тестах
        debug_assert!(self.now_ms >= before, "FrameClock regressed");
    }

    /// Включает hit-stop: time_scale = 0 на duration_ms unscaled-времени.
    /// Единственный writer — combat resolver.
    pub fn begin_hitstop(&mut self, duration_ms: f64) {
        self.hitstop_until_ms = self.hitstop_until_ms.max(self.real_ms + duration_ms);
    }
}

/// Система: продвижение часов (первая в кадре)
///
/// Headless-симуляция шагает номинальным fixed step; host может подменить
/// дельту реальным временем через FrameClock::advance напрямую.
pub fn advance_clock(mut clock: ResMut<FrameClock>) {
    clock.advance(FIXED_STEP_MS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_clamped() {
        let mut clock = FrameClock::default();
        clock.advance(500.0); // Зависший кадр
        assert_eq!(clock.now(), MAX_FRAME_DELTA_MS);
    }

    #[test]
    fn test_negative_delta_skips_frame() {
        let mut clock = FrameClock::default();
        clock.advance(16.0);
        let before = clock.now();

        clock.advance(-5.0);
        assert_eq!(clock.now(), before);
        assert_eq!(clock.delta_secs(), 0.0);

        clock.advance(f64::NAN);
        assert_eq!(clock.now(), before);
    }

    #[test]
    fn test_hitstop_freezes_and_restores() {
        let mut clock = FrameClock::default();
        clock.advance(16.0);
        let frozen_at = clock.now();

        clock.begin_hitstop(35.0);
        assert!(clock.in_hitstop());

        // 2 кадра по 16мс — всё ещё внутри hit-stop, scaled время стоит
        clock.advance(16.0);
        clock.advance(16.0);
        assert_eq!(clock.now(), frozen_at);

        // Третий кадр выходит за expiry — scale восстановился
        clock.advance(16.0);
        assert!(!clock.in_hitstop());
        assert!(clock.now() > frozen_at);
    }

    #[test]
    fn test_window_active() {
        let mut clock = FrameClock::default();
        clock.advance(16.0);
        let until = clock.now() + 100.0;
        assert!(clock.window_active(until));

        for _ in 0..10 {
            clock.advance(16.0);
        }
        assert!(!clock.window_active(until));
    }
}
