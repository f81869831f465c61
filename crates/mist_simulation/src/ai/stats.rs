//! Статистика движений и адаптивный выбор удара.

use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;

use crate::catalog::ActionId;

/// Счётчики одного движения.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MoveStats {
    pub uses: u32,
    pub hits: u32,
}

impl MoveStats {
    /// Точность в [0, 1]. Ни одного применения — 0.
    pub fn accuracy(&self) -> f32 {
        if self.uses == 0 {
            0.0
        } else {
            self.hits as f32 / self.uses as f32
        }
    }
}

/// Накопленная статистика по движениям бойца.
///
/// BTreeMap, а не HashMap: порядок обхода фиксирован,
/// сериализация и HUD-вывод детерминированы.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoveStatistics {
    moves: BTreeMap<ActionId, MoveStats>,
}

impl MoveStatistics {
    pub fn record_use(&mut self, id: ActionId) {
        self.moves.entry(id).or_default().uses += 1;
    }

    pub fn record_hit(&mut self, id: ActionId) {
        let entry = self.moves.entry(id).or_default();
        entry.hits += 1;
        // Hit без use возможен только при рассинхроне bookkeeping'а
        if entry.hits > entry.uses {
            entry.uses = entry.hits;
        }
    }

    pub fn accuracy(&self, id: ActionId) -> f32 {
        self.moves.get(&id).map(MoveStats::accuracy).unwrap_or(0.0)
    }

    pub fn stats(&self, id: ActionId) -> MoveStats {
        self.moves.get(&id).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionId, MoveStats)> + '_ {
        self.moves.iter().map(|(id, stats)| (*id, *stats))
    }

    /// Движение с лучшей точностью (минимум одно применение).
    /// При равенстве побеждает первое по порядку ActionId.
    pub fn best_move(&self) -> Option<(ActionId, MoveStats)> {
        self.moves
            .iter()
            .filter(|(_, s)| s.uses > 0)
            .map(|(id, s)| (*id, *s))
            .max_by(|a, b| {
                a.1.accuracy()
                    .partial_cmp(&b.1.accuracy())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    // max_by берёт последний из равных, инвертируем tie-break
                    .then(b.0.cmp(&a.0))
            })
    }
}

/// Коэффициент усиления точных движений
const ACCURACY_GAIN: f32 = 1.2;
/// Штраф за каждое повторение подряд
const REPEAT_PENALTY: f32 = 0.6;

/// Взвешенный выбор удара.
///
/// weight = base * (1 + accuracy * 1.2) * 0.6^repeats, где repeats —
/// сколько раз подряд кандидат был выбран последним. AI тянется
/// к тому, что попадает, но не зацикливается на одном движении.
pub fn choose_move<R: Rng>(
    stats: &MoveStatistics,
    last_move: Option<ActionId>,
    repeat_count: u32,
    candidates: &[(ActionId, f32)],
    rng: &mut R,
) -> Option<ActionId> {
    if candidates.is_empty() {
        return None;
    }

    let weights: Vec<f32> = candidates
        .iter()
        .map(|&(id, base)| {
            let mut w = base * (1.0 + stats.accuracy(id) * ACCURACY_GAIN);
            if last_move == Some(id) {
                w *= REPEAT_PENALTY.powi(repeat_count as i32);
            }
            w.max(0.0)
        })
        .collect();

    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        // Все веса занулены — равновероятный fallback
        let idx = rng.gen_range(0..candidates.len());
        return Some(candidates[idx].0);
    }

    let mut roll = rng.gen_range(0.0..total);
    for (&(id, _), &w) in candidates.iter().zip(weights.iter()) {
        if roll < w {
            return Some(id);
        }
        roll -= w;
    }
    // Плавающая точка могла не добрать до последнего веса
    Some(candidates[candidates.len() - 1].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_accuracy_basic() {
        let mut stats = MoveStatistics::default();
        assert_eq!(stats.accuracy(ActionId::Attack1), 0.0);

        stats.record_use(ActionId::Attack1);
        stats.record_use(ActionId::Attack1);
        stats.record_hit(ActionId::Attack1);
        assert!((stats.accuracy(ActionId::Attack1) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_hits_never_exceed_uses() {
        let mut stats = MoveStatistics::default();
        stats.record_hit(ActionId::Special);
        let s = stats.stats(ActionId::Special);
        assert!(s.hits <= s.uses);
    }

    #[test]
    fn test_best_move_prefers_accuracy() {
        let mut stats = MoveStatistics::default();
        for _ in 0..10 {
            stats.record_use(ActionId::Attack1);
        }
        stats.record_hit(ActionId::Attack1);

        for _ in 0..10 {
            stats.record_use(ActionId::Attack2);
        }
        for _ in 0..8 {
            stats.record_hit(ActionId::Attack2);
        }

        let (best, s) = stats.best_move().unwrap();
        assert_eq!(best, ActionId::Attack2);
        assert!((s.accuracy() - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_accurate_move_chosen_more_often() {
        let mut stats = MoveStatistics::default();
        // Attack1: 8/10, Attack2: 1/10
        for _ in 0..10 {
            stats.record_use(ActionId::Attack1);
            stats.record_use(ActionId::Attack2);
        }
        for _ in 0..8 {
            stats.record_hit(ActionId::Attack1);
        }
        stats.record_hit(ActionId::Attack2);

        let candidates = [(ActionId::Attack1, 1.0), (ActionId::Attack2, 1.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let mut picks_a1 = 0;
        for _ in 0..1000 {
            if choose_move(&stats, None, 0, &candidates, &mut rng) == Some(ActionId::Attack1) {
                picks_a1 += 1;
            }
        }
        // Веса 1.96 против 1.12 — уверенное большинство
        assert!(picks_a1 > 550, "picks_a1 = {picks_a1}");
        assert!(picks_a1 < 750, "picks_a1 = {picks_a1}");
    }

    #[test]
    fn test_repeat_penalty_suppresses_spam() {
        let stats = MoveStatistics::default();
        let candidates = [(ActionId::Attack1, 1.0), (ActionId::Attack2, 1.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        // Attack1 выбран 3 раза подряд: вес 0.6^3 = 0.216 против 1.0
        let mut picks_a1 = 0;
        for _ in 0..1000 {
            if choose_move(&stats, Some(ActionId::Attack1), 3, &candidates, &mut rng)
                == Some(ActionId::Attack1)
            {
                picks_a1 += 1;
            }
        }
        assert!(picks_a1 < 300, "picks_a1 = {picks_a1}");
    }

    #[test]
    fn test_empty_candidates() {
        let stats = MoveStatistics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(choose_move(&stats, None, 0, &[], &mut rng), None);
    }
}
