//! Combat события и hit feedback.

use bevy::prelude::*;

use crate::catalog::ActionId;
use crate::components::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Melee,
    Projectile,
}

/// Событие: удар подтверждён (урон уже применён).
///
/// Читают: AI bookkeeping (hits-статистика), HUD, визуальный слой.
#[derive(Event, Debug, Clone)]
pub struct HitConfirmed {
    pub attacker: Entity,
    pub attacker_side: Side,
    pub defender: Entity,
    pub move_id: ActionId,
    pub damage: u32,
    pub source: HitSource,
}

/// Screen shake после подтверждённого удара. Writer — combat resolver,
/// UI слой читает shake_until и трясёт камеру сам.
#[derive(Resource, Debug, Clone, Default)]
pub struct HitFeedback {
    pub shake_until_ms: f64,
    pub last_hit_heavy: bool,
}

impl HitFeedback {
    pub fn shaking(&self, now_ms: f64) -> bool {
        now_ms < self.shake_until_ms
    }
}
