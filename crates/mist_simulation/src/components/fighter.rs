//! Базовые компоненты бойца: Fighter, Health, Stamina, Body, Facing, ProjectileStock

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Сторона дуэли
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize,
)]
pub enum Side {
    #[default]
    Yin,
    Yang,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Yin => Side::Yang,
            Side::Yang => Side::Yin,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Yin => 0,
            Side::Yang => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Yin => "YIN",
            Side::Yang => "YANG",
        }
    }
}

/// Боец — корневой компонент комбатанта.
///
/// Required Components добавляют весь набор состояния автоматически.
/// Боец создаётся на старте раунда и никогда не despawn-ится в течение
/// матча — только переинициализируется при reset.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(
    Health,
    Stamina,
    Body,
    Facing,
    ProjectileStock,
    crate::components::ActionState,
    crate::components::MovementTimers,
    crate::components::CombatTimers,
    crate::components::ComboState,
    crate::components::ComboChain,
    crate::components::InputSnapshot
)]
pub struct Fighter {
    pub side: Side,
}

/// Здоровье бойца
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn reset(&mut self) {
        self.current = self.max;
    }
}

/// Выносливость. В текущем дизайне не ограничивает ничего: всегда полная,
/// spend() мгновенно восполняет до max. Оставлена как extension point —
/// поле есть, gate-ов на него нет (поведение источника сохранено точно).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Stamina {
    pub current: f32,
    pub max: f32,
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

impl Stamina {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    pub fn spend(&mut self, _cost: f32) {
        self.current = self.max;
    }
}

/// Кинематика бойца: скорость и контакты (пол, стены).
///
/// Позиция живёт в Transform (x,y); интеграция — в movement::physics.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Body {
    pub velocity: Vec2,
    pub on_floor: bool,
    pub touching_wall_left: bool,
    pub touching_wall_right: bool,
}

impl Body {
    pub fn touching_wall(&self) -> bool {
        self.touching_wall_left || self.touching_wall_right
    }
}

/// Направление взгляда: +1 вправо, -1 влево
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Facing {
    pub sign: f32,
}

impl Default for Facing {
    fn default() -> Self {
        Self { sign: 1.0 }
    }
}

impl Facing {
    pub fn face_towards(&mut self, dx: f32) {
        if dx != 0.0 {
            self.sign = dx.signum();
        }
    }
}

/// Запас снарядов (shuriken). Ограниченный stock, восполняется только
/// при reset раунда. Независим от ограничения "один снаряд в полёте".
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ProjectileStock {
    pub remaining: u8,
    pub max: u8,
}

impl Default for ProjectileStock {
    fn default() -> Self {
        Self { remaining: 5, max: 5 }
    }
}

impl ProjectileStock {
    /// Забирает один снаряд; false = stock пуст, бросок отклонён
    pub fn try_take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn refill(&mut self) {
        self.remaining = self.max;
    }
}

/// Снаряд в полёте. Живёт от throw до попадания / expiry / выхода за мир.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub owner: Entity,
    pub owner_side: Side,
    pub velocity: Vec2,
    pub remaining_lifetime_ms: f64,
    pub damage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_at_zero() {
        let mut health = Health::new(1000);
        health.take_damage(400);
        assert_eq!(health.current, 600);
        assert!(health.is_alive());

        health.take_damage(9999); // saturating
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());

        health.reset();
        assert_eq!(health.current, 1000);
    }

    #[test]
    fn test_stamina_never_depletes() {
        let mut stamina = Stamina::default();
        stamina.spend(500.0);
        stamina.spend(9999.0);
        assert_eq!(stamina.current, stamina.max);
        assert!(stamina.can_afford(0.0));
    }

    #[test]
    fn test_projectile_stock() {
        let mut stock = ProjectileStock { remaining: 1, max: 5 };
        assert!(stock.try_take());
        assert_eq!(stock.remaining, 0);

        // Бросок при пустом stock отклоняется, снаряд не появляется
        assert!(!stock.try_take());
        assert_eq!(stock.remaining, 0);

        stock.refill();
        assert_eq!(stock.remaining, 5);
    }

    #[test]
    fn test_facing_ignores_zero() {
        let mut facing = Facing::default();
        facing.face_towards(-3.0);
        assert_eq!(facing.sign, -1.0);
        facing.face_towards(0.0);
        assert_eq!(facing.sign, -1.0);
    }
}
