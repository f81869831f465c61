//! ECS Components бойцов
//!
//! Организация по доменам:
//! - fighter: базовые характеристики (Side, Health, Stamina, Body, Facing, ProjectileStock)
//! - action: ActionState — единственная точка сериализации действий (priority arbitration)
//! - timers: timing windows движения и боя (по одному writer-подсистеме на окно)
//! - input: InputSnapshot — покадровый срез намерений от input-слоя
//! - world: Arena — пол, стены, spawn-точки

pub mod action;
pub mod fighter;
pub mod input;
pub mod timers;
pub mod world;

// Re-exports для удобного импорта
pub use action::*;
pub use fighter::*;
pub use input::*;
pub use timers::*;
pub use world::*;
