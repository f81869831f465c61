//! Каталог движений: длительность и looping-флаг каждой анимации.
//!
//! Статичен после инициализации. Длительность выводится один раз из
//! frame count / frame rate соответствующего спрайт-листа; сами текстуры
//! живут в исключённом asset-слое, core знает только тайминги.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Идентификатор действия (конечный enum вместо «какая анимация играет»)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect, Serialize, Deserialize,
)]
pub enum ActionId {
    Idle,
    Walk,
    Run,
    JumpStart,
    Jump,
    JumpFall,
    Dash,
    DashAttack,
    Hurt,
    Death,
    Defend,
    Heal,
    Attack1,
    Attack2,
    Attack3,
    Special,
    Throw,
    WallSlide,
    WallJump,
}

impl ActionId {
    /// Melee-атаки, наносящие урон при сближении
    pub fn is_melee_attack(self) -> bool {
        matches!(
            self,
            ActionId::Attack1 | ActionId::Attack2 | ActionId::Attack3 | ActionId::DashAttack
        )
    }

    /// Committal-атаки: промах наказывается self-stun (whiff punishment)
    pub fn is_committal(self) -> bool {
        self.is_melee_attack()
    }

    /// Короткая метка для callout-панели UI
    pub fn label(self) -> &'static str {
        match self {
            ActionId::Idle => "IDLE",
            ActionId::Walk => "WALK",
            ActionId::Run => "RUN",
            ActionId::JumpStart => "JUMP",
            ActionId::Jump => "JUMP",
            ActionId::JumpFall => "FALL",
            ActionId::Dash => "DASH",
            ActionId::DashAttack => "DASH ATK",
            ActionId::Hurt => "HURT",
            ActionId::Death => "DEATH",
            ActionId::Defend => "DEFEND",
            ActionId::Heal => "HEAL",
            ActionId::Attack1 => "ATTACK 1",
            ActionId::Attack2 => "ATTACK 2",
            ActionId::Attack3 => "ATTACK 3",
            ActionId::Special => "SPECIAL",
            ActionId::Throw => "THROW",
            ActionId::WallSlide => "WALL SLIDE",
            ActionId::WallJump => "WALL JUMP",
        }
    }
}

/// Запись каталога: тайминги одной анимации
#[derive(Debug, Clone, Copy)]
pub struct MoveEntry {
    pub frames: u32,
    pub frame_rate: f32,
    pub looping: bool,
}

impl MoveEntry {
    pub fn duration_ms(&self) -> f64 {
        (self.frames.max(1) as f64 / self.frame_rate as f64) * 1000.0
    }
}

/// Каталог всех действий. Read-only после создания.
#[derive(Resource, Debug, Clone)]
pub struct MoveCatalog {
    entries: Vec<(ActionId, MoveEntry)>,
}

impl Default for MoveCatalog {
    fn default() -> Self {
        // frames/rate — с листов бойцов (IDLE.png, ATTACK 1.png, ...)
        let e = |frames, frame_rate, looping| MoveEntry {
            frames,
            frame_rate,
            looping,
        };
        Self {
            entries: vec![
                (ActionId::Idle, e(10, 18.0, true)),
                (ActionId::Walk, e(8, 20.0, true)),
                (ActionId::Run, e(8, 24.0, true)),
                (ActionId::JumpStart, e(4, 26.0, false)),
                (ActionId::Jump, e(3, 24.0, false)),
                (ActionId::JumpFall, e(3, 26.0, false)),
                (ActionId::Dash, e(4, 30.0, false)),
                (ActionId::DashAttack, e(7, 24.0, false)),
                (ActionId::Hurt, e(4, 22.0, false)),
                (ActionId::Death, e(10, 18.0, false)),
                (ActionId::Defend, e(6, 30.0, false)),
                (ActionId::Heal, e(10, 22.0, true)),
                (ActionId::Attack1, e(6, 28.0, false)),
                (ActionId::Attack2, e(6, 28.0, false)),
                (ActionId::Attack3, e(8, 28.0, false)),
                (ActionId::Special, e(9, 28.0, false)),
                (ActionId::Throw, e(7, 28.0, false)),
                (ActionId::WallSlide, e(4, 20.0, true)),
                (ActionId::WallJump, e(4, 22.0, false)),
            ],
        }
    }
}

impl MoveCatalog {
    pub fn entry(&self, id: ActionId) -> MoveEntry {
        self.entries
            .iter()
            .find(|(e, _)| *e == id)
            .map(|(_, entry)| *entry)
            .unwrap_or(MoveEntry {
                frames: 1,
                frame_rate: 10.0,
                looping: false,
            })
    }

    pub fn duration_ms(&self, id: ActionId) -> f64 {
        self.entry(id).duration_ms()
    }

    pub fn is_looping(&self, id: ActionId) -> bool {
        self.entry(id).looping
    }
}
