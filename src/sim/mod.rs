//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied frame deltas only (no wall clock reads)
//! - Seeded RNG only
//! - Stable iteration order (insertion order of entity vectors)
//! - No rendering, audio or persistence dependencies

pub mod boss;
pub mod clock;
pub mod collision;
pub mod effects;
pub mod enemy;
pub mod entities;
pub mod resolve;
pub mod rng;
pub mod spawn;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossDirector, BossKind, BossStage};
pub use clock::{FrameClock, FrameStep};
pub use collision::{Hitbox, Rect};
pub use effects::{EffectLedger, PowerupKind, WeaponMode};
pub use enemy::{Enemy, EnemyKind};
pub use entities::{EnemyProjectile, Obstacle, Particle, Player, PlayerProjectile, Powerup};
pub use rng::{DetailRng, GameRng, RandomSource};
pub use spawn::SpawnDirector;
pub use state::{GameEvent, Hud, Screen, SimConfig, SimulationState};
pub use tick::{TickInput, tick};
