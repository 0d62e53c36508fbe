//! Jetpack Jumper - A side-scrolling jetpack shooter with boss fights
//!
//! Core modules:
//! - `sim`: Simulation core (entities, spawning, collisions, effects, bosses)
//! - `game`: Frame controller that drives the simulation and calls out to collaborators
//! - `audio`: Sound cue definitions
//! - `persistence`: Score stores and the background score writer
//! - `highscores`: Leaderboard model
//! - `settings`: Configuration

pub mod audio;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use game::{Game, Renderer};
pub use highscores::{Leaderboard, ScoreRecord};
pub use settings::{BossWinPolicy, QualityPreset, Settings};

/// Game configuration constants
///
/// All per-frame velocities and accelerations assume a 60 Hz baseline and
/// are multiplied by the time scale `s` (see [`time_scale`]).
pub mod consts {
    /// Baseline frame duration (ms) the tuning values assume
    pub const BASELINE_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest frame delta accepted (ms) - longer stalls are clamped
    pub const MAX_FRAME_DELTA_MS: f32 = 100.0;

    /// Play field
    pub const SCREEN_WIDTH: f32 = 960.0;
    pub const SCREEN_HEIGHT: f32 = 540.0;
    pub const GROUND_Y_OFFSET: f32 = 50.0;

    /// Player
    pub const PLAYER_START_X: f32 = 100.0;
    pub const PLAYER_START_Y_OFFSET: f32 = 100.0;
    pub const PLAYER_W: f32 = 35.0;
    pub const PLAYER_H: f32 = 45.0;
    pub const PLAYER_GRAVITY: f32 = 0.55;
    pub const JETPACK_FORCE_MULTIPLIER: f32 = 0.85;
    pub const PLAYER_LIFT: f32 = -10.5 * JETPACK_FORCE_MULTIPLIER;
    /// Velocity kept (and inverted) when bumping the ceiling
    pub const CEILING_RESTITUTION: f32 = 0.2;
    pub const MAX_SHIELD_CHARGES: u32 = 3;
    /// Boss body contact is ignored this long after a shield absorbed it
    pub const BOSS_CONTACT_GRACE_MS: f32 = 1000.0;

    /// Fuel
    pub const MAX_FUEL: f32 = 150.0;
    pub const FUEL_RECHARGE_RATE: f32 = 0.4;
    pub const FUEL_CONSUMPTION_RATE: f32 = 1.0;

    /// World scroll speed
    pub const INITIAL_GAME_SPEED: f32 = 4.0;
    pub const MAX_GAME_SPEED: f32 = 20.0;
    pub const GAME_SPEED_INCREMENT: f32 = 0.0008;
    pub const SPEED_BURST_FACTOR: f32 = 1.5;

    /// Power-up durations (ms)
    pub const WEAPON_SYSTEM_DURATION: f64 = 12000.0;
    pub const SPREAD_SHOT_DURATION: f64 = 10000.0;
    pub const RAPID_FIRE_DURATION: f64 = 7000.0;
    pub const SCORE_MULTIPLIER_DURATION: f64 = 10000.0;
    pub const COIN_MAGNET_DURATION: f64 = 10000.0;
    pub const SPEED_BURST_DURATION: f64 = 6000.0;

    /// Spawn pacing (ms)
    pub const OBSTACLE_START_INTERVAL: f64 = 1400.0;
    pub const OBSTACLE_MIN_INTERVAL: f64 = 600.0;
    pub const OBSTACLE_INTERVAL_DECREMENT_FACTOR: f64 = 0.99;

    pub const POWERUP_REGULAR_INTERVAL: f64 = 3200.0;
    pub const POWERUP_REGULAR_MIN_INTERVAL: f64 = 1800.0;
    pub const POWERUP_BOSS_INTERVAL: f64 = 6000.0;
    pub const POWERUP_BOSS_MIN_INTERVAL: f64 = 3000.0;
    pub const POWERUP_INTERVAL_DECREMENT_FACTOR: f64 = 0.975;

    pub const ENEMY_START_INTERVAL: f64 = 4000.0;
    pub const ENEMY_MIN_INTERVAL: f64 = 2000.0;
    pub const ENEMY_INTERVAL_DECREMENT_FACTOR: f64 = 0.985;

    pub const MAX_ENEMY_SPAWN_ATTEMPTS: u32 = 10;
    /// Padding around a candidate enemy rect when checking for overlaps
    pub const ENEMY_SPAWN_PADDING: f32 = 10.0;
    /// Minimum gap between a freshly spawned enemy and the player
    pub const SPAWN_PLAYER_EXCLUSION: f32 = 80.0;

    /// Boss pacing
    pub const BOSS_SPAWN_INTERVAL_MS: f64 = 60000.0;
    pub const BOSS_ARCHETYPES: u32 = 3;
    /// Per-cycle boss health growth (`1 + cycle * factor`)
    pub const BOSS_HEALTH_SCALING: f32 = 0.1;
    /// Per-cycle boss entry speed growth
    pub const BOSS_ENTRY_SPEED_SCALING: f32 = 0.05;
    pub const BOSS_GRAVITY: f32 = 0.3;
    pub const TEMPORARY_WIN_MESSAGE_DURATION_MS: f64 = 4000.0;

    /// Shooting
    pub const PLAYER_SHOOT_COOLDOWN_TIME: f32 = 240.0;
    pub const RAPID_FIRE_COOLDOWN_FACTOR: f32 = 0.4;
    pub const SPREAD_ANGLE: f32 = 0.2;
    pub const PLAYER_PROJECTILE_DAMAGE: f32 = 1.0;
    pub const PLAYER_PROJECTILE_W: f32 = 20.0;
    pub const PLAYER_PROJECTILE_H: f32 = 4.0;
    pub const ENEMY_PROJECTILE_RADIUS: f32 = 6.0;

    /// Scoring
    pub const ENEMY_KILL_SCORE_FACTOR: f32 = 20.0;
    pub const BOSS_KILL_SCORE_FACTOR: f32 = 25.0;
    pub const COIN_SCORE: u64 = 10;

    /// Kill drops (rolled as a chain: at most one drop per kill)
    pub const COIN_DROP_CHANCE: f32 = 0.5;
    pub const FUEL_DROP_CHANCE: f32 = 0.15;

    /// Ground line (top of the ground strip)
    pub const GROUND_Y: f32 = SCREEN_HEIGHT - GROUND_Y_OFFSET;
}

/// Convert a wall-clock frame delta (ms) into the dimensionless step `s`
///
/// `s == 1.0` for a 60 Hz frame; all per-frame increments are multiplied by it.
#[inline]
pub fn time_scale(dt_ms: f32) -> f32 {
    dt_ms / consts::BASELINE_FRAME_MS
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Step the angle `from` toward `to` by `t` along the shorter arc
#[inline]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    normalize_angle(from + normalize_angle(to - from) * t)
}

/// Re-map `value` from `[in_min, in_max]` to `[out_min, out_max]`, clamped to the output range
#[inline]
pub fn map_clamped(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let t = ((value - in_min) / (in_max - in_min)).clamp(0.0, 1.0);
    lerp(out_min, out_max, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_scale_baseline() {
        assert!((time_scale(consts::BASELINE_FRAME_MS) - 1.0).abs() < 1e-6);
        assert!((time_scale(consts::BASELINE_FRAME_MS * 2.0) - 2.0).abs() < 1e-6);
        assert_eq!(time_scale(0.0), 0.0);
    }

    #[test]
    fn test_normalize_angle() {
        use std::f32::consts::PI;
        assert!((normalize_angle(3.0 * PI) + PI).abs() < 1e-5);
        assert!((normalize_angle(-1.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!((normalize_angle(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_angle_takes_short_arc() {
        use std::f32::consts::PI;
        // From just below +π to just above -π crosses the seam, not zero
        let stepped = lerp_angle(PI - 0.1, -PI + 0.1, 0.5);
        assert!(stepped.cos() < -0.99);
        assert!((lerp_angle(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_map_clamped() {
        assert!((map_clamped(0.0, 0.0, 200.0, 5.0, 0.5) - 5.0).abs() < 1e-6);
        assert!((map_clamped(100.0, 0.0, 200.0, 5.0, 0.5) - 2.75).abs() < 1e-6);
        assert!((map_clamped(500.0, 0.0, 200.0, 5.0, 0.5) - 0.5).abs() < 1e-6);
    }
}
