//! Sound cues
//!
//! The simulation only names cues; playback belongs to whatever [`AudioCue`]
//! the embedder plugs into the controller.

use log::debug;
use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player fires
    PlayerShot,
    /// Enemy or boss fires
    EnemyShot,
    /// Enemy destroyed
    EnemyDestroyed,
    /// Shot or body struck an obstacle, enemy or boss without killing it
    Impact,
    /// Power-up collected
    PowerupCollect,
    /// Shield charge spent
    ShieldHit,
    /// Boss entering
    BossWarning,
    /// Boss destroyed
    BossDefeated,
    /// Run lost
    GameOver,
    /// Run won
    Victory,
    /// New high score
    HighScore,
}

impl SoundEffect {
    /// Shots are played at a slightly random rate so volleys don't phase
    pub fn rate_jitter(&self) -> Option<(f32, f32)> {
        match self {
            SoundEffect::PlayerShot | SoundEffect::EnemyShot | SoundEffect::EnemyDestroyed => {
                Some((0.9, 1.1))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::PlayerShot => "player_shot",
            SoundEffect::EnemyShot => "enemy_shot",
            SoundEffect::EnemyDestroyed => "enemy_destroyed",
            SoundEffect::Impact => "impact",
            SoundEffect::PowerupCollect => "powerup_collect",
            SoundEffect::ShieldHit => "shield_hit",
            SoundEffect::BossWarning => "boss_warning",
            SoundEffect::BossDefeated => "boss_defeated",
            SoundEffect::GameOver => "game_over",
            SoundEffect::Victory => "victory",
            SoundEffect::HighScore => "high_score",
        }
    }
}

/// Receiver for sound cues
///
/// Called from the frame loop; implementations must return quickly and must
/// not touch simulation state.
pub trait AudioCue {
    fn play(&mut self, effect: SoundEffect);
}

/// Volume-aware sink that logs cues instead of playing them (headless runs)
#[derive(Debug, Clone)]
pub struct LogAudio {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    played: u64,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl LogAudio {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            played: 0,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Cues that were audible
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AudioCue for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.played += 1;
        debug!("sfx {} (vol {:.2})", effect.as_str(), vol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_sink_skips_cues() {
        let mut audio = LogAudio::new();
        audio.play(SoundEffect::PlayerShot);
        audio.set_muted(true);
        audio.play(SoundEffect::PlayerShot);
        assert_eq!(audio.played(), 1);
    }

    #[test]
    fn test_volume_clamped() {
        let mut audio = LogAudio::new();
        audio.set_master_volume(3.0);
        audio.set_sfx_volume(-1.0);
        audio.play(SoundEffect::GameOver);
        assert_eq!(audio.played(), 0);
    }
}
