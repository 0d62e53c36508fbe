//! Game settings and preferences
//!
//! Stored as pretty JSON next to the local score store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::persistence::StoreError;

/// Name used until the player picks one
pub const DEFAULT_PLAYER_NAME: &str = "Recruit";
/// Longest accepted player name (chars)
pub const MAX_PLAYER_NAME_LEN: usize = 16;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 256,
            QualityPreset::High => 512,
        }
    }
}

/// What happens when a boss cycle is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossWinPolicy {
    /// The run is won once `bosses` bosses have fallen
    WinAfterCycle { bosses: u32 },
    /// Bosses keep coming; each defeat only raises the victory banner
    Endless,
}

impl Default for BossWinPolicy {
    fn default() -> Self {
        BossWinPolicy::WinAfterCycle { bosses: 3 }
    }
}

/// Remote leaderboard credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub app_id: String,
    pub api_key: String,
}

impl RemoteConfig {
    /// Every field must be non-blank
    pub fn validate(&self) -> Result<(), StoreError> {
        let missing = [
            ("endpoint", &self.endpoint),
            ("app_id", &self.app_id),
            ("api_key", &self.api_key),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match missing {
            Some((field, _)) => Err(StoreError::InvalidRemoteConfig(format!("{field} is blank"))),
            None => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (explosions, jet exhaust)
    pub particles: bool,
    pub boss_policy: BossWinPolicy,
    /// Name attached to saved scores
    pub player_name: String,
    /// Directory of the local score store
    pub scores_dir: PathBuf,
    /// Optional remote mirror for the leaderboard
    pub remote: Option<RemoteConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            boss_policy: BossWinPolicy::default(),
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            scores_dir: PathBuf::from("scores"),
            remote: None,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Trim and store a player name; blank input keeps the current name
    ///
    /// Returns whether the name changed.
    pub fn set_player_name(&mut self, name: &str) -> bool {
        let trimmed: String = name.trim().chars().take(MAX_PLAYER_NAME_LEN).collect();
        if trimmed.is_empty() || trimmed == self.player_name {
            return false;
        }
        log::info!("Player name set to {}", trimmed);
        self.player_name = trimmed;
        true
    }

    pub fn reset_player_name(&mut self) {
        self.player_name = DEFAULT_PLAYER_NAME.to_string();
    }

    /// Remote config, only if it passes validation
    pub fn valid_remote(&self) -> Option<&RemoteConfig> {
        match &self.remote {
            Some(remote) => match remote.validate() {
                Ok(()) => Some(remote),
                Err(e) => {
                    log::warn!("Remote leaderboard disabled: {}", e);
                    None
                }
            },
            None => None,
        }
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::info!("Using default settings ({}: {})", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Corrupt settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to `path` as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
