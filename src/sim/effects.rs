//! Power-up kinds and the effect ledger
//!
//! The ledger maps each timed power-up to an absolute expiry (ms on the
//! simulation clock). An effect is active iff `now < expiry`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Coin,
    FuelCell,
    Shield,
    WeaponSystem,
    SpreadShot,
    RapidFire,
    ScoreMultiplier,
    CoinMagnet,
    SpeedBurst,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 9] = [
        PowerupKind::Coin,
        PowerupKind::FuelCell,
        PowerupKind::Shield,
        PowerupKind::WeaponSystem,
        PowerupKind::SpreadShot,
        PowerupKind::RapidFire,
        PowerupKind::ScoreMultiplier,
        PowerupKind::CoinMagnet,
        PowerupKind::SpeedBurst,
    ];

    /// Duration of the timed effect, None for instant pickups
    pub fn duration_ms(self) -> Option<f64> {
        match self {
            PowerupKind::Coin | PowerupKind::FuelCell | PowerupKind::Shield => None,
            PowerupKind::WeaponSystem => Some(WEAPON_SYSTEM_DURATION),
            PowerupKind::SpreadShot => Some(SPREAD_SHOT_DURATION),
            PowerupKind::RapidFire => Some(RAPID_FIRE_DURATION),
            PowerupKind::ScoreMultiplier => Some(SCORE_MULTIPLIER_DURATION),
            PowerupKind::CoinMagnet => Some(COIN_MAGNET_DURATION),
            PowerupKind::SpeedBurst => Some(SPEED_BURST_DURATION),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerupKind::Coin => "coin",
            PowerupKind::FuelCell => "fuel_cell",
            PowerupKind::Shield => "shield",
            PowerupKind::WeaponSystem => "weapon_system",
            PowerupKind::SpreadShot => "spread_shot",
            PowerupKind::RapidFire => "rapid_fire",
            PowerupKind::ScoreMultiplier => "score_multiplier",
            PowerupKind::CoinMagnet => "coin_magnet",
            PowerupKind::SpeedBurst => "speed_burst",
        }
    }
}

/// Player weapon mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponMode {
    #[default]
    Standard,
    Spread,
}

/// Active timed effects plus the stacking score multiplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectLedger {
    expiries: BTreeMap<PowerupKind, f64>,
    score_multiplier: u32,
    weapon_mode: WeaponMode,
}

impl Default for EffectLedger {
    fn default() -> Self {
        Self {
            expiries: BTreeMap::new(),
            score_multiplier: 1,
            weapon_mode: WeaponMode::Standard,
        }
    }
}

impl EffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `kind` is active at `now`
    pub fn is_active(&self, kind: PowerupKind, now: f64) -> bool {
        self.expiries.get(&kind).is_some_and(|&expiry| now < expiry)
    }

    /// Absolute expiry of `kind`, if tracked
    pub fn expiry(&self, kind: PowerupKind) -> Option<f64> {
        self.expiries.get(&kind).copied()
    }

    /// Remaining time for each active effect, in ledger order
    pub fn active(&self, now: f64) -> Vec<(PowerupKind, f64)> {
        self.expiries
            .iter()
            .filter(|&(_, &expiry)| now < expiry)
            .map(|(&kind, &expiry)| (kind, expiry - now))
            .collect()
    }

    pub fn score_multiplier(&self) -> u32 {
        self.score_multiplier
    }

    pub fn weapon_mode(&self) -> WeaponMode {
        self.weapon_mode
    }

    /// Refresh `kind` so it lasts at least until `until` (never shortens)
    fn extend(&mut self, kind: PowerupKind, until: f64) {
        let entry = self.expiries.entry(kind).or_insert(until);
        *entry = entry.max(until);
    }

    /// Apply the timed part of a pickup
    ///
    /// Instant pickups (coin, fuel cell, shield) are no-ops here; the
    /// simulation applies those directly to the player and score.
    pub fn activate(&mut self, kind: PowerupKind, now: f64) {
        let Some(duration) = kind.duration_ms() else {
            return;
        };
        let until = now + duration;

        match kind {
            PowerupKind::SpreadShot => {
                // Sub-modes keep the master switch on for at least as long
                self.extend(PowerupKind::WeaponSystem, until);
                self.weapon_mode = WeaponMode::Spread;
            }
            PowerupKind::RapidFire => {
                self.extend(PowerupKind::WeaponSystem, until);
            }
            PowerupKind::ScoreMultiplier => {
                self.score_multiplier = self.score_multiplier.saturating_mul(2);
            }
            _ => {}
        }

        self.extend(kind, until);
    }

    /// Drop every effect whose expiry has passed, applying cleanup rules
    ///
    /// Returns the kinds that expired this call.
    pub fn expire(&mut self, now: f64) -> Vec<PowerupKind> {
        let expired: Vec<PowerupKind> = self
            .expiries
            .iter()
            .filter(|&(_, &expiry)| now >= expiry)
            .map(|(&kind, _)| kind)
            .collect();

        for kind in &expired {
            self.expiries.remove(kind);
        }

        for kind in &expired {
            match kind {
                PowerupKind::WeaponSystem => {
                    let sub_mode_active = self.is_active(PowerupKind::SpreadShot, now)
                        || self.is_active(PowerupKind::RapidFire, now);
                    if !sub_mode_active {
                        self.weapon_mode = WeaponMode::Standard;
                    }
                }
                PowerupKind::SpreadShot => self.weapon_mode = WeaponMode::Standard,
                PowerupKind::ScoreMultiplier => self.score_multiplier = 1,
                _ => {}
            }
        }

        expired
    }

    /// Cooldown for a manual shot
    pub fn manual_cooldown_ms(&self, now: f64) -> f32 {
        if self.is_active(PowerupKind::RapidFire, now) {
            PLAYER_SHOOT_COOLDOWN_TIME * RAPID_FIRE_COOLDOWN_FACTOR
        } else {
            PLAYER_SHOOT_COOLDOWN_TIME
        }
    }

    /// Auto-fire interval while the weapon system is on, None when it is off
    pub fn auto_fire_interval_ms(&self, now: f64) -> Option<f32> {
        if !self.is_active(PowerupKind::WeaponSystem, now) {
            return None;
        }
        let rapid = self.is_active(PowerupKind::RapidFire, now);
        Some(match (self.weapon_mode, rapid) {
            (WeaponMode::Spread, false) => 200.0,
            (WeaponMode::Standard, false) => 133.0,
            (WeaponMode::Spread, true) => 100.0,
            (WeaponMode::Standard, true) => 67.0,
        })
    }

    /// World speed multiplier from SPEED_BURST
    pub fn speed_factor(&self, now: f64) -> f32 {
        if self.is_active(PowerupKind::SpeedBurst, now) {
            SPEED_BURST_FACTOR
        } else {
            1.0
        }
    }
}
