//! Simulation state and core types
//!
//! Everything a run mutates lives in [`SimulationState`], owned by a single
//! controller and passed by reference into the per-frame functions.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boss::{BossDirector, BossKind};
use super::effects::{EffectLedger, PowerupKind, WeaponMode};
use super::enemy::{Enemy, EnemyKind};
use super::entities::{
    EnemyProjectile, Obstacle, Particle, ParticleTint, Player, PlayerProjectile, Powerup,
    spawn_explosion,
};
use super::rng::{DetailRng, GameRng};
use super::spawn::SpawnDirector;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::settings::{BossWinPolicy, Settings};

/// Top-level mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Start,
    Game,
    GameOver,
    GameWin,
    Scoreboard,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Start => "start",
            Screen::Game => "game",
            Screen::GameOver => "game_over",
            Screen::GameWin => "game_win",
            Screen::Scoreboard => "scoreboard",
        }
    }
}

/// One-way notifications for the controller (audio, persistence, UI)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundEffect),
    PowerupCollected(PowerupKind),
    EffectExpired(PowerupKind),
    ShieldAbsorbed,
    EnemyDestroyed { kind: EnemyKind, points: u64 },
    BossApproaching(BossKind),
    BossActive(BossKind),
    BossPhase { kind: BossKind, phase: u32 },
    BossDefeated { kind: BossKind, points: u64, cycle: u32 },
    /// The run finished on `outcome` (GameOver or GameWin)
    RunEnded { outcome: Screen, score: u64 },
}

/// Per-run tuning taken from settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub boss_policy: BossWinPolicy,
    /// Live particle cap (0 disables particles)
    pub max_particles: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            boss_policy: BossWinPolicy::default(),
            max_particles: 256,
        }
    }
}

impl SimConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            boss_policy: settings.boss_policy,
            max_particles: settings.max_particles(),
        }
    }
}

/// Boss health bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BossHud {
    pub kind: BossKind,
    pub health: f32,
    pub max_health: f32,
    pub active: bool,
    pub phase: u32,
}

/// HUD scalars for the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub fuel: f32,
    pub max_fuel: f32,
    pub elapsed_ms: f64,
    pub shield_charges: u32,
    pub coins: u32,
    pub score_multiplier: u32,
    pub weapon_mode: WeaponMode,
    pub game_speed: f32,
    /// (kind, remaining ms)
    pub active_effects: Vec<(PowerupKind, f64)>,
    pub boss: Option<BossHud>,
    pub bosses_defeated: u32,
    pub victory_banner: bool,
    pub paused: bool,
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub screen: Screen,
    pub paused: bool,
    pub config: SimConfig,

    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub enemies: Vec<Enemy>,
    pub powerups: Vec<Powerup>,
    pub player_projectiles: Vec<PlayerProjectile>,
    pub enemy_projectiles: Vec<EnemyProjectile>,
    /// Cosmetic only
    pub particles: Vec<Particle>,

    pub effects: EffectLedger,
    pub spawner: SpawnDirector,
    pub boss_director: BossDirector,

    /// Gameplay randomness
    pub rng: GameRng,
    /// Cosmetic randomness
    pub detail_rng: DetailRng,

    /// Points from kills, coins and bosses
    pub score: u64,
    /// Distance points (fractional until floored into the total)
    pub distance_points: f64,
    pub distance: f64,
    pub coins_collected: u32,

    /// World speed before SPEED_BURST
    pub base_speed: f32,
    pub game_speed: f32,

    /// Simulation clock (ms since the run started)
    pub now_ms: f64,
    pub frame_count: u64,

    /// Outbox drained by the controller
    pub events: Vec<GameEvent>,

    next_id: u32,
}

impl SimulationState {
    /// Fresh run on the GAME screen
    pub fn new(config: SimConfig, rng: GameRng, detail_seed: u64) -> Self {
        Self {
            screen: Screen::Game,
            paused: false,
            config,
            player: Player::new(),
            obstacles: Vec::new(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            player_projectiles: Vec::new(),
            enemy_projectiles: Vec::new(),
            particles: Vec::new(),
            effects: EffectLedger::new(),
            spawner: SpawnDirector::new(0.0),
            boss_director: BossDirector::new(),
            rng,
            detail_rng: DetailRng::from_seed(detail_seed),
            score: 0,
            distance_points: 0.0,
            distance: 0.0,
            coins_collected: 0,
            base_speed: INITIAL_GAME_SPEED,
            game_speed: INITIAL_GAME_SPEED,
            now_ms: 0.0,
            frame_count: 0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Fully seeded run with default tuning (tests, replays)
    pub fn with_seed(seed: u64) -> Self {
        Self::new(SimConfig::default(), GameRng::seeded(seed), seed)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Awarded points plus floored distance points
    pub fn total_score(&self) -> u64 {
        self.score + self.distance_points.floor() as u64
    }

    pub fn is_running(&self) -> bool {
        self.screen == Screen::Game && !self.paused
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, effect: SoundEffect) {
        self.events.push(GameEvent::Sound(effect));
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add `base * multiplier` points; returns what was awarded
    pub fn award(&mut self, base: f32) -> u64 {
        let points = (base * self.effects.score_multiplier() as f32).round() as u64;
        self.score += points;
        points
    }

    /// Particle burst; lifetimes are given in 60 Hz frames
    pub fn explode(&mut self, pos: Vec2, count: usize, tint: ParticleTint, life_frames: (f32, f32)) {
        spawn_explosion(
            &mut self.particles,
            &mut self.detail_rng,
            pos,
            count,
            tint,
            (
                life_frames.0 * BASELINE_FRAME_MS,
                life_frames.1 * BASELINE_FRAME_MS,
            ),
            self.config.max_particles,
        );
    }

    /// Finish the run on `outcome`
    pub fn end_run(&mut self, outcome: Screen) {
        self.screen = outcome;
        let score = self.total_score();
        match outcome {
            Screen::GameWin => {
                log::info!("Run won with score {}", score);
                self.sound(SoundEffect::Victory);
            }
            _ => {
                log::info!("Run lost with score {}", score);
                let center = self.player.center();
                self.explode(center, 30, ParticleTint::Player, (5.0, 40.0));
                self.sound(SoundEffect::GameOver);
            }
        }
        self.emit(GameEvent::RunEnded { outcome, score });
    }

    pub fn hud(&self) -> Hud {
        let boss = self.boss_director.boss.as_ref().map(|b| BossHud {
            kind: b.kind,
            health: b.health,
            max_health: b.max_health,
            active: b.active,
            phase: b.phase(),
        });
        Hud {
            score: self.total_score(),
            fuel: self.player.fuel,
            max_fuel: MAX_FUEL,
            elapsed_ms: self.now_ms,
            shield_charges: self.player.shield_charges,
            coins: self.coins_collected,
            score_multiplier: self.effects.score_multiplier(),
            weapon_mode: self.effects.weapon_mode(),
            game_speed: self.game_speed,
            active_effects: self.effects.active(self.now_ms),
            boss,
            bosses_defeated: self.boss_director.bosses_defeated,
            victory_banner: self.boss_director.victory_banner_ms > 0.0,
            paused: self.paused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_defaults() {
        let state = SimulationState::with_seed(1);
        assert_eq!(state.screen, Screen::Game);
        assert_eq!(state.player.fuel, MAX_FUEL);
        assert_eq!(state.total_score(), 0);
        assert_eq!(state.game_speed, INITIAL_GAME_SPEED);
    }

    #[test]
    fn test_entity_ids_unique() {
        let mut state = SimulationState::with_seed(1);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_award_uses_multiplier() {
        let mut state = SimulationState::with_seed(1);
        state.effects.activate(PowerupKind::ScoreMultiplier, 0.0);
        assert_eq!(state.award(80.0), 160);
        state.distance_points = 12.9;
        assert_eq!(state.total_score(), 172);
    }

    #[test]
    fn test_end_run_emits_once() {
        let mut state = SimulationState::with_seed(1);
        state.score = 42;
        state.end_run(Screen::GameOver);
        let ended: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::RunEnded { .. }))
            .collect();
        assert_eq!(
            ended,
            vec![GameEvent::RunEnded {
                outcome: Screen::GameOver,
                score: 42
            }]
        );
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_particles_disabled_by_cap() {
        let mut state = SimulationState::with_seed(1);
        state.config.max_particles = 0;
        state.explode(Vec2::ZERO, 20, ParticleTint::Impact, (5.0, 10.0));
        assert!(state.particles.is_empty());
    }
}
