//! Frame controller
//!
//! Owns the screen state machine and the running simulation, turns input
//! signals into [`TickInput`], and calls out to the renderer, the audio sink
//! and the score writer once per frame. None of the collaborators can reach
//! back into the simulation.

use log::{debug, info, warn};

use crate::audio::{AudioCue, SoundEffect};
use crate::highscores::{Leaderboard, MAX_HIGH_SCORES, ScoreRecord, now_timestamp};
use crate::persistence::{ScoreStore, ScoreWriter, SharedStore};
use crate::settings::Settings;
use crate::sim::{
    FrameClock, GameEvent, GameRng, Hud, Screen, SimConfig, SimulationState, TickInput, tick,
};

/// Read-only view handed to the renderer each frame
pub struct Frame<'a> {
    pub screen: Screen,
    pub state: &'a SimulationState,
    pub hud: Hud,
    /// Events raised during this frame (banners, flashes)
    pub events: &'a [GameEvent],
    pub leaderboard: &'a Leaderboard,
}

/// Draws a frame; must not mutate anything it is given
pub trait Renderer {
    fn draw(&mut self, frame: &Frame<'_>);
}

/// Game instance holding all state
pub struct Game {
    settings: Settings,
    screen: Screen,
    state: SimulationState,
    clock: FrameClock,
    input: TickInput,
    leaderboard: Leaderboard,
    writer: Option<ScoreWriter>,
    /// Fixed seed for reproducible runs
    seed: Option<u64>,
    last_rank: Option<usize>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Controller on the START screen; loads the leaderboard from `store` and
    /// hands the store to a background writer
    pub fn new(settings: Settings, store: Option<SharedStore>) -> Self {
        Self::build(settings, store, None)
    }

    /// Like [`Game::new`] but every run uses `seed`
    pub fn with_seed(settings: Settings, store: Option<SharedStore>, seed: u64) -> Self {
        Self::build(settings, store, Some(seed))
    }

    fn build(settings: Settings, store: Option<SharedStore>, seed: Option<u64>) -> Self {
        let mut leaderboard = Leaderboard::new();
        let writer = store.and_then(|store| {
            match store.load_top_scores(MAX_HIGH_SCORES) {
                Ok(records) => {
                    info!("Loaded {} high scores", records.len());
                    leaderboard = Leaderboard::from_records(records);
                }
                Err(e) => warn!("No high scores loaded: {}", e),
            }
            match ScoreWriter::spawn(store) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    warn!("Scores will not be saved: {}", e);
                    None
                }
            }
        });

        let state = new_run(&settings, seed);
        Self {
            settings,
            screen: Screen::Start,
            state,
            clock: FrameClock::new(),
            input: TickInput::default(),
            leaderboard,
            writer,
            seed,
            last_rank: None,
            events: Vec::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Rank reached by the last finished run, if it made the board
    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    /// START → GAME
    pub fn start(&mut self) -> bool {
        if self.screen != Screen::Start {
            debug!("start ignored on {}", self.screen.as_str());
            return false;
        }
        self.begin_run();
        true
    }

    /// GAME_OVER / GAME_WIN → GAME
    pub fn restart(&mut self) -> bool {
        if !matches!(self.screen, Screen::GameOver | Screen::GameWin) {
            debug!("restart ignored on {}", self.screen.as_str());
            return false;
        }
        self.begin_run();
        true
    }

    /// GAME_OVER / GAME_WIN → SCOREBOARD
    pub fn show_scoreboard(&mut self) -> bool {
        if !matches!(self.screen, Screen::GameOver | Screen::GameWin) {
            return false;
        }
        self.screen = Screen::Scoreboard;
        true
    }

    /// SCOREBOARD → START
    pub fn back_to_start(&mut self) -> bool {
        if self.screen != Screen::Scoreboard {
            return false;
        }
        self.screen = Screen::Start;
        true
    }

    fn begin_run(&mut self) {
        self.state = new_run(&self.settings, self.seed);
        self.input = TickInput::default();
        self.clock.reset();
        self.last_rank = None;
        self.screen = Screen::Game;
        info!("Run started");
    }

    pub fn set_flying(&mut self, flying: bool) {
        self.input.fly = Some(flying);
    }

    pub fn trigger_shoot(&mut self) {
        self.input.shoot = true;
    }

    pub fn toggle_pause(&mut self) {
        if self.screen == Screen::Game {
            self.input.pause = true;
            // No catch-up step for the time spent paused
            self.clock.reset();
        }
    }

    /// Run one frame at monotonic time `now_ms`
    pub fn frame(&mut self, now_ms: f64, renderer: &mut dyn Renderer, audio: &mut dyn AudioCue) {
        let step = self.clock.advance(now_ms);

        if self.screen == Screen::Game {
            // One-shot inputs are consumed by this tick
            let input = std::mem::take(&mut self.input);
            tick(&mut self.state, &input, step);
            self.screen = self.state.screen;
        }

        let events = self.state.drain_events();
        for event in &events {
            match event {
                GameEvent::Sound(effect) => audio.play(*effect),
                GameEvent::RunEnded { score, .. } => self.record_score(*score, audio),
                _ => {}
            }
        }
        self.events = events;

        let frame = Frame {
            screen: self.screen,
            state: &self.state,
            hud: self.state.hud(),
            events: &self.events,
            leaderboard: &self.leaderboard,
        };
        renderer.draw(&frame);
    }

    fn record_score(&mut self, score: u64, audio: &mut dyn AudioCue) {
        if score == 0 {
            return;
        }
        let record = ScoreRecord::new(self.settings.player_name.clone(), score, now_timestamp());

        self.last_rank = self.leaderboard.add(record.clone());
        if let Some(rank) = self.last_rank {
            info!("Score {} ranked #{}", score, rank);
            if rank == 1 {
                audio.play(SoundEffect::HighScore);
            }
        }

        if let Some(writer) = self.writer.as_ref() {
            if let Err(e) = writer.submit(record) {
                warn!("Score not queued: {}", e);
            }
        }
    }

    /// Stop the writer after flushing queued scores
    pub fn shutdown(mut self) {
        if let Some(writer) = self.writer.take() {
            writer.shutdown();
        }
    }
}

fn new_run(settings: &Settings, seed: Option<u64>) -> SimulationState {
    let config = SimConfig::from_settings(settings);
    match seed {
        Some(seed) => SimulationState::new(config, GameRng::seeded(seed), seed),
        None => SimulationState::new(config, GameRng::from_entropy(), rand::random()),
    }
}
