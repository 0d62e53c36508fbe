//! Jetpack Jumper headless runner
//!
//! Plays seeded runs with a simple autopilot, persisting scores like the real
//! game would. Useful for soak testing the simulation.
//!
//! Usage: `jetpack-jumper [--runs N] [--frames N] [--seed N] [--settings PATH]`

use std::path::PathBuf;

use clap::Parser;
use jetpack_jumper::audio::LogAudio;
use jetpack_jumper::consts::*;
use jetpack_jumper::game::{Frame, Game, Renderer};
use jetpack_jumper::persistence::{MemoryBackend, MirroredStore};
use jetpack_jumper::settings::Settings;
use jetpack_jumper::sim::{Hud, Screen, SimulationState};

#[derive(Parser, Debug)]
#[command(name = "jetpack-jumper")]
#[command(about = "Play seeded Jetpack Jumper runs with an autopilot and record the scores")]
struct Options {
    /// Number of runs to play back to back
    #[arg(long, default_value_t = 3)]
    runs: u32,
    /// Frame limit per run
    #[arg(long = "frames", default_value_t = 18_000)]
    max_frames: u32,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Settings file; missing or invalid files fall back to defaults
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,
}

/// Keeps the last HUD instead of drawing
#[derive(Default)]
struct HudRecorder {
    last: Option<Hud>,
}

impl Renderer for HudRecorder {
    fn draw(&mut self, frame: &Frame<'_>) {
        self.last = Some(frame.hud.clone());
    }
}

/// Hover around the middle of the screen, climbing over anything close ahead
fn wants_to_fly(state: &SimulationState) -> bool {
    let player = state.player.rect();
    let threat_below = state.obstacles.iter().any(|o| {
        let ahead = o.rect.x - player.right();
        (0.0..160.0).contains(&ahead) && o.rect.y > SCREEN_HEIGHT / 2.0
    });
    let target = if threat_below {
        SCREEN_HEIGHT * 0.25
    } else {
        SCREEN_HEIGHT * 0.5
    };
    player.center().y > target
}

fn main() {
    env_logger::init();

    let options = Options::parse();

    let settings = Settings::load(&options.settings);
    log::info!(
        "Jetpack Jumper (headless) starting: {} runs, seed {}",
        options.runs,
        options.seed
    );

    // Stand-in for the remote leaderboard; only used when configured
    let store = MirroredStore::from_settings(&settings, Some(MemoryBackend::new()));
    let mut game = Game::with_seed(settings, Some(Box::new(store)), options.seed);
    let mut audio = LogAudio::new();
    let mut renderer = HudRecorder::default();

    let mut now_ms = 0.0;
    for run in 0..options.runs {
        let started = if run == 0 { game.start() } else { game.restart() };
        if !started {
            log::warn!("Could not start run {}", run + 1);
            break;
        }

        let mut frames = 0;
        while game.screen() == Screen::Game && frames < options.max_frames {
            game.set_flying(wants_to_fly(game.state()));
            if frames % 10 == 0 {
                game.trigger_shoot();
            }
            game.frame(now_ms, &mut renderer, &mut audio);
            now_ms += BASELINE_FRAME_MS as f64;
            frames += 1;
        }

        if let Some(hud) = renderer.last.as_ref() {
            match serde_json::to_string(hud) {
                Ok(json) => println!("run {}: {} {}", run + 1, game.screen().as_str(), json),
                Err(e) => log::warn!("Could not encode HUD: {}", e),
            }
        }

        if game.screen() == Screen::Game {
            log::info!("Run {} reached the frame limit, stopping", run + 1);
            break;
        }
    }

    println!("Top scores:");
    for (i, record) in game.leaderboard().top(10).iter().enumerate() {
        println!("{:>2}. {:<16} {}", i + 1, record.name, record.score);
    }
    log::info!("{} sound cues played", audio.played());

    game.shutdown();
}
