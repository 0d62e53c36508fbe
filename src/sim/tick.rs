//! Per-frame simulation driver
//!
//! Order within a frame: input, world speed, player physics, weapons, spawn
//! director, entity movement, collision and resolution, offscreen culling,
//! effect expiry, boss lifecycle, particles.

use log::{debug, info};

use super::boss::BossContext;
use super::clock::FrameStep;
use super::effects::{PowerupKind, WeaponMode};
use super::entities::{EnemyProjectile, ParticleTint, PlayerProjectile, ShotRequest, jet_particle};
use super::resolve::resolve_collisions;
use super::spawn::spawn_step;
use super::state::{GameEvent, Screen, SimulationState};
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::settings::BossWinPolicy;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Fly on/off edge (None = unchanged)
    pub fly: Option<bool>,
    /// Manual shot requested
    pub shoot: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the run by one frame
pub fn tick(state: &mut SimulationState, input: &TickInput, step: FrameStep) {
    if input.pause && state.screen == Screen::Game {
        state.paused = !state.paused;
        info!("{}", if state.paused { "Paused" } else { "Resumed" });
    }

    // Frozen: nothing below may mutate
    if !state.is_running() {
        return;
    }

    let (s, dt_ms) = (step.s, step.dt_ms);
    state.now_ms += dt_ms as f64;
    state.frame_count += 1;

    if let Some(fly) = input.fly {
        state.player.set_flying(fly);
    }

    update_speed(state, s);
    update_player(state, s);
    fire_weapons(state, input.shoot, dt_ms);
    spawn_step(state);
    move_entities(state, s, dt_ms);

    if resolve_collisions(state).is_break() {
        return;
    }

    cull_offscreen(state);
    expire_effects(state);
    update_boss_lifecycle(state, dt_ms);
    update_particles(state, s, dt_ms);
}

/// Ramp world speed and accrue distance points
fn update_speed(state: &mut SimulationState, s: f32) {
    let burst = state.effects.speed_factor(state.now_ms);
    state.base_speed = (state.base_speed + GAME_SPEED_INCREMENT * s).min(MAX_GAME_SPEED / burst);
    state.game_speed = state.base_speed * burst;

    let travelled = (state.game_speed * s) as f64;
    state.distance += travelled;
    state.distance_points += travelled * state.effects.score_multiplier() as f64;
}

fn update_player(state: &mut SimulationState, s: f32) {
    state.player.update(s);

    if state.player.is_flying {
        state.player.jet_timer += s;
        if state.player.jet_timer >= 3.0 {
            state.player.jet_timer -= 3.0;
            if state.particles.len() < state.config.max_particles {
                let puff = jet_particle(&state.player, &mut state.detail_rng);
                state.particles.push(puff);
            }
        }
    }
}

/// Manual shots plus weapon-system auto-fire
fn fire_weapons(state: &mut SimulationState, shoot: bool, dt_ms: f32) {
    let now = state.now_ms;
    state.player.shoot_cooldown_ms = (state.player.shoot_cooldown_ms - dt_ms).max(0.0);
    if shoot && state.player.shoot_cooldown_ms <= 0.0 {
        fire_volley(state);
        state.player.shoot_cooldown_ms = state.effects.manual_cooldown_ms(now);
    }

    match state.effects.auto_fire_interval_ms(now) {
        Some(interval) => {
            state.player.auto_fire_timer_ms -= dt_ms;
            if state.player.auto_fire_timer_ms <= 0.0 {
                fire_volley(state);
                state.player.auto_fire_timer_ms = interval;
            }
        }
        None => state.player.auto_fire_timer_ms = 0.0,
    }
}

fn fire_volley(state: &mut SimulationState) {
    let origin = state.player.muzzle();
    let angles: &[f32] = match state.effects.weapon_mode() {
        WeaponMode::Spread => &[-SPREAD_ANGLE, 0.0, SPREAD_ANGLE],
        WeaponMode::Standard => &[0.0],
    };
    for &angle in angles {
        let id = state.next_entity_id();
        state
            .player_projectiles
            .push(PlayerProjectile::new(id, origin, angle, state.game_speed));
    }
    state.sound(SoundEffect::PlayerShot);
}

fn spawn_enemy_shot(state: &mut SimulationState, shot: ShotRequest) {
    let id = state.next_entity_id();
    state
        .enemy_projectiles
        .push(EnemyProjectile::new(id, shot, state.game_speed));
}

fn move_entities(state: &mut SimulationState, s: f32, dt_ms: f32) {
    let gs = state.game_speed;
    let player_center = state.player.center();
    let magnet = state
        .effects
        .is_active(PowerupKind::CoinMagnet, state.now_ms)
        .then_some(state.player.pos);

    for obstacle in &mut state.obstacles {
        obstacle.update(s, gs);
    }
    for powerup in &mut state.powerups {
        powerup.update(s, gs, magnet);
    }
    for shot in &mut state.player_projectiles {
        shot.update(s);
    }
    for shot in &mut state.enemy_projectiles {
        shot.update(s);
    }

    let mut shots = Vec::new();
    for enemy in &mut state.enemies {
        if let Some(shot) = enemy.update(s, dt_ms, gs, player_center, &mut state.rng) {
            shots.push(shot);
        }
    }
    for shot in shots {
        spawn_enemy_shot(state, shot);
        state.sound(SoundEffect::EnemyShot);
    }

    let ctx = BossContext {
        s,
        dt_ms,
        game_speed: gs,
        player_center,
        cycle: state.boss_director.bosses_defeated,
    };
    let update = state.boss_director.update(&ctx, &mut state.rng);
    if let Some(kind) = update.entered {
        state.emit(GameEvent::BossActive(kind));
    }
    if update.phase_changed {
        if let Some(boss) = state.boss_director.boss.as_ref() {
            let (kind, phase, center) = (boss.kind, boss.phase(), boss.center());
            info!("Boss {} entered phase {}", kind.as_str(), phase);
            state.explode(center, 30, ParticleTint::Boss(kind), (10.0, 40.0));
            state.emit(GameEvent::BossPhase { kind, phase });
        }
    }
    if !update.shots.is_empty() {
        for shot in update.shots {
            spawn_enemy_shot(state, shot);
        }
        state.sound(SoundEffect::EnemyShot);
    }
}

fn cull_offscreen(state: &mut SimulationState) {
    state.obstacles.retain(|o| !o.offscreen());
    state.powerups.retain(|p| !p.offscreen());
    state.player_projectiles.retain(|p| !p.offscreen());
    state.enemy_projectiles.retain(|p| !p.offscreen());
    state.enemies.retain(|e| !e.destroyed && !e.offscreen());
}

/// Drop expired effects and report them
pub fn expire_effects(state: &mut SimulationState) {
    for kind in state.effects.expire(state.now_ms) {
        debug!("Effect expired: {}", kind.as_str());
        state.emit(GameEvent::EffectExpired(kind));
    }
}

/// Boss countdown, then defeat handling for a boss cleared this frame
fn update_boss_lifecycle(state: &mut SimulationState, dt_ms: f32) {
    if let Some(kind) = state.boss_director.countdown(dt_ms, &mut state.rng) {
        state.sound(SoundEffect::BossWarning);
        state.emit(GameEvent::BossApproaching(kind));
    }

    if let Some(defeated) = state.boss_director.take_defeated() {
        let points = state.award(defeated.max_health * BOSS_KILL_SCORE_FACTOR);
        state.explode(defeated.center, 50, ParticleTint::Boss(defeated.kind), (10.0, 60.0));
        state.sound(SoundEffect::BossDefeated);
        state.emit(GameEvent::BossDefeated {
            kind: defeated.kind,
            points,
            cycle: defeated.cycle,
        });

        // Difficulty relaxes after every boss
        state.spawner.reset_pacing();
        state.base_speed = INITIAL_GAME_SPEED;
        state.game_speed = INITIAL_GAME_SPEED;

        match state.config.boss_policy {
            BossWinPolicy::WinAfterCycle { bosses } if defeated.cycle >= bosses => {
                state.end_run(Screen::GameWin);
            }
            BossWinPolicy::WinAfterCycle { .. } => {}
            BossWinPolicy::Endless => {
                state.boss_director.victory_banner_ms = TEMPORARY_WIN_MESSAGE_DURATION_MS;
            }
        }
    }

    state.boss_director.tick_banner(dt_ms);
}

fn update_particles(state: &mut SimulationState, s: f32, dt_ms: f32) {
    for particle in &mut state.particles {
        particle.update(s, dt_ms);
    }
    state.particles.retain(|p| !p.finished());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boss::{Boss, BossKind, BossStage};
    use crate::sim::entities::Powerup;
    use crate::sim::resolve::collect_powerup;
    use crate::sim::rng::GameRng;

    fn frame() -> FrameStep {
        FrameStep::baseline()
    }

    /// Tick with every hazard removed so long runs survive
    fn tick_safe(state: &mut SimulationState, input: &TickInput) {
        tick(state, input, frame());
        state.obstacles.clear();
        state.enemies.clear();
        state.enemy_projectiles.clear();
    }

    fn pickup(state: &mut SimulationState, kind: PowerupKind) {
        let mut rng = GameRng::seeded(0);
        let powerup = Powerup::new(0, kind, 0.0, 0.0, &mut rng);
        collect_powerup(state, &powerup);
    }

    #[test]
    fn test_fuel_empties_after_max_fuel_frames() {
        let mut state = SimulationState::with_seed(1);
        let fly = TickInput {
            fly: Some(true),
            ..Default::default()
        };
        tick_safe(&mut state, &fly);
        for _ in 1..(MAX_FUEL / FUEL_CONSUMPTION_RATE) as usize {
            assert!(state.player.fuel > 0.0);
            tick_safe(&mut state, &TickInput::default());
        }
        assert!(state.player.fuel.abs() < 1e-3);
        assert!(!state.player.is_flying);
    }

    #[test]
    fn test_score_multiplier_compounds_then_resets() {
        let mut state = SimulationState::with_seed(1);
        for _ in 0..3 {
            pickup(&mut state, PowerupKind::ScoreMultiplier);
        }
        assert_eq!(state.effects.score_multiplier(), 8);

        state.now_ms = SCORE_MULTIPLIER_DURATION - 1.0;
        expire_effects(&mut state);
        assert_eq!(state.effects.score_multiplier(), 8);

        state.now_ms = SCORE_MULTIPLIER_DURATION;
        expire_effects(&mut state);
        assert_eq!(state.effects.score_multiplier(), 1);
        assert!(
            state
                .events
                .contains(&GameEvent::EffectExpired(PowerupKind::ScoreMultiplier))
        );
    }

    fn doomed_boss(state: &mut SimulationState, kind: BossKind) {
        let mut rng = GameRng::seeded(3);
        let mut boss = Boss::new(kind, state.boss_director.bosses_defeated, &mut rng);
        boss.active = true;
        boss.health = 0.0;
        state.boss_director.boss = Some(boss);
    }

    #[test]
    fn test_win_transition_happens_once() {
        let mut state = SimulationState::with_seed(1);
        state.boss_director.bosses_defeated = 2;
        doomed_boss(&mut state, BossKind::Final);

        tick(&mut state, &TickInput::default(), frame());
        assert_eq!(state.screen, Screen::GameWin);

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), frame());
        }
        let wins = state
            .drain_events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::RunEnded {
                        outcome: Screen::GameWin,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(wins, 1);
        assert_eq!(state.boss_director.bosses_defeated, 3);
    }

    #[test]
    fn test_boss_defeat_awards_and_relaxes() {
        let mut state = SimulationState::with_seed(1);
        state.base_speed = 9.0;
        state.spawner.obstacles.current_interval = OBSTACLE_MIN_INTERVAL;
        state.spawner.enemies.current_interval = ENEMY_MIN_INTERVAL;
        doomed_boss(&mut state, BossKind::Tank);
        let max_health = state.boss_director.boss.as_ref().unwrap().max_health;

        tick(&mut state, &TickInput::default(), frame());
        assert_eq!(state.screen, Screen::Game);
        assert!(state.boss_director.boss.is_none());
        assert_eq!(state.boss_director.stage(), BossStage::Defeated);
        assert_eq!(state.score, (max_health * BOSS_KILL_SCORE_FACTOR).round() as u64);
        assert_eq!(state.base_speed, INITIAL_GAME_SPEED);
        assert_eq!(state.spawner.obstacles.current_interval, OBSTACLE_START_INTERVAL);
        assert_eq!(state.spawner.enemies.current_interval, ENEMY_START_INTERVAL);
        assert_eq!(state.boss_director.time_until_next_ms, BOSS_SPAWN_INTERVAL_MS);

        tick(&mut state, &TickInput::default(), frame());
        assert_eq!(state.boss_director.stage(), BossStage::None);
    }

    #[test]
    fn test_boss_bonus_awarded_once_under_volley() {
        let mut state = SimulationState::with_seed(1);
        doomed_boss(&mut state, BossKind::Final);
        let boss = state.boss_director.boss.as_mut().unwrap();
        boss.health = 1.0;
        let (center, max_health) = (boss.center(), boss.max_health);
        for _ in 0..4 {
            let id = state.next_entity_id();
            state
                .player_projectiles
                .push(PlayerProjectile::new(id, center, 0.0, INITIAL_GAME_SPEED));
        }

        assert!(resolve_collisions(&mut state).is_continue());
        for _ in 0..5 {
            tick_safe(&mut state, &TickInput::default());
        }

        let defeats = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BossDefeated { .. }))
            .count();
        assert_eq!(defeats, 1);
        assert_eq!(state.boss_director.bosses_defeated, 1);
        assert_eq!(state.score, (max_health * BOSS_KILL_SCORE_FACTOR).round() as u64);
    }

    #[test]
    fn test_endless_mode_shows_banner() {
        let mut state = SimulationState::with_seed(1);
        state.config.boss_policy = BossWinPolicy::Endless;
        state.boss_director.bosses_defeated = 2;
        doomed_boss(&mut state, BossKind::Final);

        tick(&mut state, &TickInput::default(), frame());
        assert_eq!(state.screen, Screen::Game);
        assert!(state.hud().victory_banner);
        assert_eq!(state.boss_director.bosses_defeated, 3);
    }

    #[test]
    fn test_boss_countdown_suppresses_spawns() {
        let mut state = SimulationState::with_seed(1);
        state.boss_director.time_until_next_ms = 1.0;
        tick(&mut state, &TickInput::default(), frame());
        assert!(state.boss_director.boss_present());
        assert!(state.events.contains(&GameEvent::BossApproaching(BossKind::Tank)));

        for _ in 0..300 {
            tick_safe(&mut state, &TickInput::default());
            assert!(state.obstacles.is_empty());
        }
        assert!(state.boss_director.boss_active());
    }

    #[test]
    fn test_pause_freezes_state() {
        let mut state = SimulationState::with_seed(1);
        tick(&mut state, &TickInput::default(), frame());
        let now = state.now_ms;
        let y = state.player.pos.y;

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, frame());
        assert!(state.paused);
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), frame());
        }
        assert_eq!(state.now_ms, now);
        assert_eq!(state.player.pos.y, y);

        tick(&mut state, &pause, frame());
        assert!(!state.paused);
        assert!(state.now_ms > now);
    }

    #[test]
    fn test_manual_shot_cooldown() {
        let mut state = SimulationState::with_seed(1);
        let shoot = TickInput {
            shoot: true,
            ..Default::default()
        };
        tick(&mut state, &shoot, frame());
        assert_eq!(state.player_projectiles.len(), 1);
        tick(&mut state, &shoot, frame());
        assert_eq!(state.player_projectiles.len(), 1);
        assert!(state.player.shoot_cooldown_ms > 0.0);
    }

    #[test]
    fn test_spread_auto_fire_volley() {
        let mut state = SimulationState::with_seed(1);
        pickup(&mut state, PowerupKind::SpreadShot);
        tick(&mut state, &TickInput::default(), frame());
        assert_eq!(state.player_projectiles.len(), 3);
        assert_eq!(state.player.auto_fire_timer_ms, 200.0);
    }

    #[test]
    fn test_speed_burst_raises_world_speed() {
        let mut state = SimulationState::with_seed(1);
        tick(&mut state, &TickInput::default(), frame());
        let normal = state.game_speed;
        pickup(&mut state, PowerupKind::SpeedBurst);
        tick(&mut state, &TickInput::default(), frame());
        assert!(state.game_speed > normal * 1.4);
        assert!(state.game_speed <= MAX_GAME_SPEED);
    }

    #[test]
    fn test_distance_points_accumulate() {
        let mut state = SimulationState::with_seed(1);
        for _ in 0..60 {
            tick_safe(&mut state, &TickInput::default());
        }
        assert!(state.total_score() >= 240);
        assert!(state.distance > 0.0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = SimulationState::with_seed(77);
        let mut b = SimulationState::with_seed(77);
        for i in 0..600 {
            let input = TickInput {
                fly: Some(i % 40 < 20),
                shoot: i % 7 == 0,
                pause: false,
            };
            tick(&mut a, &input, frame());
            tick(&mut b, &input, frame());
        }
        assert_eq!(a.screen, b.screen);
        assert_eq!(a.total_score(), b.total_score());
        assert_eq!(a.obstacles.len(), b.obstacles.len());
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.player.pos, b.player.pos);
    }

    #[test]
    fn test_game_over_freezes_run() {
        let mut state = SimulationState::with_seed(1);
        let id = state.next_entity_id();
        let rect = state.player.rect();
        state
            .obstacles
            .push(crate::sim::entities::Obstacle::new(id, rect, None, 1));
        tick(&mut state, &TickInput::default(), frame());
        assert_eq!(state.screen, Screen::GameOver);
        let now = state.now_ms;
        tick(&mut state, &TickInput::default(), frame());
        assert_eq!(state.now_ms, now);
    }
}
