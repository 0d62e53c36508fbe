//! Spawn director
//!
//! Decides when and what to spawn for the obstacle, enemy and power-up
//! streams. Each stream fires once `now - last_spawn_at >= current_interval`
//! and then tightens its interval toward a floor. The boss countdown lives in
//! the boss director.

use log::debug;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::effects::PowerupKind;
use super::enemy::{Enemy, EnemyKind};
use super::entities::{Obstacle, Powerup};
use super::rng::RandomSource;
use super::state::SimulationState;
use crate::consts::*;

/// One row of a weighted spawn table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEntry<T> {
    pub kind: T,
    pub weight: f32,
    pub enabled: bool,
}

impl<T> WeightedEntry<T> {
    pub const fn new(kind: T, weight: f32) -> Self {
        Self {
            kind,
            weight,
            enabled: true,
        }
    }

    pub const fn disabled(kind: T, weight: f32) -> Self {
        Self {
            kind,
            weight,
            enabled: false,
        }
    }

    #[inline]
    fn eligible(&self) -> bool {
        self.enabled && self.weight > 0.0
    }
}

pub const ENEMY_SPAWN_TABLE: [WeightedEntry<EnemyKind>; 3] = [
    WeightedEntry::new(EnemyKind::Drone, 60.0),
    WeightedEntry::new(EnemyKind::Interceptor, 25.0),
    WeightedEntry::new(EnemyKind::Turret, 15.0),
];

pub const POWERUP_SPAWN_TABLE: [WeightedEntry<PowerupKind>; 9] = [
    WeightedEntry::new(PowerupKind::Coin, 20.0),
    WeightedEntry::new(PowerupKind::FuelCell, 15.0),
    WeightedEntry::new(PowerupKind::Shield, 15.0),
    WeightedEntry::new(PowerupKind::WeaponSystem, 10.0),
    WeightedEntry::new(PowerupKind::SpreadShot, 10.0),
    WeightedEntry::new(PowerupKind::RapidFire, 10.0),
    WeightedEntry::new(PowerupKind::ScoreMultiplier, 7.0),
    WeightedEntry::new(PowerupKind::CoinMagnet, 7.0),
    WeightedEntry::new(PowerupKind::SpeedBurst, 6.0),
];

/// Used while a boss is on screen: survivability and damage over economy
pub const POWERUP_SPAWN_TABLE_DURING_BOSS: [WeightedEntry<PowerupKind>; 5] = [
    WeightedEntry::new(PowerupKind::WeaponSystem, 25.0),
    WeightedEntry::new(PowerupKind::Shield, 25.0),
    WeightedEntry::new(PowerupKind::FuelCell, 20.0),
    WeightedEntry::new(PowerupKind::SpreadShot, 15.0),
    WeightedEntry::new(PowerupKind::RapidFire, 15.0),
];

/// Sum of eligible weights
pub fn total_weight<T>(table: &[WeightedEntry<T>]) -> f32 {
    table.iter().filter(|e| e.eligible()).map(|e| e.weight).sum()
}

/// Walk the table subtracting weights from `roll` (in `[0, total)`)
///
/// The first entry that takes the remainder to zero or below wins.
pub fn pick_weighted<T: Copy>(table: &[WeightedEntry<T>], mut roll: f32) -> Option<T> {
    let mut last = None;
    for entry in table.iter().filter(|e| e.eligible()) {
        roll -= entry.weight;
        last = Some(entry.kind);
        if roll <= 0.0 {
            return last;
        }
    }
    // Float drift past the end lands on the last eligible entry
    last
}

/// Weighted random selection; None when nothing is eligible
pub fn weighted_choice<T: Copy>(
    table: &[WeightedEntry<T>],
    rng: &mut impl RandomSource,
) -> Option<T> {
    let total = total_weight(table);
    if !(total > 0.0) || !total.is_finite() {
        return None;
    }
    pick_weighted(table, rng.unit() * total)
}

/// Interval timer for one spawn stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnStream {
    pub start_interval: f64,
    pub min_interval: f64,
    pub decay: f64,
    pub current_interval: f64,
    pub last_spawn_at: f64,
}

impl SpawnStream {
    pub fn new(start_interval: f64, min_interval: f64, decay: f64, now: f64) -> Self {
        Self {
            start_interval,
            min_interval,
            decay,
            current_interval: start_interval,
            last_spawn_at: now,
        }
    }

    pub fn ready(&self, now: f64) -> bool {
        now - self.last_spawn_at >= self.current_interval
    }

    /// Record a spawn at `now` and tighten the interval
    pub fn fire(&mut self, now: f64) {
        self.last_spawn_at = now;
        self.decay_interval();
    }

    pub fn decay_interval(&mut self) {
        self.current_interval = (self.current_interval * self.decay).max(self.min_interval);
    }

    /// Back to the starting interval
    pub fn reset_interval(&mut self) {
        self.current_interval = self.start_interval;
    }
}

/// Power-up pacing: a regular profile and a slower one used during boss fights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerupPacing {
    pub regular: SpawnStream,
    pub boss: SpawnStream,
}

impl PowerupPacing {
    pub fn new(now: f64) -> Self {
        Self {
            regular: SpawnStream::new(
                POWERUP_REGULAR_INTERVAL,
                POWERUP_REGULAR_MIN_INTERVAL,
                POWERUP_INTERVAL_DECREMENT_FACTOR,
                now,
            ),
            boss: SpawnStream::new(
                POWERUP_BOSS_INTERVAL,
                POWERUP_BOSS_MIN_INTERVAL,
                POWERUP_INTERVAL_DECREMENT_FACTOR,
                now,
            ),
        }
    }

    pub fn stream(&self, boss_active: bool) -> &SpawnStream {
        if boss_active { &self.boss } else { &self.regular }
    }

    pub fn ready(&self, now: f64, boss_active: bool) -> bool {
        self.stream(boss_active).ready(now)
    }

    pub fn fire(&mut self, now: f64, boss_active: bool) {
        // Both profiles share the last-spawn timestamp
        self.regular.last_spawn_at = now;
        self.boss.last_spawn_at = now;
        if boss_active {
            self.boss.decay_interval();
        } else {
            self.regular.decay_interval();
        }
    }
}

/// Owns the obstacle, enemy and power-up stream timers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnDirector {
    pub obstacles: SpawnStream,
    pub enemies: SpawnStream,
    pub powerups: PowerupPacing,
}

impl SpawnDirector {
    pub fn new(now: f64) -> Self {
        Self {
            obstacles: SpawnStream::new(
                OBSTACLE_START_INTERVAL,
                OBSTACLE_MIN_INTERVAL,
                OBSTACLE_INTERVAL_DECREMENT_FACTOR,
                now,
            ),
            enemies: SpawnStream::new(
                ENEMY_START_INTERVAL,
                ENEMY_MIN_INTERVAL,
                ENEMY_INTERVAL_DECREMENT_FACTOR,
                now,
            ),
            powerups: PowerupPacing::new(now),
        }
    }

    /// Relax obstacle and enemy pacing (after a boss fight)
    pub fn reset_pacing(&mut self) {
        self.obstacles.reset_interval();
        self.enemies.reset_interval();
    }
}

/// Obstacle arrangement for one spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleLayout {
    Ceiling,
    Ground,
    Floating,
    /// Top and bottom pillars with a flyable gap between them
    GapPair,
}

/// Vertical gap left open between a pillar pair
pub const PILLAR_GAP_MIN: f32 = 150.0;
pub const PILLAR_GAP_MAX: f32 = 210.0;

fn choose_layout(rng: &mut impl RandomSource) -> ObstacleLayout {
    let roll = rng.unit();
    if roll < 0.35 {
        ObstacleLayout::Ceiling
    } else if roll < 0.7 {
        ObstacleLayout::Ground
    } else if roll < 0.85 {
        ObstacleLayout::Floating
    } else {
        ObstacleLayout::GapPair
    }
}

/// Build the obstacles for one spawn at the right screen edge
pub fn make_obstacles(state: &mut SimulationState) -> Vec<Obstacle> {
    let layout = choose_layout(&mut state.rng);
    let w = state.rng.range(25.0, 60.0);
    let x = SCREEN_WIDTH;

    let mut rects = Vec::with_capacity(2);
    match layout {
        ObstacleLayout::Ceiling => {
            let h = state.rng.range(40.0, 180.0);
            rects.push(Rect::new(x, 0.0, w, h));
        }
        ObstacleLayout::Ground => {
            let h = state.rng.range(40.0, 180.0);
            rects.push(Rect::new(x, GROUND_Y - h, w, h));
        }
        ObstacleLayout::Floating => {
            let h = state.rng.range(40.0, 180.0);
            let y = state.rng.range(SCREEN_HEIGHT * 0.15, GROUND_Y - h - 40.0);
            rects.push(Rect::new(x, y, w, h));
        }
        ObstacleLayout::GapPair => {
            let gap = state.rng.range(PILLAR_GAP_MIN, PILLAR_GAP_MAX);
            let gap_top = state.rng.range(40.0, GROUND_Y - gap - 40.0);
            rects.push(Rect::new(x, 0.0, w, gap_top));
            rects.push(Rect::new(x, gap_top + gap, w, GROUND_Y - (gap_top + gap)));
        }
    }

    let pair_id = (rects.len() > 1).then(|| state.next_entity_id());
    rects
        .into_iter()
        .map(|rect| {
            let id = state.next_entity_id();
            let seed = state.detail_rng.next_seed();
            Obstacle::new(id, rect, pair_id, seed)
        })
        .collect()
}

/// True when `candidate` keeps clear of the player and every existing entity
pub fn is_clear_for_spawn(candidate: &Rect, state: &SimulationState) -> bool {
    let padded = candidate.padded(ENEMY_SPAWN_PADDING);

    if padded.distance_to(&state.player.rect()) < SPAWN_PLAYER_EXCLUSION {
        return false;
    }

    let blocked = state.obstacles.iter().any(|o| padded.intersects(&o.rect))
        || state
            .enemies
            .iter()
            .filter(|e| !e.destroyed)
            .any(|e| padded.intersects(&e.rect()))
        || state.powerups.iter().any(|p| padded.intersects(&p.rect()));
    !blocked
}

/// Candidate spawn height for an enemy kind
fn enemy_spawn_y(kind: EnemyKind, rng: &mut impl RandomSource) -> f32 {
    match kind {
        EnemyKind::Turret => {
            let (_, h) = kind.size();
            if rng.chance(0.5) {
                30.0
            } else {
                GROUND_Y - h - 30.0
            }
        }
        _ => rng.range(60.0, GROUND_Y - 90.0),
    }
}

/// Try to place an enemy; None when every attempt overlaps something
pub fn try_make_enemy(state: &mut SimulationState) -> Option<Enemy> {
    let kind = weighted_choice(&ENEMY_SPAWN_TABLE, &mut state.rng).unwrap_or(EnemyKind::Drone);
    let (w, h) = kind.size();
    let x = SCREEN_WIDTH + 30.0;

    for _ in 0..MAX_ENEMY_SPAWN_ATTEMPTS {
        let y = enemy_spawn_y(kind, &mut state.rng);
        let candidate = Rect::new(x, y, w, h);
        if is_clear_for_spawn(&candidate, state) {
            let id = state.next_entity_id();
            return Some(Enemy::new(id, kind, candidate.x, candidate.y, &mut state.rng));
        }
    }
    None
}

/// Build a power-up at the right edge, using the boss table while a boss is active
pub fn make_powerup(state: &mut SimulationState, boss_active: bool) -> Powerup {
    let table: &[WeightedEntry<PowerupKind>] = if boss_active {
        &POWERUP_SPAWN_TABLE_DURING_BOSS
    } else {
        &POWERUP_SPAWN_TABLE
    };
    let kind = weighted_choice(table, &mut state.rng).unwrap_or(PowerupKind::Coin);
    let y = state.rng.range(60.0, GROUND_Y - 90.0);
    let id = state.next_entity_id();
    Powerup::new(id, kind, SCREEN_WIDTH, y, &mut state.rng)
}

/// Run every spawn stream once for this frame
pub fn spawn_step(state: &mut SimulationState) {
    let now = state.now_ms;
    let boss_present = state.boss_director.boss_present();
    let boss_active = state.boss_director.boss_active();

    // Bosses own the screen: no obstacles or enemies while one is present
    if !boss_present {
        if state.spawner.obstacles.ready(now) {
            let obstacles = make_obstacles(state);
            state.obstacles.extend(obstacles);
            state.spawner.obstacles.fire(now);
        }

        if state.spawner.enemies.ready(now) {
            match try_make_enemy(state) {
                Some(enemy) => {
                    state.enemies.push(enemy);
                    state.spawner.enemies.fire(now);
                }
                None => {
                    // Stream stays due and retries next frame
                    debug!("Enemy spawn blocked after {} attempts", MAX_ENEMY_SPAWN_ATTEMPTS);
                }
            }
        }
    }

    if state.spawner.powerups.ready(now, boss_active) {
        let powerup = make_powerup(state, boss_active);
        state.powerups.push(powerup);
        state.spawner.powerups.fire(now, boss_active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::GameRng;
    use proptest::prelude::*;

    /// Deterministic source returning a fixed value
    struct Fixed(f32);

    impl RandomSource for Fixed {
        fn unit(&mut self) -> f32 {
            self.0
        }
    }

    #[test]
    fn test_single_entry_always_chosen() {
        let table = [
            WeightedEntry::disabled(EnemyKind::Drone, 50.0),
            WeightedEntry::new(EnemyKind::Turret, 0.001),
        ];
        for u in [0.0, 0.5, 0.999_999] {
            assert_eq!(weighted_choice(&table, &mut Fixed(u)), Some(EnemyKind::Turret));
        }
    }

    #[test]
    fn test_all_disabled_returns_none() {
        let table = [
            WeightedEntry::disabled(PowerupKind::Coin, 10.0),
            WeightedEntry::disabled(PowerupKind::Shield, 10.0),
        ];
        assert_eq!(weighted_choice(&table, &mut Fixed(0.3)), None);
    }

    #[test]
    fn test_zero_weight_returns_none() {
        let table = [WeightedEntry::new(PowerupKind::Coin, 0.0)];
        assert_eq!(weighted_choice(&table, &mut Fixed(0.3)), None);
        let empty: [WeightedEntry<PowerupKind>; 0] = [];
        assert_eq!(weighted_choice(&empty, &mut Fixed(0.3)), None);
    }

    #[test]
    fn test_enemy_mix_bands() {
        assert_eq!(total_weight(&ENEMY_SPAWN_TABLE), 100.0);
        assert_eq!(pick_weighted(&ENEMY_SPAWN_TABLE, 59.5), Some(EnemyKind::Drone));
        assert_eq!(pick_weighted(&ENEMY_SPAWN_TABLE, 60.5), Some(EnemyKind::Interceptor));
        assert_eq!(pick_weighted(&ENEMY_SPAWN_TABLE, 84.5), Some(EnemyKind::Interceptor));
        assert_eq!(pick_weighted(&ENEMY_SPAWN_TABLE, 85.5), Some(EnemyKind::Turret));
    }

    #[test]
    fn test_exact_boundary_picks_earlier_entry() {
        let table = [
            WeightedEntry::new(EnemyKind::Drone, 1.0),
            WeightedEntry::new(EnemyKind::Interceptor, 1.0),
        ];
        // roll == 1.0 exactly exhausts the first entry
        assert_eq!(pick_weighted(&table, 1.0), Some(EnemyKind::Drone));
        assert_eq!(pick_weighted(&table, 1.01), Some(EnemyKind::Interceptor));
        assert_eq!(pick_weighted(&table, 0.0), Some(EnemyKind::Drone));
    }

    #[test]
    fn test_boss_table_excludes_economy() {
        let mut rng = GameRng::seeded(5);
        for _ in 0..500 {
            let kind = weighted_choice(&POWERUP_SPAWN_TABLE_DURING_BOSS, &mut rng).unwrap();
            assert!(!matches!(
                kind,
                PowerupKind::Coin
                    | PowerupKind::CoinMagnet
                    | PowerupKind::ScoreMultiplier
                    | PowerupKind::SpeedBurst
            ));
        }
    }

    #[test]
    fn test_stream_fires_on_interval() {
        let mut stream = SpawnStream::new(1000.0, 500.0, 0.5, 0.0);
        assert!(!stream.ready(999.0));
        assert!(stream.ready(1000.0));
        stream.fire(1000.0);
        assert_eq!(stream.current_interval, 500.0);
        stream.fire(1500.0);
        assert_eq!(stream.current_interval, 500.0);
        stream.reset_interval();
        assert_eq!(stream.current_interval, 1000.0);
    }

    #[test]
    fn test_powerup_pacing_profiles() {
        let mut pacing = PowerupPacing::new(0.0);
        assert!(pacing.ready(POWERUP_REGULAR_INTERVAL, false));
        assert!(!pacing.ready(POWERUP_REGULAR_INTERVAL, true));
        pacing.fire(POWERUP_REGULAR_INTERVAL, false);
        assert!(pacing.regular.current_interval < POWERUP_REGULAR_INTERVAL);
        assert_eq!(pacing.boss.current_interval, POWERUP_BOSS_INTERVAL);
        assert_eq!(pacing.boss.last_spawn_at, POWERUP_REGULAR_INTERVAL);
    }

    #[test]
    fn test_spawn_step_suppressed_while_boss_present() {
        let mut state = SimulationState::with_seed(11);
        state.boss_director.begin_approach(&mut state.rng);
        state.now_ms = OBSTACLE_START_INTERVAL.max(ENEMY_START_INTERVAL) + 1.0;
        spawn_step(&mut state);
        assert!(state.obstacles.is_empty());
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_obstacles_spawn_at_right_edge() {
        let mut state = SimulationState::with_seed(3);
        for _ in 0..50 {
            for o in make_obstacles(&mut state) {
                assert_eq!(o.rect.x, SCREEN_WIDTH);
                assert!(o.rect.h > 0.0);
                assert!(o.rect.bottom() <= GROUND_Y + 0.001);
            }
        }
    }

    #[test]
    fn test_enemy_spawn_fails_when_crowded() {
        let mut state = SimulationState::with_seed(8);
        // Wall off the whole spawn column
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle::new(
            id,
            Rect::new(SCREEN_WIDTH - 50.0, -100.0, 200.0, SCREEN_HEIGHT + 200.0),
            None,
            1,
        ));
        assert!(try_make_enemy(&mut state).is_none());

        // Stream stays due and nothing is pushed
        state.now_ms = ENEMY_START_INTERVAL;
        spawn_step(&mut state);
        assert!(state.enemies.is_empty());
        assert!(state.spawner.enemies.ready(state.now_ms));
    }

    proptest! {
        #[test]
        fn prop_single_enabled_entry_wins(weight in 0.0001f32..1.0e6, u in 0.0f32..1.0) {
            let table = [
                WeightedEntry::disabled(PowerupKind::Coin, 5.0),
                WeightedEntry::new(PowerupKind::Shield, weight),
                WeightedEntry::disabled(PowerupKind::FuelCell, 5.0),
            ];
            prop_assert_eq!(weighted_choice(&table, &mut Fixed(u)), Some(PowerupKind::Shield));
        }

        #[test]
        fn prop_decay_monotonic_and_bounded(
            start in 100.0f64..10_000.0,
            floor_frac in 0.0f64..1.0,
            decay in 0.5f64..0.999,
            steps in 0usize..2000,
        ) {
            let min = start * floor_frac;
            let mut stream = SpawnStream::new(start, min, decay, 0.0);
            let mut prev = stream.current_interval;
            for i in 0..steps {
                stream.fire(i as f64);
                prop_assert!(stream.current_interval <= prev);
                prop_assert!(stream.current_interval >= min);
                prev = stream.current_interval;
            }
        }

        #[test]
        fn prop_choice_never_returns_disabled(u in 0.0f32..1.0) {
            let table = [
                WeightedEntry::new(EnemyKind::Drone, 3.0),
                WeightedEntry::disabled(EnemyKind::Interceptor, 100.0),
                WeightedEntry::new(EnemyKind::Turret, 1.0),
            ];
            let chosen = weighted_choice(&table, &mut Fixed(u));
            prop_assert!(chosen != Some(EnemyKind::Interceptor));
            prop_assert!(chosen.is_some());
        }
    }
}
