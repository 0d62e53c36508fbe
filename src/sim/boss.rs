//! Boss encounters
//!
//! Three archetypes share one lifecycle (none, approaching, active, defeated)
//! driven by [`BossDirector`]. Per-archetype behavior lives in a static
//! dispatch table ([`BossBehavior`]) keyed by [`BossKind`].

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};

use super::collision::{Hitbox, Rect};
use super::entities::ShotRequest;
use super::rng::RandomSource;
use crate::consts::*;
use crate::lerp_angle;

/// Boss archetypes, fought in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    Tank,
    Ship,
    Final,
}

impl BossKind {
    pub const ALL: [BossKind; 3] = [BossKind::Tank, BossKind::Ship, BossKind::Final];

    /// Round-robin archetype for the given number of bosses already defeated
    pub fn for_cycle(bosses_defeated: u32) -> Self {
        Self::ALL[(bosses_defeated % BOSS_ARCHETYPES) as usize]
    }

    pub fn behavior(self) -> &'static BossBehavior {
        match self {
            BossKind::Tank => &TANK,
            BossKind::Ship => &SHIP,
            BossKind::Final => &FINAL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BossKind::Tank => "tank",
            BossKind::Ship => "ship",
            BossKind::Final => "final",
        }
    }
}

/// Collision body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossBody {
    /// `pos` is the top-left corner
    Rect { w: f32, h: f32 },
    /// `pos` is the center
    Circle { r: f32 },
}

/// Per-frame inputs shared by every archetype
#[derive(Debug, Clone, Copy)]
pub struct BossContext {
    pub s: f32,
    pub dt_ms: f32,
    pub game_speed: f32,
    pub player_center: Vec2,
    /// Bosses defeated so far
    pub cycle: u32,
}

impl BossContext {
    /// World speed relative to the starting speed
    fn pressure(&self) -> f32 {
        self.game_speed / INITIAL_GAME_SPEED
    }
}

/// What an active boss did this frame
#[derive(Debug, Clone, Default)]
pub struct BossActions {
    pub shots: Vec<ShotRequest>,
    /// FINAL escalated to a new phase
    pub phase_changed: bool,
}

type UpdateFn = fn(&mut Boss, &BossContext, &mut dyn RandomSource) -> BossActions;

/// Static description of one archetype
pub struct BossBehavior {
    pub base_health: f32,
    pub body: BossBody,
    pub entry_speed: f32,
    /// Off-screen starting position
    pub spawn: Vec2,
    pub target_x: f32,
    /// Upward kick applied on every volley
    pub hop: f32,
    pub update_active: UpdateFn,
}

const TANK_W: f32 = 150.0;
const TANK_H: f32 = 100.0;
const FINAL_R: f32 = 65.0;
/// Shortest attack mode / phase length, reached in late endless cycles
const MIN_PATTERN_TIMER_MS: f32 = 1500.0;

static TANK: BossBehavior = BossBehavior {
    base_health: 40.0,
    body: BossBody::Rect {
        w: TANK_W,
        h: TANK_H,
    },
    entry_speed: 2.0,
    spawn: Vec2::new(SCREEN_WIDTH + 150.0, GROUND_Y - TANK_H),
    target_x: SCREEN_WIDTH - TANK_W - 70.0,
    hop: -5.0,
    update_active: update_tank,
};

static SHIP: BossBehavior = BossBehavior {
    base_health: 45.0,
    body: BossBody::Circle { r: 55.0 },
    entry_speed: 1.8,
    spawn: Vec2::new(SCREEN_WIDTH + 120.0, 150.0),
    target_x: SCREEN_WIDTH - 55.0 - 120.0,
    hop: -4.0,
    update_active: update_ship,
};

static FINAL: BossBehavior = BossBehavior {
    base_health: 60.0,
    body: BossBody::Circle { r: FINAL_R },
    entry_speed: 1.2,
    spawn: Vec2::new(SCREEN_WIDTH + 150.0, SCREEN_HEIGHT / 2.0),
    target_x: SCREEN_WIDTH - FINAL_R - 70.0,
    hop: -6.0,
    update_active: update_final,
};

/// Health at boss cycle `cycle`
pub fn scaled_health(base: f32, cycle: u32) -> f32 {
    base * (1.0 + cycle as f32 * BOSS_HEALTH_SCALING)
}

/// Entry speed at boss cycle `cycle`
pub fn scaled_entry_speed(base: f32, cycle: u32) -> f32 {
    base * (1.0 + cycle as f32 * BOSS_ENTRY_SPEED_SCALING)
}

/// SHIP attack pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipAttack {
    /// Three shots at the player
    Aimed,
    /// Five shots fanned out behind the ship
    Rear,
}

/// Archetype-specific state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossPattern {
    Tank {
        turret_angle: f32,
    },
    Ship {
        move_angle: f32,
        attack: ShipAttack,
        mode_timer_ms: f32,
    },
    Final {
        move_angle: f32,
        phase: u32,
        phase_timer_ms: f32,
    },
}

/// The boss currently on screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub kind: BossKind,
    pub pos: Vec2,
    pub vy: f32,
    pub health: f32,
    pub max_health: f32,
    pub entry_speed: f32,
    pub target_x: f32,
    pub shoot_timer_ms: f32,
    /// Reached its target position
    pub active: bool,
    /// Frame-equivalents since activation
    pub age: f32,
    pub pattern: BossPattern,
}

impl Boss {
    pub fn new(kind: BossKind, cycle: u32, rng: &mut dyn RandomSource) -> Self {
        let behavior = kind.behavior();
        let max_health = scaled_health(behavior.base_health, cycle);
        let pattern = match kind {
            BossKind::Tank => BossPattern::Tank { turret_angle: PI },
            BossKind::Ship => BossPattern::Ship {
                move_angle: rng.angle(),
                attack: ShipAttack::Aimed,
                mode_timer_ms: (6000.0 - cycle as f32 * 500.0).max(MIN_PATTERN_TIMER_MS),
            },
            BossKind::Final => BossPattern::Final {
                move_angle: rng.angle(),
                phase: 0,
                phase_timer_ms: (18000.0 - cycle as f32 * 1000.0).max(MIN_PATTERN_TIMER_MS),
            },
        };
        Self {
            kind,
            pos: behavior.spawn,
            vy: 0.0,
            health: max_health,
            max_health,
            entry_speed: scaled_entry_speed(behavior.entry_speed, cycle),
            target_x: behavior.target_x,
            shoot_timer_ms: 1500.0,
            active: false,
            age: 0.0,
            pattern,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        match self.kind.behavior().body {
            BossBody::Rect { w, h } => Hitbox::Rect(Rect::new(self.pos.x, self.pos.y, w, h)),
            BossBody::Circle { r } => Hitbox::Circle {
                center: self.pos,
                radius: r,
            },
        }
    }

    pub fn center(&self) -> Vec2 {
        self.hitbox().bounds().center()
    }

    /// FINAL phase (0 for the other archetypes)
    pub fn phase(&self) -> u32 {
        match self.pattern {
            BossPattern::Final { phase, .. } => phase,
            _ => 0,
        }
    }

    /// Slide toward the target x; true once it has arrived
    pub fn update_entry(&mut self, s: f32) -> bool {
        if self.pos.x > self.target_x {
            self.pos.x -= self.entry_speed * s;
        }
        self.pos.x <= self.target_x
    }

    /// Run the archetype's behavior plus the shared gravity hop
    pub fn update_active(&mut self, ctx: &BossContext, rng: &mut dyn RandomSource) -> BossActions {
        let behavior = self.kind.behavior();
        self.age += ctx.s;
        self.shoot_timer_ms -= ctx.dt_ms;

        let actions = (behavior.update_active)(self, ctx, rng);
        if !actions.shots.is_empty() {
            self.vy = behavior.hop;
        }

        self.vy += BOSS_GRAVITY * ctx.s;
        self.pos.y += self.vy * ctx.s;
        self.pos.y = match behavior.body {
            BossBody::Circle { r } => self.pos.y.clamp(r, GROUND_Y - r),
            BossBody::Rect { h, .. } => self.pos.y.clamp(0.0, GROUND_Y - h),
        };
        actions
    }

    /// Apply a hit while active
    pub fn take_damage(&mut self, amount: f32) {
        if !self.active || self.health <= 0.0 {
            return;
        }
        self.health = (self.health - amount).max(0.0);
    }

    pub fn is_defeated(&self) -> bool {
        self.active && self.health <= 0.0
    }
}

fn update_tank(boss: &mut Boss, ctx: &BossContext, _rng: &mut dyn RandomSource) -> BossActions {
    let BossPattern::Tank { turret_angle } = &mut boss.pattern else {
        return BossActions::default();
    };
    let pivot = Vec2::new(boss.pos.x + TANK_W / 2.0 - 30.0, boss.pos.y + 25.0);
    let to_player = ctx.player_center - pivot;
    *turret_angle = lerp_angle(*turret_angle, to_player.y.atan2(to_player.x), 0.03 * ctx.s);

    let mut actions = BossActions::default();
    if boss.shoot_timer_ms <= 0.0 {
        let muzzle = pivot + Vec2::from_angle(*turret_angle) * 30.0;
        for i in -1..=1 {
            actions
                .shots
                .push(ShotRequest::new(muzzle, *turret_angle + i as f32 * 0.2));
        }
        let cooldown = (2500.0 - ctx.cycle as f32 * 100.0) / ctx.pressure();
        boss.shoot_timer_ms = cooldown.max(900.0);
    }
    actions
}

fn update_ship(boss: &mut Boss, ctx: &BossContext, rng: &mut dyn RandomSource) -> BossActions {
    let BossPattern::Ship {
        move_angle,
        attack,
        mode_timer_ms,
    } = &mut boss.pattern
    else {
        return BossActions::default();
    };

    boss.pos.y = SCREEN_HEIGHT / 2.5 + move_angle.sin() * (SCREEN_HEIGHT / 3.0);
    *move_angle += 0.02 / ctx.pressure() * ctx.s;

    *mode_timer_ms -= ctx.dt_ms;
    if *mode_timer_ms <= 0.0 {
        *attack = match attack {
            ShipAttack::Aimed => ShipAttack::Rear,
            ShipAttack::Rear => ShipAttack::Aimed,
        };
        *mode_timer_ms =
            (rng.range(5000.0, 8000.0) - ctx.cycle as f32 * 500.0).max(MIN_PATTERN_TIMER_MS);
    }

    let mut actions = BossActions::default();
    if boss.shoot_timer_ms <= 0.0 {
        let origin = boss.pos;
        let cooldown = match attack {
            ShipAttack::Aimed => {
                let to_player = ctx.player_center - origin;
                let aim = to_player.y.atan2(to_player.x);
                for i in -1..=1 {
                    actions
                        .shots
                        .push(ShotRequest::new(origin, aim + i as f32 * 0.15));
                }
                2000.0
            }
            ShipAttack::Rear => {
                for i in -2..=2 {
                    actions
                        .shots
                        .push(ShotRequest::new(origin, PI + i as f32 * 0.3));
                }
                2800.0 - ctx.cycle as f32 * 150.0
            }
        };
        boss.shoot_timer_ms = (cooldown / ctx.pressure()).max(800.0);
    }
    actions
}

fn update_final(boss: &mut Boss, ctx: &BossContext, _rng: &mut dyn RandomSource) -> BossActions {
    let BossPattern::Final {
        move_angle,
        phase,
        phase_timer_ms,
    } = &mut boss.pattern
    else {
        return BossActions::default();
    };

    // Orbit around the anchor; later phases swing wider and faster
    let reach = if *phase == 1 { 90.0 } else { 70.0 };
    let freq = if *phase == 2 { 2.5 } else { 1.5 };
    boss.pos.x = boss.target_x + move_angle.cos() * reach;
    boss.pos.y = SCREEN_HEIGHT / 2.0 + (*move_angle * freq).sin() * (SCREEN_HEIGHT / 2.0 - FINAL_R - 40.0);
    *move_angle += (0.015 + *phase as f32 * 0.005) / ctx.pressure() * ctx.s;

    let mut actions = BossActions::default();
    *phase_timer_ms -= ctx.dt_ms;
    if *phase_timer_ms <= 0.0 && *phase < 2 {
        *phase += 1;
        *phase_timer_ms = (15000.0 - *phase as f32 * 2000.0 - ctx.cycle as f32 * 500.0)
            .max(MIN_PATTERN_TIMER_MS);
        actions.phase_changed = true;
    }

    if boss.shoot_timer_ms <= 0.0 {
        let count = 6 + *phase * 2 + ctx.cycle;
        let speed_mult = 0.8 + *phase as f32 * 0.1 + ctx.cycle as f32 * 0.05;
        let spin_dir = if *phase % 2 == 0 { 1.0 } else { -1.0 };
        let spin = boss.age * 0.01 * spin_dir;
        for i in 0..count {
            let angle = i as f32 * TAU / count as f32 + spin;
            actions.shots.push(ShotRequest {
                origin: boss.pos,
                angle,
                speed_mult,
            });
        }
        let cooldown = (3000.0 - *phase as f32 * 500.0 - ctx.cycle as f32 * 100.0) / ctx.pressure();
        boss.shoot_timer_ms = cooldown.max(1000.0 - *phase as f32 * 100.0);
    }
    actions
}

/// Lifecycle stage of the encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossStage {
    None,
    Approaching,
    Active,
    Defeated,
}

/// A boss that was just cleared
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefeatedBoss {
    pub kind: BossKind,
    pub max_health: f32,
    pub center: Vec2,
    /// Bosses defeated including this one
    pub cycle: u32,
}

/// What changed during a director update
#[derive(Debug, Clone, Default)]
pub struct BossUpdate {
    pub shots: Vec<ShotRequest>,
    pub entered: Option<BossKind>,
    pub phase_changed: bool,
}

/// Owns the boss countdown and the single boss slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossDirector {
    pub boss: Option<Boss>,
    pub time_until_next_ms: f64,
    pub bosses_defeated: u32,
    /// Endless-mode victory banner time left
    pub victory_banner_ms: f64,
    /// Stage reported for the frame a boss was cleared
    defeated_this_frame: bool,
}

impl Default for BossDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl BossDirector {
    pub fn new() -> Self {
        Self {
            boss: None,
            time_until_next_ms: BOSS_SPAWN_INTERVAL_MS,
            bosses_defeated: 0,
            victory_banner_ms: 0.0,
            defeated_this_frame: false,
        }
    }

    pub fn stage(&self) -> BossStage {
        match &self.boss {
            _ if self.defeated_this_frame => BossStage::Defeated,
            None => BossStage::None,
            Some(boss) if boss.active => BossStage::Active,
            Some(_) => BossStage::Approaching,
        }
    }

    /// A boss exists (approaching or active)
    pub fn boss_present(&self) -> bool {
        self.boss.is_some()
    }

    pub fn boss_active(&self) -> bool {
        self.boss.as_ref().is_some_and(|b| b.active)
    }

    /// Materialize the next boss off-screen
    pub fn begin_approach(&mut self, rng: &mut dyn RandomSource) -> BossKind {
        let kind = BossKind::for_cycle(self.bosses_defeated);
        self.boss = Some(Boss::new(kind, self.bosses_defeated, rng));
        info!("Boss approaching: {} (cycle {})", kind.as_str(), self.bosses_defeated);
        kind
    }

    /// Count down toward the next boss; returns the kind if one starts approaching
    pub fn countdown(&mut self, dt_ms: f32, rng: &mut dyn RandomSource) -> Option<BossKind> {
        self.defeated_this_frame = false;
        if self.boss.is_some() {
            return None;
        }
        self.time_until_next_ms -= dt_ms as f64;
        if self.time_until_next_ms <= 0.0 {
            return Some(self.begin_approach(rng));
        }
        None
    }

    /// Move the boss: entry slide while approaching, behavior once active
    pub fn update(&mut self, ctx: &BossContext, rng: &mut dyn RandomSource) -> BossUpdate {
        let mut update = BossUpdate::default();
        let Some(boss) = self.boss.as_mut() else {
            return update;
        };

        if !boss.active {
            if boss.update_entry(ctx.s) {
                boss.active = true;
                update.entered = Some(boss.kind);
                info!("Boss active: {}", boss.kind.as_str());
            }
            return update;
        }

        let actions = boss.update_active(ctx, rng);
        update.shots = actions.shots;
        update.phase_changed = actions.phase_changed;
        update
    }

    /// Clear a boss whose health ran out; call once per frame after collisions
    pub fn take_defeated(&mut self) -> Option<DefeatedBoss> {
        if !self.boss.as_ref().is_some_and(Boss::is_defeated) {
            return None;
        }
        let boss = self.boss.take()?;
        self.bosses_defeated += 1;
        self.time_until_next_ms = BOSS_SPAWN_INTERVAL_MS;
        self.defeated_this_frame = true;
        info!(
            "Boss defeated: {} ({} total)",
            boss.kind.as_str(),
            self.bosses_defeated
        );
        Some(DefeatedBoss {
            kind: boss.kind,
            max_health: boss.max_health,
            center: boss.center(),
            cycle: self.bosses_defeated,
        })
    }

    pub fn tick_banner(&mut self, dt_ms: f32) {
        if self.victory_banner_ms > 0.0 {
            self.victory_banner_ms = (self.victory_banner_ms - dt_ms as f64).max(0.0);
        }
    }
}
