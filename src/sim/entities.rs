//! Player, obstacles, projectiles, power-ups and particles
//!
//! Every entity exposes a normalized [`Rect`] built at construction; there is
//! no shape guessing at collision time. Per-frame rules take the time scale
//! `s` (1.0 at 60 Hz) and multiply every velocity and acceleration by it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Hitbox, Rect};
use super::effects::PowerupKind;
use super::rng::{DetailRng, RandomSource};
use crate::consts::*;
use crate::map_clamped;

/// The jetpack pilot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub vy: f32,
    pub fuel: f32,
    pub on_ground: bool,
    pub shield_charges: u32,
    /// Fly input held (cleared when the tank runs dry)
    pub is_flying: bool,
    /// Time until the next manual shot is allowed (ms)
    pub shoot_cooldown_ms: f32,
    /// Time until the weapon system fires again (ms)
    pub auto_fire_timer_ms: f32,
    /// Boss body contact is ignored while this is positive (ms)
    pub contact_grace_ms: f32,
    /// Frame-equivalents since the last jet particle
    #[serde(skip)]
    pub jet_timer: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(
                PLAYER_START_X,
                GROUND_Y - PLAYER_H - PLAYER_START_Y_OFFSET,
            ),
            vy: 0.0,
            fuel: MAX_FUEL,
            on_ground: false,
            shield_charges: 0,
            is_flying: false,
            shoot_cooldown_ms: 0.0,
            auto_fire_timer_ms: 0.0,
            contact_grace_ms: 0.0,
            jet_timer: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, PLAYER_W, PLAYER_H)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Muzzle position for outgoing shots
    pub fn muzzle(&self) -> Vec2 {
        Vec2::new(self.pos.x + PLAYER_W, self.pos.y + PLAYER_H / 2.0)
    }

    /// Apply fly input (ignored with an empty tank)
    pub fn set_flying(&mut self, flying: bool) {
        self.is_flying = flying && self.fuel > 0.0;
    }

    /// Integrate one frame of jetpack physics
    pub fn update(&mut self, s: f32) {
        if self.is_flying {
            self.fuel -= FUEL_CONSUMPTION_RATE * s;
            if self.fuel <= 0.0 {
                self.fuel = 0.0;
                self.is_flying = false;
            }
            self.vy = PLAYER_LIFT;
            self.on_ground = false;
        } else if self.on_ground {
            self.fuel = (self.fuel + FUEL_RECHARGE_RATE * s).min(MAX_FUEL);
        }

        if !self.is_flying {
            self.vy += PLAYER_GRAVITY * s;
        }

        self.pos.y += self.vy * s;

        let ground_level = GROUND_Y - PLAYER_H;
        if self.pos.y >= ground_level {
            self.pos.y = ground_level;
            self.vy = 0.0;
            self.on_ground = true;
        } else {
            self.on_ground = false;
        }

        if self.pos.y < 0.0 {
            self.pos.y = 0.0;
            self.vy *= -CEILING_RESTITUTION;
        }

        if self.contact_grace_ms > 0.0 {
            self.contact_grace_ms = (self.contact_grace_ms - s * BASELINE_FRAME_MS).max(0.0);
        }
    }

    /// Spend one shield charge if available
    pub fn absorb_hit(&mut self) -> bool {
        if self.shield_charges > 0 {
            self.shield_charges -= 1;
            true
        } else {
            false
        }
    }

    pub fn add_shield(&mut self) {
        self.shield_charges = (self.shield_charges + 1).min(MAX_SHIELD_CHARGES);
    }

    pub fn refuel(&mut self) {
        self.fuel = MAX_FUEL;
    }
}

/// Corner of an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Crack line, relative to the obstacle's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crack {
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stain {
    pub offset: Vec2,
    pub size: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chip {
    pub corner: Corner,
    pub dx: f32,
    pub dy: f32,
}

/// Precomputed surface detail so drawing never touches an RNG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDetail {
    pub cracks: [Crack; 2],
    pub stains: Vec<Stain>,
    pub chips: Vec<Chip>,
}

impl ObstacleDetail {
    /// Same seed and size always produce the same detail
    pub fn generate(seed: u64, w: f32, h: f32) -> Self {
        let mut r = DetailRng::from_seed(seed);

        let cracks = [
            Crack {
                from: Vec2::new(r.range(w * 0.15, w * 0.85), 0.0),
                to: Vec2::new(r.range(w * 0.10, w * 0.90), h),
                width: r.range(1.0, 1.8),
            },
            Crack {
                from: Vec2::new(0.0, r.range(h * 0.15, h * 0.85)),
                to: Vec2::new(w, r.range(h * 0.10, h * 0.90)),
                width: r.range(1.0, 1.8),
            },
        ];

        let stain_count = r.int(3, 7);
        let stains = (0..stain_count)
            .map(|_| Stain {
                offset: Vec2::new(r.range(w * 0.08, w * 0.92), r.range(h * 0.08, h * 0.92)),
                size: r.range(2.0, 6.0),
                alpha: r.range(40.0, 90.0),
            })
            .collect();

        const CORNERS: [Corner; 4] = [
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomLeft,
            Corner::BottomRight,
        ];
        let chip_count = r.int(2, 5);
        let chips = (0..chip_count)
            .map(|_| Chip {
                corner: r.pick(&CORNERS).copied().unwrap_or(Corner::TopLeft),
                dx: r.range(6.0, 16.0),
                dy: r.range(6.0, 16.0),
            })
            .collect();

        Self {
            cracks,
            stains,
            chips,
        }
    }
}

/// A wall segment scrolling in from the right
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub rect: Rect,
    /// Shared by the two pillars of a gap pair
    pub pair_id: Option<u32>,
    pub seed: u64,
    pub detail: ObstacleDetail,
}

impl Obstacle {
    pub fn new(id: u32, rect: Rect, pair_id: Option<u32>, seed: u64) -> Self {
        Self {
            id,
            rect,
            pair_id,
            seed,
            detail: ObstacleDetail::generate(seed, rect.w, rect.h),
        }
    }

    pub fn update(&mut self, s: f32, game_speed: f32) {
        self.rect.x -= game_speed * s;
    }

    pub fn offscreen(&self) -> bool {
        self.rect.offscreen(0.0)
    }
}

/// A queued shot: origin, heading and speed scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub origin: Vec2,
    pub angle: f32,
    pub speed_mult: f32,
}

impl ShotRequest {
    pub fn new(origin: Vec2, angle: f32) -> Self {
        Self {
            origin,
            angle,
            speed_mult: 1.0,
        }
    }
}

/// Friendly shot; `pos` is the tail at the vertical center line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProjectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub damage: f32,
}

impl PlayerProjectile {
    pub fn new(id: u32, origin: Vec2, angle: f32, game_speed: f32) -> Self {
        let speed = 15.0 + game_speed * 1.2;
        Self {
            id,
            pos: origin,
            vel: Vec2::from_angle(angle) * speed,
            angle,
            damage: PLAYER_PROJECTILE_DAMAGE,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.pos.x,
            self.pos.y - PLAYER_PROJECTILE_H / 2.0,
            PLAYER_PROJECTILE_W,
            PLAYER_PROJECTILE_H,
        )
    }

    pub fn update(&mut self, s: f32) {
        self.pos += self.vel * s;
    }

    pub fn offscreen(&self) -> bool {
        self.rect().offscreen(0.0)
    }
}

/// Hostile round shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyProjectile {
    pub id: u32,
    pub center: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Cosmetic spin
    pub rotation: f32,
}

impl EnemyProjectile {
    pub fn new(id: u32, shot: ShotRequest, game_speed: f32) -> Self {
        let speed = (2.5 + game_speed * 0.55) * shot.speed_mult;
        Self {
            id,
            center: shot.origin,
            vel: Vec2::from_angle(shot.angle) * speed,
            radius: ENEMY_PROJECTILE_RADIUS,
            rotation: shot.angle,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::Circle {
            center: self.center,
            radius: self.radius,
        }
    }

    pub fn update(&mut self, s: f32) {
        self.center += self.vel * s;
        self.rotation += 0.1 * s;
    }

    pub fn offscreen(&self) -> bool {
        self.hitbox().bounds().offscreen(0.0)
    }
}

/// Coins are drawn smaller than the other pickups
pub fn powerup_size(kind: PowerupKind) -> f32 {
    if kind == PowerupKind::Coin { 20.0 } else { 30.0 }
}

/// Collectible floating toward the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub id: u32,
    pub kind: PowerupKind,
    /// Top-left corner
    pub pos: Vec2,
    /// Bob center line
    pub base_y: f32,
    pub size: f32,
    pub bob_phase: f32,
    /// Frame-equivalents since spawn (drives the bob)
    pub age: f32,
}

impl Powerup {
    pub fn new(id: u32, kind: PowerupKind, x: f32, y: f32, rng: &mut impl RandomSource) -> Self {
        Self {
            id,
            kind,
            pos: Vec2::new(x, y),
            base_y: y,
            size: powerup_size(kind),
            bob_phase: rng.angle(),
            age: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size, self.size)
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::Circle {
            center: self.rect().center(),
            radius: self.size / 2.0,
        }
    }

    /// Scroll left, or home in on `magnet` (player position) when one applies
    pub fn update(&mut self, s: f32, game_speed: f32, magnet: Option<Vec2>) {
        self.age += s;
        match magnet {
            Some(target) if self.kind == PowerupKind::Coin => {
                let delta = target - self.pos;
                let force = map_clamped(delta.length(), 0.0, 200.0, 5.0, 0.5);
                let step = Vec2::from_angle(delta.y.atan2(delta.x)) * force * s;
                self.pos.x += step.x;
                self.base_y += step.y;
            }
            _ => self.pos.x -= game_speed * 0.85 * s,
        }
        self.pos.y = self.base_y + (self.age * 0.08 + self.bob_phase).sin() * 8.0;
    }

    pub fn offscreen(&self) -> bool {
        self.rect().offscreen(20.0)
    }
}

/// Which palette a particle draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleTint {
    Jet,
    Player,
    Obstacle,
    Impact,
    PlayerShot,
    EnemyShot,
    Enemy(super::enemy::EnemyKind),
    Boss(super::boss::BossKind),
    Powerup(PowerupKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParticleShape {
    Round,
    /// Shrapnel: darkened toward grey, stretched and tilted
    Shard { shade: f32, aspect: f32, rotation: f32 },
}

/// Cosmetic particle (never collides)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub initial_size: f32,
    pub life_ms: f32,
    pub start_life_ms: f32,
    /// Velocity kept per 60 Hz frame
    pub drag: f32,
    pub tint: ParticleTint,
    pub shape: ParticleShape,
}

impl Particle {
    pub fn update(&mut self, s: f32, dt_ms: f32) {
        self.vel *= self.drag.powf(s);
        self.pos += self.vel * s;
        self.life_ms -= dt_ms;
        let t = (self.life_ms / self.start_life_ms).clamp(0.0, 1.0);
        self.size = self.initial_size * t;
    }

    /// Opacity 0-1
    pub fn alpha(&self) -> f32 {
        (self.life_ms / self.start_life_ms).clamp(0.0, 1.0)
    }

    pub fn finished(&self) -> bool {
        self.life_ms < 0.0
    }
}

/// Burst of particles around `pos`
///
/// Stops early once `cap` particles are alive.
pub fn spawn_explosion(
    particles: &mut Vec<Particle>,
    rng: &mut DetailRng,
    pos: Vec2,
    count: usize,
    tint: ParticleTint,
    life_ms: (f32, f32),
    cap: usize,
) {
    for _ in 0..count {
        if particles.len() >= cap {
            break;
        }
        let vel = Vec2::from_angle(rng.angle()) * rng.range(1.0, 6.0);
        let life = rng.range(life_ms.0, life_ms.1);
        let size = rng.range(3.0, 10.0);
        let jitter = Vec2::new(rng.range(-5.0, 5.0), rng.range(-5.0, 5.0));

        let particle = if rng.chance(0.7) {
            Particle {
                pos: pos + jitter,
                vel,
                size,
                initial_size: size,
                life_ms: life,
                start_life_ms: life,
                drag: 0.9,
                tint,
                shape: ParticleShape::Round,
            }
        } else {
            let size = size * rng.range(0.5, 0.8);
            let life = life * 0.8;
            Particle {
                pos: pos + jitter,
                vel: vel * rng.range(1.2, 1.8),
                size,
                initial_size: size,
                life_ms: life,
                start_life_ms: life,
                drag: 0.98,
                tint,
                shape: ParticleShape::Shard {
                    shade: rng.range(0.2, 0.6),
                    aspect: rng.range(0.65, 1.35),
                    rotation: rng.range(-0.35, 0.35),
                },
            }
        };
        particles.push(particle);
    }
}

/// Single exhaust puff below the jetpack
pub fn jet_particle(player: &Player, rng: &mut DetailRng) -> Particle {
    let size = rng.range(6.0, 12.0);
    let life = rng.range(15.0, 25.0) * BASELINE_FRAME_MS;
    Particle {
        pos: Vec2::new(player.pos.x + PLAYER_W * 0.2, player.pos.y + PLAYER_H * 0.9),
        vel: Vec2::new(rng.range(-0.5, 0.5), rng.range(1.0, 3.0)),
        size,
        initial_size: size,
        life_ms: life,
        start_life_ms: life,
        drag: 0.95,
        tint: ParticleTint::Jet,
        shape: ParticleShape::Round,
    }
}
