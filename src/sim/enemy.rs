//! Enemy types and behavior

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::entities::ShotRequest;
use super::rng::RandomSource;
use crate::consts::*;

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Bobbing gunship
    Drone,
    /// Faster bob, tracks the player's height
    Interceptor,
    /// Pinned to a band near the ceiling or floor, slow drift, sturdy
    Turret,
}

impl EnemyKind {
    pub fn size(self) -> (f32, f32) {
        match self {
            EnemyKind::Drone | EnemyKind::Interceptor => (50.0, 40.0),
            EnemyKind::Turret => (45.0, 45.0),
        }
    }

    pub fn max_health(self) -> f32 {
        match self {
            EnemyKind::Drone => 4.0,
            EnemyKind::Interceptor => 3.0,
            EnemyKind::Turret => 6.0,
        }
    }

    /// Half-width of the random aim offset (radians)
    pub fn accuracy(self) -> f32 {
        match self {
            EnemyKind::Drone | EnemyKind::Interceptor => 0.18,
            EnemyKind::Turret => 0.1,
        }
    }

    pub fn base_cooldown_ms(self) -> f32 {
        match self {
            EnemyKind::Drone => 2800.0,
            EnemyKind::Interceptor => 2200.0,
            EnemyKind::Turret => 1800.0,
        }
    }

    /// Fraction of world speed used for horizontal movement
    pub fn speed_factor(self) -> f32 {
        match self {
            EnemyKind::Turret => 0.6,
            _ => 1.0,
        }
    }

    /// Vertical bob (angular speed per frame, amplitude per frame)
    fn bob(self) -> Option<(f32, f32)> {
        match self {
            EnemyKind::Drone => Some((0.05, 1.0)),
            EnemyKind::Interceptor => Some((0.08, 1.3)),
            EnemyKind::Turret => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Drone => "drone",
            EnemyKind::Interceptor => "interceptor",
            EnemyKind::Turret => "turret",
        }
    }
}

/// Fraction of the vertical gap to the player an interceptor closes per frame
const INTERCEPTOR_HOMING: f32 = 0.012;

/// Enemies past this margin are culled
pub const ENEMY_OFFSCREEN_MARGIN: f32 = 60.0;

/// A hostile ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    /// Top-left corner
    pub pos: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub destroyed: bool,
    pub shoot_cooldown_ms: f32,
    pub bob_phase: f32,
    /// Frame-equivalents since spawn
    pub age: f32,
    /// Cosmetic gun heading (turrets)
    pub gun_angle: f32,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, x: f32, y: f32, rng: &mut impl RandomSource) -> Self {
        let base = kind.base_cooldown_ms();
        Self {
            id,
            kind,
            pos: Vec2::new(x, y),
            health: kind.max_health(),
            max_health: kind.max_health(),
            destroyed: false,
            shoot_cooldown_ms: rng.range(base * 0.5, base * 1.5),
            bob_phase: rng.angle(),
            age: 0.0,
            gun_angle: std::f32::consts::PI,
        }
    }

    pub fn rect(&self) -> Rect {
        let (w, h) = self.kind.size();
        Rect::new(self.pos.x, self.pos.y, w, h)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Move, aim and maybe fire; returns the shot if one was taken
    pub fn update(
        &mut self,
        s: f32,
        dt_ms: f32,
        game_speed: f32,
        player_center: Vec2,
        rng: &mut impl RandomSource,
    ) -> Option<ShotRequest> {
        if self.destroyed {
            return None;
        }
        self.age += s;
        self.pos.x -= game_speed * self.kind.speed_factor() * s;

        let (_, h) = self.kind.size();
        if let Some((speed, amplitude)) = self.kind.bob() {
            self.pos.y += (self.bob_phase + self.age * speed).sin() * amplitude * s;
            if self.kind == EnemyKind::Interceptor {
                let gap = player_center.y - self.center().y;
                self.pos.y += gap * INTERCEPTOR_HOMING * s;
            }
            self.pos.y = self.pos.y.clamp(h, GROUND_Y - h * 2.0);
        }

        let to_player = player_center - self.center();
        self.gun_angle = to_player.y.atan2(to_player.x);

        self.shoot_cooldown_ms -= dt_ms;
        let in_firing_band = self.pos.x > 20.0 && self.pos.x < SCREEN_WIDTH - 20.0;
        if self.shoot_cooldown_ms > 0.0 || !in_firing_band {
            return None;
        }

        let accuracy = self.kind.accuracy();
        let angle = self.gun_angle + rng.range(-accuracy, accuracy);
        let base = self.kind.base_cooldown_ms();
        self.shoot_cooldown_ms = (base / (game_speed / INITIAL_GAME_SPEED)).max(base / 3.0);
        Some(ShotRequest::new(self.center(), angle))
    }

    /// Apply damage; true only on the hit that destroys it
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.destroyed {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.destroyed = true;
            return true;
        }
        false
    }

    pub fn offscreen(&self) -> bool {
        self.rect().offscreen(ENEMY_OFFSCREEN_MARGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::GameRng;

    fn drone_at(x: f32, y: f32) -> Enemy {
        let mut rng = GameRng::seeded(2);
        Enemy::new(1, EnemyKind::Drone, x, y, &mut rng)
    }

    #[test]
    fn test_four_hits_destroy_drone() {
        let mut enemy = drone_at(500.0, 200.0);
        for _ in 0..3 {
            assert!(!enemy.take_damage(1.0));
            assert!(!enemy.destroyed);
        }
        assert!(enemy.take_damage(1.0));
        assert!(enemy.destroyed);
        // No second kill
        assert!(!enemy.take_damage(1.0));
    }

    #[test]
    fn test_initial_cooldown_in_range() {
        let mut rng = GameRng::seeded(3);
        for kind in [EnemyKind::Drone, EnemyKind::Interceptor, EnemyKind::Turret] {
            let enemy = Enemy::new(1, kind, 0.0, 0.0, &mut rng);
            let base = kind.base_cooldown_ms();
            assert!(enemy.shoot_cooldown_ms >= base * 0.5);
            assert!(enemy.shoot_cooldown_ms < base * 1.5);
        }
    }

    #[test]
    fn test_fires_at_player_within_accuracy() {
        let mut rng = GameRng::seeded(4);
        let mut enemy = drone_at(500.0, 200.0);
        enemy.shoot_cooldown_ms = 0.0;
        let player = Vec2::new(100.0, 200.0 + 20.0);
        let shot = enemy.update(0.0, 16.0, INITIAL_GAME_SPEED, player, &mut rng).unwrap();
        let ideal = (player - enemy.center()).y.atan2((player - enemy.center()).x);
        assert!((shot.angle - ideal).abs() <= EnemyKind::Drone.accuracy() + 1e-5);
        assert_eq!(enemy.shoot_cooldown_ms, EnemyKind::Drone.base_cooldown_ms());
    }

    #[test]
    fn test_cooldown_floor_at_high_speed() {
        let mut rng = GameRng::seeded(4);
        let mut enemy = drone_at(500.0, 200.0);
        enemy.shoot_cooldown_ms = 0.0;
        enemy.update(0.0, 16.0, MAX_GAME_SPEED, Vec2::new(100.0, 200.0), &mut rng);
        assert_eq!(enemy.shoot_cooldown_ms, EnemyKind::Drone.base_cooldown_ms() / 3.0);
    }

    #[test]
    fn test_holds_fire_outside_band() {
        let mut rng = GameRng::seeded(4);
        let mut enemy = drone_at(SCREEN_WIDTH + 30.0, 200.0);
        enemy.shoot_cooldown_ms = 0.0;
        assert!(
            enemy
                .update(0.0, 16.0, INITIAL_GAME_SPEED, Vec2::new(100.0, 200.0), &mut rng)
                .is_none()
        );
    }

    #[test]
    fn test_turret_keeps_height() {
        let mut rng = GameRng::seeded(5);
        let mut turret = Enemy::new(1, EnemyKind::Turret, 600.0, 30.0, &mut rng);
        for _ in 0..100 {
            turret.update(1.0, 16.0, 4.0, Vec2::new(100.0, 400.0), &mut rng);
        }
        assert_eq!(turret.pos.y, 30.0);
        assert!((turret.pos.x - (600.0 - 100.0 * 4.0 * 0.6)).abs() < 1e-2);
    }

    #[test]
    fn test_spawn_position_not_offscreen() {
        let enemy = drone_at(SCREEN_WIDTH + 30.0, 200.0);
        assert!(!enemy.offscreen());
        let gone = drone_at(-120.0, 200.0);
        assert!(gone.offscreen());
    }
}
