//! Collision and resolution pass
//!
//! Runs once per frame in a fixed order:
//! obstacles vs player, power-ups vs player, player shots vs (obstacles,
//! enemies, boss), enemies vs player, boss body vs player, enemy shots vs
//! (player, obstacles). A lethal hit without shield ends the run and stops
//! the pass immediately, so nothing later in the order can score or pick up
//! on the same frame.

use std::ops::ControlFlow;

use glam::Vec2;

use super::effects::PowerupKind;
use super::entities::{ParticleTint, Powerup, powerup_size};
use super::rng::RandomSource;
use super::state::{GameEvent, Screen, SimulationState};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Run the whole pass; `Break` means the run ended this frame
pub fn resolve_collisions(state: &mut SimulationState) -> ControlFlow<()> {
    obstacles_vs_player(state)?;
    powerups_vs_player(state);
    player_shots(state);
    enemies_vs_player(state)?;
    boss_vs_player(state)?;
    enemy_shots(state)?;
    state.enemies.retain(|e| !e.destroyed);
    ControlFlow::Continue(())
}

/// Spend a shield charge or end the run
fn lethal_hit(state: &mut SimulationState, at: Vec2, tint: ParticleTint) -> ControlFlow<()> {
    if state.player.absorb_hit() {
        state.explode(at, 8, tint, (3.0, 12.0));
        state.sound(SoundEffect::ShieldHit);
        state.emit(GameEvent::ShieldAbsorbed);
        ControlFlow::Continue(())
    } else {
        state.end_run(Screen::GameOver);
        ControlFlow::Break(())
    }
}

fn obstacles_vs_player(state: &mut SimulationState) -> ControlFlow<()> {
    let player_rect = state.player.rect();
    let mut i = 0;
    while i < state.obstacles.len() {
        if !state.obstacles[i].rect.intersects(&player_rect) {
            i += 1;
            continue;
        }
        let center = state.obstacles[i].rect.center();
        lethal_hit(state, center, ParticleTint::Obstacle)?;
        // Absorbed: the shield smashes the obstacle
        state.obstacles.remove(i);
    }
    ControlFlow::Continue(())
}

fn powerups_vs_player(state: &mut SimulationState) {
    let player_rect = state.player.rect();
    let mut i = 0;
    while i < state.powerups.len() {
        if state.powerups[i].hitbox().hits_rect(&player_rect) {
            let powerup = state.powerups.remove(i);
            collect_powerup(state, &powerup);
        } else {
            i += 1;
        }
    }
}

/// Apply a pickup to the player, score and effect ledger
pub fn collect_powerup(state: &mut SimulationState, powerup: &Powerup) {
    match powerup.kind {
        PowerupKind::Coin => {
            state.coins_collected += 1;
            state.award(COIN_SCORE as f32);
        }
        PowerupKind::FuelCell => state.player.refuel(),
        PowerupKind::Shield => state.player.add_shield(),
        kind => state.effects.activate(kind, state.now_ms),
    }
    log::debug!("Collected {}", powerup.kind.as_str());
    state.explode(
        powerup.rect().center(),
        10,
        ParticleTint::Powerup(powerup.kind),
        (3.0, 15.0),
    );
    state.sound(SoundEffect::PowerupCollect);
    state.emit(GameEvent::PowerupCollected(powerup.kind));
}

fn player_shots(state: &mut SimulationState) {
    let mut i = 0;
    while i < state.player_projectiles.len() {
        let shot = &state.player_projectiles[i];
        let shot_rect = shot.rect();
        let damage = shot.damage;
        let tip = Vec2::new(shot_rect.right(), shot.pos.y);

        let hit = if state.obstacles.iter().any(|o| o.rect.intersects(&shot_rect)) {
            state.explode(tip, 5, ParticleTint::Impact, (2.0, 8.0));
            true
        } else if let Some(idx) = state
            .enemies
            .iter()
            .position(|e| !e.destroyed && e.rect().intersects(&shot_rect))
        {
            damage_enemy(state, idx, damage);
            true
        } else if let Some(boss) = state
            .boss_director
            .boss
            .as_mut()
            .filter(|b| b.active && b.health > 0.0 && b.hitbox().hits_rect(&shot_rect))
        {
            boss.take_damage(damage);
            state.explode(tip, 3, ParticleTint::Impact, (5.0, 15.0));
            state.sound(SoundEffect::Impact);
            true
        } else {
            false
        };

        if hit {
            state.player_projectiles.remove(i);
        } else {
            i += 1;
        }
    }
}

fn damage_enemy(state: &mut SimulationState, idx: usize, damage: f32) {
    let center = state.enemies[idx].center();
    if state.enemies[idx].take_damage(damage) {
        kill_enemy(state, idx);
    } else {
        state.explode(center, 3, ParticleTint::Impact, (5.0, 15.0));
        state.sound(SoundEffect::Impact);
    }
}

/// Score, explosion and drop for an enemy that was just destroyed
fn kill_enemy(state: &mut SimulationState, idx: usize) {
    let enemy = &state.enemies[idx];
    let (kind, max_health, center) = (enemy.kind, enemy.max_health, enemy.center());

    let points = state.award(max_health * ENEMY_KILL_SCORE_FACTOR);
    state.explode(
        center,
        10 + (max_health * 2.0) as usize,
        ParticleTint::Enemy(kind),
        (5.0, 25.0),
    );
    state.sound(SoundEffect::EnemyDestroyed);
    state.emit(GameEvent::EnemyDestroyed { kind, points });

    // At most one drop per kill
    let drop = if state.rng.chance(COIN_DROP_CHANCE) {
        Some(PowerupKind::Coin)
    } else if state.rng.chance(FUEL_DROP_CHANCE) {
        Some(PowerupKind::FuelCell)
    } else {
        None
    };
    if let Some(kind) = drop {
        let half = powerup_size(kind) / 2.0;
        let id = state.next_entity_id();
        let powerup = Powerup::new(id, kind, center.x - half, center.y - half, &mut state.rng);
        state.powerups.push(powerup);
    }
}

fn enemies_vs_player(state: &mut SimulationState) -> ControlFlow<()> {
    let player_rect = state.player.rect();
    for idx in 0..state.enemies.len() {
        let enemy = &state.enemies[idx];
        if enemy.destroyed || !enemy.rect().intersects(&player_rect) {
            continue;
        }
        let (center, tint) = (enemy.center(), ParticleTint::Enemy(enemy.kind));
        lethal_hit(state, center, tint)?;
        // Rammed through the shield
        let enemy = &mut state.enemies[idx];
        let remaining = enemy.health;
        if enemy.take_damage(remaining) {
            kill_enemy(state, idx);
        }
    }
    ControlFlow::Continue(())
}

fn boss_vs_player(state: &mut SimulationState) -> ControlFlow<()> {
    if state.player.contact_grace_ms > 0.0 {
        return ControlFlow::Continue(());
    }
    let player_rect = state.player.rect();
    let Some(boss) = state.boss_director.boss.as_ref() else {
        return ControlFlow::Continue(());
    };
    if !boss.active || !boss.hitbox().hits_rect(&player_rect) {
        return ControlFlow::Continue(());
    }
    let tint = ParticleTint::Boss(boss.kind);
    lethal_hit(state, player_rect.center(), tint)?;
    state.player.contact_grace_ms = BOSS_CONTACT_GRACE_MS;
    ControlFlow::Continue(())
}

fn enemy_shots(state: &mut SimulationState) -> ControlFlow<()> {
    let player_rect = state.player.rect();
    let mut i = 0;
    while i < state.enemy_projectiles.len() {
        let hitbox = state.enemy_projectiles[i].hitbox();
        let center = state.enemy_projectiles[i].center;

        if hitbox.hits_rect(&player_rect) {
            state.enemy_projectiles.remove(i);
            lethal_hit(state, center, ParticleTint::EnemyShot)?;
            continue;
        }

        if state.obstacles.iter().any(|o| hitbox.hits_rect(&o.rect)) {
            state.enemy_projectiles.remove(i);
            state.explode(center, 5, ParticleTint::Impact, (2.0, 8.0));
            continue;
        }

        i += 1;
    }
    ControlFlow::Continue(())
}
