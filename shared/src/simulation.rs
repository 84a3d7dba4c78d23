//! Authoritative simulation step
//!
//! Movement, shooting, bullet resolution and the match clock. These are pure
//! state transitions on [`World`] and [`Tank`]; scheduling and locking live in
//! the server.

use crate::world::{Bullet, Tank, Wall, World};
use crate::{
    ARENA_HEIGHT, ARENA_WIDTH, BULLET_SIZE, BULLET_SPEED, INVULNERABILITY_SECS,
    MATCH_DURATION_SECS, TANK_SIZE,
};

/// Result of resolving one bullet against the arena in a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletOutcome {
    InFlight,
    OutOfBounds,
    HitWall,
    HitTank { target: u32 },
}

impl Tank {
    /// Applies a move intent.
    ///
    /// The angle is always taken. The displacement is reverted as a whole if the
    /// moved tank overlaps any wall, then the position is clamped to the arena
    /// interior.
    pub fn apply_move(&mut self, dx: f32, dy: f32, angle: f32, walls: &[Wall]) {
        if !self.alive {
            return;
        }

        self.angle = angle;

        let (old_x, old_y) = (self.x, self.y);
        self.x += dx;
        self.y += dy;

        let bounds = self.bounds();
        if walls.iter().any(|wall| wall.rect.intersects(&bounds)) {
            self.x = old_x;
            self.y = old_y;
        }

        let half = TANK_SIZE / 2.0;
        self.x = self.x.clamp(half, ARENA_WIDTH - half);
        self.y = self.y.clamp(half, ARENA_HEIGHT - half);
    }

    /// Spawns a bullet just outside the barrel, or `None` if the tank is dead.
    pub fn shoot(&self) -> Option<Bullet> {
        if !self.alive {
            return None;
        }

        let offset = TANK_SIZE / 2.0 + BULLET_SIZE;
        Some(Bullet::new(
            self.x + self.angle.cos() * offset,
            self.y + self.angle.sin() * offset,
            self.angle,
            self.id,
        ))
    }

    pub fn respawn(&mut self) {
        self.x = self.spawn_x;
        self.y = self.spawn_y;
        self.angle = 0.0;
        self.alive = true;
        self.spawn_time = INVULNERABILITY_SECS;
    }

    /// Kills the tank and puts it straight back at its spawn point.
    pub fn take_damage(&mut self) {
        self.alive = false;
        self.respawn();
    }

    pub fn tick_invulnerability(&mut self, dt: f32) {
        self.spawn_time = (self.spawn_time - dt).max(0.0);
    }
}

impl Bullet {
    /// Moves the bullet one fixed step along its heading
    pub fn step(&mut self) {
        self.x += self.angle.cos() * BULLET_SPEED;
        self.y += self.angle.sin() * BULLET_SPEED;
    }
}

impl World {
    /// Advances the world by one tick of `dt` seconds.
    ///
    /// Returns what happened to every bullet removed during the tick.
    pub fn advance(&mut self, dt: f32) -> Vec<BulletOutcome> {
        if self.game_started && !self.game_ended {
            self.game_time -= dt;
            if self.game_time <= 0.0 {
                self.game_time = 0.0;
                self.game_ended = true;
            }
        }

        for tank in self.tanks.values_mut().filter(|tank| tank.alive) {
            tank.tick_invulnerability(dt);
        }

        self.update_bullets()
    }

    /// Steps every bullet and drops the ones that hit something.
    ///
    /// Each bullet resolves against at most one obstacle per tick, checked in
    /// the order: arena bounds, walls, tanks by ascending id.
    pub fn update_bullets(&mut self) -> Vec<BulletOutcome> {
        let mut bullets = std::mem::take(&mut self.bullets);
        let mut resolved = Vec::new();

        bullets.retain_mut(|bullet| {
            bullet.step();
            let outcome = self.resolve_bullet(bullet);
            if outcome == BulletOutcome::InFlight {
                true
            } else {
                resolved.push(outcome);
                false
            }
        });

        self.bullets = bullets;
        resolved
    }

    fn resolve_bullet(&mut self, bullet: &Bullet) -> BulletOutcome {
        if bullet.is_out_of_bounds() {
            return BulletOutcome::OutOfBounds;
        }

        let bounds = bullet.bounds();
        if self.collides_with_wall(&bounds) {
            return BulletOutcome::HitWall;
        }

        let target = self
            .tanks
            .values()
            .find(|tank| {
                tank.id != bullet.owner_id
                    && tank.alive
                    && !tank.is_invulnerable()
                    && tank.bounds().intersects(&bounds)
            })
            .map(|tank| tank.id);

        match target {
            Some(target) => {
                if let Some(owner) = self.tanks.get_mut(&bullet.owner_id) {
                    owner.kills += 1;
                }
                if let Some(tank) = self.tanks.get_mut(&target) {
                    tank.take_damage();
                }
                BulletOutcome::HitTank { target }
            }
            None => BulletOutcome::InFlight,
        }
    }

    /// Applies a move to tank `id`. Returns false when no such tank exists.
    pub fn move_tank(&mut self, id: u32, dx: f32, dy: f32, angle: f32) -> bool {
        let Self { tanks, walls, .. } = self;
        match tanks.get_mut(&id) {
            Some(tank) => {
                tank.apply_move(dx, dy, angle, walls);
                true
            }
            None => false,
        }
    }

    /// Fires from tank `id`, adding the bullet to the world if one was produced.
    pub fn fire(&mut self, id: u32) -> Option<&Bullet> {
        let bullet = self.tanks.get(&id)?.shoot()?;
        self.bullets.push(bullet);
        self.bullets.last()
    }

    pub fn start_match(&mut self) {
        self.game_started = true;
        self.game_ended = false;
        self.game_time = MATCH_DURATION_SECS;
    }

    /// Returns every tank to its spawn point and clears scores, bullets and the clock.
    pub fn reset_match(&mut self) {
        self.bullets.clear();

        for tank in self.tanks.values_mut() {
            tank.respawn();
            tank.kills = 0;
        }

        self.game_time = MATCH_DURATION_SECS;
        self.game_started = false;
        self.game_ended = false;
    }
}
