//! Arena entities and the world aggregate shared by server and client
//!
//! The server owns the authoritative [`World`] and periodically captures a
//! [`Snapshot`] of it. Clients keep their own `World` and merge incoming
//! snapshots with [`World::apply_snapshot`]. Walls never travel over the wire;
//! both sides build the same maze in [`World::new`].

use crate::geometry::Rect;
use crate::{
    ARENA_HEIGHT, ARENA_WIDTH, BULLET_SIZE, INVULNERABILITY_SECS, MATCH_DURATION_SECS,
    SPAWN_POINTS, TANK_COLORS, TANK_SIZE, WALL_THICKNESS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static maze segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub rect: Rect,
}

impl Wall {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
        }
    }
}

/// Builds the fixed arena layout: four outer walls and the inner maze
pub fn maze_walls() -> Vec<Wall> {
    let t = WALL_THICKNESS;
    vec![
        Wall::new(0.0, 0.0, ARENA_WIDTH, t),
        Wall::new(0.0, 0.0, t, ARENA_HEIGHT),
        Wall::new(0.0, ARENA_HEIGHT - t, ARENA_WIDTH, t),
        Wall::new(ARENA_WIDTH - t, 0.0, t, ARENA_HEIGHT),
        Wall::new(200.0, 100.0, t, 150.0),
        Wall::new(400.0, 200.0, 150.0, t),
        Wall::new(600.0, 150.0, t, 200.0),
        Wall::new(150.0, 300.0, 200.0, t),
        Wall::new(450.0, 350.0, t, 150.0),
        Wall::new(250.0, 450.0, 300.0, t),
        Wall::new(100.0, 500.0, 100.0, t),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub owner_id: u32,
}

impl Bullet {
    pub fn new(x: f32, y: f32, angle: f32, owner_id: u32) -> Self {
        Self {
            x,
            y,
            angle,
            owner_id,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, BULLET_SIZE)
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.x < 0.0 || self.x > ARENA_WIDTH || self.y < 0.0 || self.y > ARENA_HEIGHT
    }
}

/// A player-controlled tank. Serialized as-is into snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub color: [u8; 3],
    pub spawn_x: f32,
    pub spawn_y: f32,
    pub alive: bool,
    #[serde(default)]
    pub kills: u32,
    /// Remaining invulnerability in seconds
    #[serde(default)]
    pub spawn_time: f32,
}

impl Tank {
    /// Creates a tank at its spawn point with full invulnerability.
    ///
    /// Spawn point and color are fixed per id: spawn points are assigned
    /// round-robin and colors alternate by id parity.
    pub fn new(id: u32) -> Self {
        let (spawn_x, spawn_y) = SPAWN_POINTS[id as usize % SPAWN_POINTS.len()];
        let color = TANK_COLORS[id as usize % TANK_COLORS.len()];

        Self {
            id,
            x: spawn_x,
            y: spawn_y,
            angle: 0.0,
            color,
            spawn_x,
            spawn_y,
            alive: true,
            kills: 0,
            spawn_time: INVULNERABILITY_SECS,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, TANK_SIZE)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.spawn_time > 0.0
    }
}

/// Pure data copy of the dynamic part of a [`World`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tanks: BTreeMap<u32, Tank>,
    #[serde(default)]
    pub bullets: Vec<Bullet>,
    pub game_time: f32,
    pub game_started: bool,
    pub game_ended: bool,
}

/// Walls, tanks, bullets and the match clock
#[derive(Debug, Clone)]
pub struct World {
    pub walls: Vec<Wall>,
    pub tanks: BTreeMap<u32, Tank>,
    pub bullets: Vec<Bullet>,
    /// Seconds left in the match
    pub game_time: f32,
    pub game_started: bool,
    pub game_ended: bool,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            walls: maze_walls(),
            tanks: BTreeMap::new(),
            bullets: Vec::new(),
            game_time: MATCH_DURATION_SECS,
            game_started: false,
            game_ended: false,
        }
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut world = Self::new();
        world.apply_snapshot(snapshot);
        world
    }

    /// Inserts a fresh tank for `id`, replacing any tank with the same id.
    pub fn add_tank(&mut self, id: u32) -> &Tank {
        self.tanks.insert(id, Tank::new(id));
        &self.tanks[&id]
    }

    pub fn remove_tank(&mut self, id: u32) -> bool {
        self.tanks.remove(&id).is_some()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tanks: self.tanks.clone(),
            bullets: self.bullets.clone(),
            game_time: self.game_time,
            game_started: self.game_started,
            game_ended: self.game_ended,
        }
    }

    /// Merges a snapshot into this world.
    ///
    /// Known tanks have their dynamic fields overwritten, unknown tanks are
    /// created, and tanks missing from the snapshot are kept. Bullets, clock
    /// and match flags are replaced wholesale.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        for (id, incoming) in &snapshot.tanks {
            match self.tanks.get_mut(id) {
                Some(tank) => {
                    tank.x = incoming.x;
                    tank.y = incoming.y;
                    tank.angle = incoming.angle;
                    tank.alive = incoming.alive;
                    tank.kills = incoming.kills;
                    tank.spawn_time = incoming.spawn_time;
                }
                None => {
                    self.tanks.insert(*id, incoming.clone());
                }
            }
        }

        self.bullets = snapshot.bullets.clone();
        self.game_time = snapshot.game_time;
        self.game_started = snapshot.game_started;
        self.game_ended = snapshot.game_ended;
    }

    pub fn time_remaining(&self) -> f32 {
        self.game_time.max(0.0)
    }

    /// Tanks ordered by kills, most first. Ties keep ascending id order.
    pub fn leaderboard(&self) -> Vec<&Tank> {
        let mut tanks: Vec<&Tank> = self.tanks.values().collect();
        tanks.sort_by(|a, b| b.kills.cmp(&a.kills));
        tanks
    }

    /// Leading tank, or `None` when nobody has scored (a draw)
    pub fn winner(&self) -> Option<&Tank> {
        self.leaderboard()
            .into_iter()
            .next()
            .filter(|tank| tank.kills > 0)
    }

    pub fn collides_with_wall(&self, rect: &Rect) -> bool {
        self.walls.iter().any(|wall| wall.rect.intersects(rect))
    }
}
