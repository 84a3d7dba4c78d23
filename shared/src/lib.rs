//! Types and rules shared by the arena server and its clients
//!
//! - [`geometry`]: rectangle overlap test
//! - [`world`]: walls, tanks, bullets, the world aggregate and its snapshot
//! - [`simulation`]: movement, shooting, bullet resolution, match clock
//! - [`protocol`]: message kinds and newline-delimited JSON framing

pub mod geometry;
pub mod protocol;
pub mod simulation;
pub mod world;

pub use geometry::Rect;
pub use protocol::{ClientMessage, ProtocolError, ServerMessage};
pub use simulation::BulletOutcome;
pub use world::{Bullet, Snapshot, Tank, Wall, World};

pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 600.0;
pub const WALL_THICKNESS: f32 = 20.0;

pub const TANK_SIZE: f32 = 30.0;
/// Displacement a client requests per frame while a direction is held
pub const TANK_SPEED: f32 = 3.0;
pub const BULLET_SIZE: f32 = 5.0;
/// Displacement per simulation tick
pub const BULLET_SPEED: f32 = 8.0;

pub const SPAWN_POINTS: [(f32, f32); 2] = [(50.0, 50.0), (750.0, 550.0)];
pub const TANK_COLORS: [[u8; 3]; 2] = [[255, 0, 0], [0, 0, 255]];

pub const INVULNERABILITY_SECS: f32 = 2.0;
pub const MATCH_DURATION_SECS: f32 = 60.0;
/// Number of tanks that starts a match
pub const PLAYERS_PER_MATCH: usize = 2;

pub const DEFAULT_PORT: u16 = 5555;
pub const TICK_INTERVAL_MS: u64 = 33;
pub const BROADCAST_INTERVAL_MS: u64 = 33;
