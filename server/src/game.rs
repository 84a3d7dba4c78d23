//! Authoritative game state: the world plus tank id allocation and intent dispatch

use log::{debug, info};
use shared::{BulletOutcome, ClientMessage, Snapshot, World, PLAYERS_PER_MATCH};

#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u64,
    pub world: World,
    next_tank_id: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            world: World::new(),
            next_tank_id: 0,
        }
    }

    /// Admits a new player.
    ///
    /// Allocates the next tank id (ids are never reused), spawns the tank and
    /// starts the match when this tank completes the lineup. Returns the id and
    /// the snapshot for the player's init frame.
    pub fn join(&mut self) -> (u32, Snapshot) {
        let tank_id = self.next_tank_id;
        self.next_tank_id += 1;

        let tank = self.world.add_tank(tank_id);
        info!(
            "Added tank {} at ({}, {})",
            tank_id, tank.spawn_x, tank.spawn_y
        );

        if self.world.tanks.len() == PLAYERS_PER_MATCH && !self.world.game_started {
            self.world.start_match();
            info!(
                "Match started, {} seconds on the clock",
                self.world.game_time
            );
        }

        (tank_id, self.world.snapshot())
    }

    /// Removes a departed player's tank. Safe to call more than once.
    pub fn leave(&mut self, tank_id: u32) -> bool {
        let removed = self.world.remove_tank(tank_id);
        if removed {
            info!("Removed tank {}", tank_id);
        }
        removed
    }

    /// Applies one client intent for `tank_id`.
    ///
    /// Intents for tanks that no longer exist are dropped. While the match is
    /// over, `move` and `shoot` are ignored; `restart` is always honoured.
    /// Returns whether the intent changed anything.
    pub fn handle_message(&mut self, tank_id: u32, message: ClientMessage) -> bool {
        let Some(tank) = self.world.tanks.get(&tank_id) else {
            debug!("Ignoring {:?} for departed tank {}", message, tank_id);
            return false;
        };

        match message {
            ClientMessage::Move { dx, dy, angle } => {
                if self.world.game_ended {
                    return false;
                }
                let angle = angle.unwrap_or(tank.angle);
                self.world.move_tank(tank_id, dx, dy, angle)
            }
            ClientMessage::Shoot => {
                if self.world.game_ended {
                    return false;
                }
                self.world.fire(tank_id).is_some()
            }
            ClientMessage::Restart => {
                info!("Tank {} requested a restart", tank_id);
                self.restart();
                true
            }
        }
    }

    /// Resets the match and starts it again straight away if enough players remain.
    pub fn restart(&mut self) {
        self.world.reset_match();
        if self.world.tanks.len() >= PLAYERS_PER_MATCH {
            self.world.start_match();
            info!("Match restarted");
        }
    }

    /// Advances the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let was_ended = self.world.game_ended;
        let outcomes = self.world.advance(dt);
        self.tick += 1;

        for outcome in outcomes {
            if let BulletOutcome::HitTank { target } = outcome {
                debug!("Tank {} hit on tick {}", target, self.tick);
            }
        }

        if self.world.game_ended && !was_ended {
            let scores: Vec<(u32, u32)> = self
                .world
                .leaderboard()
                .iter()
                .map(|tank| (tank.id, tank.kills))
                .collect();
            info!("Match over, scores (tank, kills): {:?}", scores);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.world.snapshot()
    }

    pub fn tank_count(&self) -> usize {
        self.world.tanks.len()
    }
}
