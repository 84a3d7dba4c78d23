//! Client-side view of the arena and the per-frame session loop

use crate::network::Connection;
use crate::rendering::Frontend;
use log::{info, warn};
use shared::{Snapshot, Tank, World};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// The local copy of the world, only ever changed by server snapshots
#[derive(Debug, Clone)]
pub struct ClientGame {
    pub tank_id: u32,
    pub world: World,
}

impl ClientGame {
    /// Builds the view from the init frame's state
    pub fn new(tank_id: u32, initial: &Snapshot) -> Self {
        Self {
            tank_id,
            world: World::from_snapshot(initial),
        }
    }

    pub fn apply(&mut self, snapshot: &Snapshot) {
        self.world.apply_snapshot(snapshot);
    }

    /// This client's own tank, if the server has reported it
    pub fn local_tank(&self) -> Option<&Tank> {
        self.world.tanks.get(&self.tank_id)
    }

    pub fn is_ended(&self) -> bool {
        self.world.game_ended
    }
}

/// Runs the frame loop until the server goes away.
///
/// Each frame applies at most one pending snapshot, asks the frontend for an
/// intent, sends the resulting messages and renders. Returns the final view.
pub async fn play<F: Frontend>(
    mut connection: Connection,
    frontend: &mut F,
    frame_interval: Duration,
) -> ClientGame {
    let mut game = ClientGame::new(connection.tank_id, &connection.initial);

    let mut timer = interval(frame_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        timer.tick().await;

        if let Some(snapshot) = connection.latest_snapshot() {
            game.apply(&snapshot);
        }

        if !connection.is_connected() {
            warn!("Disconnected from server");
            break;
        }

        let intent = frontend.poll_input(&game);
        let delivered = intent
            .to_messages(&game)
            .into_iter()
            .all(|message| connection.send(message));
        if !delivered {
            warn!("Could not send to server");
            break;
        }

        frontend.render(&game);
    }

    frontend.render(&game);
    info!("Session ended");
    game
}
