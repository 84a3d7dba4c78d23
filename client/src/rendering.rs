//! Presentation of the client view and per-frame intent sources

use crate::game::ClientGame;
use crate::input::InputIntent;
use log::info;
use shared::{Tank, World};
use std::fmt::Write;
use std::time::{Duration, Instant};

/// A place that shows the arena and produces player intent
///
/// A windowed frontend would sample keyboard and mouse here; the console
/// frontend below either idles or plays as a simple bot.
pub trait Frontend {
    /// Collects this frame's intent
    fn poll_input(&mut self, game: &ClientGame) -> InputIntent;

    /// Presents the current view
    fn render(&mut self, game: &ClientGame);
}

/// Headless frontend that reports the match through the log
pub struct ConsoleFrontend {
    bot: bool,
    fire_every: u64,
    frame: u64,
    report_interval: Duration,
    last_report: Option<Instant>,
    game_over_reported: bool,
}

impl ConsoleFrontend {
    pub fn new(bot: bool, fire_every: u64) -> Self {
        Self {
            bot,
            fire_every: fire_every.max(1),
            frame: 0,
            report_interval: Duration::from_secs(1),
            last_report: None,
            game_over_reported: false,
        }
    }

    fn report_due(&mut self) -> bool {
        let now = Instant::now();
        match self.last_report {
            Some(last) if now.duration_since(last) < self.report_interval => false,
            _ => {
                self.last_report = Some(now);
                true
            }
        }
    }
}

impl Frontend for ConsoleFrontend {
    fn poll_input(&mut self, game: &ClientGame) -> InputIntent {
        self.frame += 1;

        if !self.bot {
            return InputIntent::default();
        }

        let Some(target) = nearest_enemy(&game.world, game.tank_id) else {
            return InputIntent::default();
        };

        InputIntent {
            aim: Some((target.x, target.y)),
            fire: self.frame % self.fire_every == 0,
            ..Default::default()
        }
    }

    fn render(&mut self, game: &ClientGame) {
        if game.is_ended() {
            if !self.game_over_reported {
                info!("{}", game_over_summary(&game.world, game.tank_id));
                self.game_over_reported = true;
            }
            return;
        }
        self.game_over_reported = false;

        if self.report_due() {
            info!("{}", scoreboard_line(&game.world, game.tank_id));
        }
    }
}

/// Closest living tank that is not `own_id`
pub fn nearest_enemy(world: &World, own_id: u32) -> Option<&Tank> {
    let own = world.tanks.get(&own_id)?;

    world
        .tanks
        .values()
        .filter(|tank| tank.id != own_id && tank.alive)
        .min_by(|a, b| {
            let da = (a.x - own.x).powi(2) + (a.y - own.y).powi(2);
            let db = (b.x - own.x).powi(2) + (b.y - own.y).powi(2);
            da.total_cmp(&db)
        })
}

/// One-line clock and score summary
pub fn scoreboard_line(world: &World, own_id: u32) -> String {
    let mut line = if world.game_started {
        format!("Time: {:.0}s", world.time_remaining())
    } else {
        String::from("Waiting for opponent")
    };

    for tank in world.tanks.values() {
        let marker = if tank.id == own_id { "*" } else { "" };
        let _ = write!(line, " | tank {}{}: {} kills", tank.id, marker, tank.kills);
    }

    line
}

/// Final standings shown once when the match ends
pub fn game_over_summary(world: &World, own_id: u32) -> String {
    let mut summary = String::from("GAME OVER");

    for (place, tank) in world.leaderboard().iter().enumerate() {
        let marker = if tank.id == own_id { " (you)" } else { "" };
        let _ = write!(
            summary,
            " | {}. tank {}{}: {} kills",
            place + 1,
            tank.id,
            marker,
            tank.kills
        );
    }

    match world.winner() {
        Some(tank) if tank.id == own_id => summary.push_str(" | You win!"),
        Some(tank) => {
            let _ = write!(summary, " | Tank {} wins", tank.id);
        }
        None => summary.push_str(" | Draw"),
    }

    summary
}
