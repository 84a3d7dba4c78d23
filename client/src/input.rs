//! Translation of per-frame player intent into wire messages

use crate::game::ClientGame;
use shared::{ClientMessage, ARENA_HEIGHT, ARENA_WIDTH, TANK_SPEED};

/// Aim changes smaller than this are not worth a message while standing still
const AIM_THRESHOLD: f32 = 0.05;

/// What the player wants to do this frame, independent of any input device
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Point to aim the barrel at, in arena coordinates
    pub aim: Option<(f32, f32)>,
    pub fire: bool,
    pub restart: bool,
}

impl InputIntent {
    /// Requested displacement for this frame
    ///
    /// When both keys of an axis are held, down and right win.
    pub fn displacement(&self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;

        if self.up {
            dy = -TANK_SPEED;
        }
        if self.down {
            dy = TANK_SPEED;
        }
        if self.left {
            dx = -TANK_SPEED;
        }
        if self.right {
            dx = TANK_SPEED;
        }

        (dx, dy)
    }

    /// Builds the messages to send for this frame
    pub fn to_messages(&self, game: &ClientGame) -> Vec<ClientMessage> {
        let mut messages = Vec::new();
        let ended = game.is_ended();
        let tank = game.local_tank();

        if !ended {
            let (dx, dy) = self.displacement();
            let (origin_x, origin_y) = tank
                .map(|tank| (tank.x, tank.y))
                .unwrap_or((ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0));
            let current = tank.map(|tank| tank.angle).unwrap_or(0.0);

            let angle = self
                .aim
                .map(|(x, y)| (y - origin_y).atan2(x - origin_x))
                .unwrap_or(current);

            let moving = dx != 0.0 || dy != 0.0;
            let turning = tank.is_some() && (angle - current).abs() > AIM_THRESHOLD;

            if moving || turning {
                messages.push(ClientMessage::Move {
                    dx,
                    dy,
                    angle: Some(angle),
                });
            }

            if self.fire {
                messages.push(ClientMessage::Shoot);
            }
        }

        if self.restart {
            messages.push(ClientMessage::Restart);
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{World, SPAWN_POINTS};
    use std::f32::consts::FRAC_PI_2;

    fn game() -> ClientGame {
        let mut world = World::new();
        world.add_tank(0);
        world.add_tank(1);
        world.start_match();
        ClientGame::new(0, &world.snapshot())
    }

    fn move_parts(message: &ClientMessage) -> (f32, f32, f32) {
        match message {
            ClientMessage::Move {
                dx,
                dy,
                angle: Some(angle),
            } => (*dx, *dy, *angle),
            other => panic!("expected move with angle, got {:?}", other),
        }
    }

    #[test]
    fn test_idle_sends_nothing() {
        assert!(InputIntent::default().to_messages(&game()).is_empty());
    }

    #[test]
    fn test_displacement_later_key_wins() {
        let intent = InputIntent {
            up: true,
            down: true,
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(intent.displacement(), (TANK_SPEED, TANK_SPEED));

        let intent = InputIntent {
            up: true,
            left: true,
            ..Default::default()
        };
        assert_eq!(intent.displacement(), (-TANK_SPEED, -TANK_SPEED));
    }

    #[test]
    fn test_move_keeps_angle_without_aim() {
        let mut game = game();
        game.world.tanks.get_mut(&0).unwrap().angle = 1.0;

        let intent = InputIntent {
            right: true,
            ..Default::default()
        };
        let messages = intent.to_messages(&game);

        assert_eq!(messages.len(), 1);
        assert_eq!(move_parts(&messages[0]), (TANK_SPEED, 0.0, 1.0));
    }

    #[test]
    fn test_aim_from_tank_position() {
        let game = game();
        let (x, y) = SPAWN_POINTS[0];

        let intent = InputIntent {
            aim: Some((x, y + 100.0)),
            ..Default::default()
        };
        let messages = intent.to_messages(&game);

        assert_eq!(messages.len(), 1);
        let (dx, dy, angle) = move_parts(&messages[0]);
        assert_eq!((dx, dy), (0.0, 0.0));
        assert_approx_eq!(angle, FRAC_PI_2);
    }

    #[test]
    fn test_small_aim_change_while_stationary_is_dropped() {
        let game = game();
        let (x, y) = SPAWN_POINTS[0];

        // atan2(1, 100) is about 0.01 rad
        let intent = InputIntent {
            aim: Some((x + 100.0, y + 1.0)),
            ..Default::default()
        };
        assert!(intent.to_messages(&game).is_empty());
    }

    #[test]
    fn test_unknown_tank_aims_from_arena_centre() {
        let mut game = game();
        game.world.tanks.remove(&0);

        let moving = InputIntent {
            down: true,
            aim: Some((ARENA_WIDTH / 2.0 + 10.0, ARENA_HEIGHT / 2.0)),
            ..Default::default()
        };
        let messages = moving.to_messages(&game);
        assert_eq!(messages.len(), 1);
        let (_, dy, angle) = move_parts(&messages[0]);
        assert_eq!(dy, TANK_SPEED);
        assert_approx_eq!(angle, 0.0);

        let turning_only = InputIntent {
            aim: Some((0.0, 0.0)),
            ..Default::default()
        };
        assert!(turning_only.to_messages(&game).is_empty());
    }

    #[test]
    fn test_fire_and_restart() {
        let intent = InputIntent {
            fire: true,
            restart: true,
            ..Default::default()
        };
        assert_eq!(
            intent.to_messages(&game()),
            vec![ClientMessage::Shoot, ClientMessage::Restart]
        );
    }

    #[test]
    fn test_ended_match_only_allows_restart() {
        let mut game = game();
        game.world.game_ended = true;

        let intent = InputIntent {
            up: true,
            aim: Some((700.0, 500.0)),
            fire: true,
            ..Default::default()
        };
        assert!(intent.to_messages(&game).is_empty());

        let intent = InputIntent {
            restart: true,
            ..intent
        };
        assert_eq!(intent.to_messages(&game), vec![ClientMessage::Restart]);
    }
}
