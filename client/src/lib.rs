//! # Arena Client Library
//!
//! Thin client for the tank arena. The server is authoritative for every
//! game rule; the client keeps a copy of the world that only changes when a
//! snapshot arrives, turns player intent into messages, and presents whatever
//! it last heard.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! - TCP connect and the `init` handshake
//! - Background receive task feeding a single-slot "latest snapshot" channel
//! - Writer task for outgoing intents
//!
//! ### Game Module (`game`)
//! The local [`shared::World`] copy and the frame loop that ties the other
//! modules together.
//!
//! ### Input Module (`input`)
//! Device-independent [`input::InputIntent`] and its translation into
//! `move` / `shoot` / `restart` messages.
//!
//! ### Rendering Module (`rendering`)
//! The [`rendering::Frontend`] trait and a headless console implementation
//! that logs the scoreboard and can play as a bot.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::play;
//! use client::network::Connection;
//! use client::rendering::ConsoleFrontend;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Connection::connect("127.0.0.1:5555").await?;
//!     let mut frontend = ConsoleFrontend::new(true, 30);
//!     play(connection, &mut frontend, Duration::from_millis(16)).await;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
