//! # Arena Server Library
//!
//! Authoritative server for the two-player tank arena. It owns the only real
//! copy of the world, applies player intents as they arrive, advances the
//! simulation on a fixed tick and pushes full snapshots to every connection.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Movement, wall collision, bullets, hits, respawn and the match clock all
//! run here. Clients never simulate; they render whatever the last snapshot
//! said.
//!
//! ### Connection Lifecycle
//! - Accept a TCP connection and spawn a tank for it
//! - Send the `init` frame with the assigned tank id
//! - Decode `move` / `shoot` / `restart` frames and apply them immediately
//! - Remove the tank as soon as the connection ends
//!
//! ### State Broadcasting
//! A separate task serializes the world at a fixed cadence and queues the
//! same frame for every connection. Each connection drains its own queue, so
//! a stalled peer does not hold up the others.
//!
//! ## Concurrency
//!
//! All world state lives behind a single `tokio::sync::Mutex`. Reader tasks,
//! the tick task and the broadcast task each take it for one short critical
//! section. The connection registry has its own `RwLock`; the two locks are
//! never held at the same time.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Registry of live connections and their outbound frame queues.
//!
//! ### Game Module (`game`)
//! Tank id allocation, match auto-start and intent dispatch on top of
//! [`shared::World`].
//!
//! ### Network Module (`network`)
//! Listener, per-connection reader/writer tasks, the tick loop and the
//! broadcast loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("0.0.0.0:5555", ServerConfig::default()).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
