//! Server network layer: TCP accept loop, per-connection tasks, tick and broadcast loops

use crate::client_manager::{Client, ClientManager, Frame, OUTBOUND_QUEUE_CAPACITY};
use crate::game::GameState;
use log::{debug, error, info, warn};
use shared::protocol::{encode_frame, FrameReader};
use shared::{ClientMessage, ServerMessage, BROADCAST_INTERVAL_MS, TICK_INTERVAL_MS};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// The one lock around all world state
pub type SharedGame = Arc<Mutex<GameState>>;
pub type SharedClients = Arc<RwLock<ClientManager>>;

/// How often the tick task logs a status line
const STATUS_EVERY_TICKS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_interval: Duration,
    pub broadcast_interval: Duration,
    pub max_clients: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            broadcast_interval: Duration::from_millis(BROADCAST_INTERVAL_MS),
            max_clients: 8,
        }
    }
}

/// Aborts the wrapped background tasks when the server goes away
struct TaskSet(Vec<JoinHandle<()>>);

impl Drop for TaskSet {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Authoritative game server
pub struct Server {
    listener: TcpListener,
    game: SharedGame,
    clients: SharedClients,
    config: ServerConfig,
}

impl Server {
    /// Binds the listener. Failure here is fatal for the process.
    pub async fn bind(addr: &str, config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            game: Arc::new(Mutex::new(GameState::new())),
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_clients))),
            config,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the shared game state
    pub fn game(&self) -> SharedGame {
        Arc::clone(&self.game)
    }

    /// Runs the tick and broadcast loops and accepts connections until the
    /// returned future is dropped.
    pub async fn run(self) {
        let _tasks = TaskSet(vec![
            spawn_tick_task(Arc::clone(&self.game), self.config.tick_interval),
            spawn_broadcast_task(
                Arc::clone(&self.game),
                Arc::clone(&self.clients),
                self.config.broadcast_interval,
            ),
        ]);

        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    admit(stream, addr, &self.game, &self.clients).await;
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Admits a new connection: allocates its tank, queues the init frame and
/// starts its reader and writer tasks.
async fn admit(stream: TcpStream, addr: SocketAddr, game: &SharedGame, clients: &SharedClients) {
    if clients.read().await.is_full() {
        warn!("Rejecting {}: server full", addr);
        return;
    }

    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
    }

    let (tank_id, snapshot) = game.lock().await.join();

    let init = match encode_frame(&ServerMessage::Init {
        tank_id,
        state: snapshot,
    }) {
        Ok(bytes) => Frame::from(bytes),
        Err(e) => {
            error!("Failed to encode init frame for tank {}: {}", tank_id, e);
            game.lock().await.leave(tank_id);
            return;
        }
    };

    // The init frame is queued before the client is visible to the
    // broadcast task, so it is always the first frame on the wire.
    let (sender, receiver) = mpsc::channel::<Frame>(OUTBOUND_QUEUE_CAPACITY);
    let client = Client::new(tank_id, addr, sender);
    client.send(init);
    clients.write().await.add_client(client);

    let (read_half, write_half) = stream.into_split();

    tokio::spawn(write_loop(
        tank_id,
        write_half,
        receiver,
        Arc::clone(game),
        Arc::clone(clients),
    ));
    tokio::spawn(read_loop(
        tank_id,
        read_half,
        Arc::clone(game),
        Arc::clone(clients),
    ));
}

/// Drains one connection's queue into its socket
async fn write_loop(
    tank_id: u32,
    mut socket: OwnedWriteHalf,
    mut receiver: mpsc::Receiver<Frame>,
    game: SharedGame,
    clients: SharedClients,
) {
    while let Some(frame) = receiver.recv().await {
        if let Err(e) = socket.write_all(&frame).await {
            warn!("Failed to send to tank {}: {}", tank_id, e);
            disconnect(tank_id, &game, &clients).await;
            break;
        }
    }

    let _ = socket.shutdown().await;
}

/// Decodes and dispatches one connection's inbound frames until it closes
async fn read_loop(tank_id: u32, socket: OwnedReadHalf, game: SharedGame, clients: SharedClients) {
    let mut reader = FrameReader::new(socket);

    loop {
        match reader.next_frame::<ClientMessage>().await {
            Ok(Some(Ok(message))) => {
                game.lock().await.handle_message(tank_id, message);
            }
            Ok(Some(Err(e))) => {
                warn!("Skipping frame from tank {}: {}", tank_id, e);
            }
            Ok(None) => {
                debug!("Tank {} closed the connection", tank_id);
                break;
            }
            Err(e) => {
                warn!("Error reading from tank {}: {}", tank_id, e);
                break;
            }
        }
    }

    disconnect(tank_id, &game, &clients).await;
}

/// Deregisters a connection and removes its tank. Idempotent.
async fn disconnect(tank_id: u32, game: &SharedGame, clients: &SharedClients) {
    let deregistered = clients.write().await.remove_client(&tank_id);
    let removed = game.lock().await.leave(tank_id);

    if deregistered || removed {
        info!("Tank {} left the arena", tank_id);
    }
}

/// Advances the simulation at a fixed cadence with the measured delta time
fn spawn_tick_task(game: SharedGame, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        timer.tick().await;
        let mut last_update = Instant::now();

        loop {
            timer.tick().await;

            let now = Instant::now();
            let delta_time = now.duration_since(last_update).as_secs_f32();
            last_update = now;

            if delta_time > period.as_secs_f32() * 3.0 {
                warn!("Large delta time detected ({:.3}s)", delta_time);
            }

            let mut state = game.lock().await;
            state.update(delta_time);

            if state.tick % STATUS_EVERY_TICKS == 0 {
                debug!(
                    "Tick {}: {} tanks, {} bullets, {:.1}s left",
                    state.tick,
                    state.tank_count(),
                    state.world.bullets.len(),
                    state.world.time_remaining()
                );
            }
        }
    })
}

/// Sends the full snapshot to every connection at a fixed cadence
fn spawn_broadcast_task(game: SharedGame, clients: SharedClients, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;

            if clients.read().await.is_empty() {
                continue;
            }

            let encoded = {
                let state = game.lock().await;
                encode_frame(&ServerMessage::State {
                    data: state.snapshot(),
                })
            };

            let frame = match encoded {
                Ok(bytes) => Frame::from(bytes),
                Err(e) => {
                    error!("Failed to encode state frame: {}", e);
                    continue;
                }
            };

            let failed = clients.read().await.broadcast(&frame);
            for tank_id in failed {
                disconnect(tank_id, &game, &clients).await;
            }
        }
    })
}
