//! Client connection: init handshake, background receive task, intent writer

use log::{debug, info, warn};
use shared::protocol::{write_frame, FrameReader};
use shared::{ClientMessage, ProtocolError, ServerMessage, Snapshot};
use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to server: {0}")]
    Connect(#[source] std::io::Error),
    #[error("server closed the connection before sending init")]
    ClosedBeforeInit,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
}

/// A live session with the server
///
/// Incoming snapshots land in a single-slot `watch` channel, so a reader
/// that falls behind only ever sees the newest state. Outgoing intents are
/// queued and written by a dedicated task.
pub struct Connection {
    pub tank_id: u32,
    /// State carried by the init frame
    pub initial: Snapshot,
    updates: watch::Receiver<Option<Snapshot>>,
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    receive_task: JoinHandle<()>,
}

impl Connection {
    /// Connects and waits for the init frame.
    ///
    /// Frames that arrive before init (or fail to decode) are skipped.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await.map_err(ClientError::Connect)?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not set TCP_NODELAY: {}", e);
        }

        let (read_half, write_half) = stream.into_split();
        let mut reader = FrameReader::new(read_half);

        let (tank_id, initial) = loop {
            match reader.next_frame::<ServerMessage>().await? {
                Some(Ok(ServerMessage::Init { tank_id, state })) => break (tank_id, state),
                Some(Ok(ServerMessage::State { .. })) => {
                    debug!("Skipping state frame received before init");
                }
                Some(Err(e)) => warn!("Skipping malformed frame: {}", e),
                None => return Err(ClientError::ClosedBeforeInit),
            }
        };

        info!("Connected as tank {}", tank_id);

        let (update_tx, updates) = watch::channel(None);
        let receive_task = tokio::spawn(receive_loop(reader, update_tx));

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(send_loop(write_half, outgoing_rx));

        Ok(Connection {
            tank_id,
            initial,
            updates,
            outgoing,
            receive_task,
        })
    }

    /// Takes the newest snapshot if one arrived since the last call.
    /// Still yields the final snapshot after the server has gone away.
    pub fn latest_snapshot(&mut self) -> Option<Snapshot> {
        let current = self.updates.borrow_and_update();
        if current.has_changed() {
            (*current).clone()
        } else {
            None
        }
    }

    /// Waits for the next snapshot. Returns `None` once the server is gone.
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.updates.changed().await.ok()?;
        self.updates.borrow_and_update().clone()
    }

    /// False once the receive task has stopped
    pub fn is_connected(&self) -> bool {
        self.updates.has_changed().is_ok()
    }

    /// Queues an intent. Returns false when the writer has shut down.
    pub fn send(&self, message: ClientMessage) -> bool {
        self.outgoing.send(message).is_ok()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.receive_task.abort();
    }
}

async fn receive_loop(
    mut reader: FrameReader<OwnedReadHalf>,
    updates: watch::Sender<Option<Snapshot>>,
) {
    loop {
        match reader.next_frame::<ServerMessage>().await {
            Ok(Some(Ok(ServerMessage::State { data }))) => {
                updates.send_replace(Some(data));
            }
            Ok(Some(Ok(ServerMessage::Init { tank_id, .. }))) => {
                warn!("Ignoring unexpected init frame for tank {}", tank_id);
            }
            Ok(Some(Err(e))) => warn!("Skipping malformed frame: {}", e),
            Ok(None) => {
                warn!("Server closed the connection");
                break;
            }
            Err(e) => {
                warn!("Lost connection to server: {}", e);
                break;
            }
        }
    }
}

async fn send_loop(mut socket: OwnedWriteHalf, mut outgoing: mpsc::UnboundedReceiver<ClientMessage>) {
    while let Some(message) = outgoing.recv().await {
        if let Err(e) = write_frame(&mut socket, &message).await {
            warn!("Failed to send {:?}: {}", message, e);
            break;
        }
    }
}
