//! Registry of live connections and their outbound frame queues
//!
//! This module tracks every connected player on the server side:
//! - Which tank id a connection is bound to
//! - The queue feeding that connection's socket writer task
//! - Capacity enforcement for new connections
//!
//! Sending never touches a socket directly. Frames are pushed into a bounded
//! per-connection channel and written out by that connection's own writer
//! task, so one slow or departed peer never stalls a broadcast. When a peer
//! stops reading and its queue fills up, new snapshots for it are dropped;
//! every snapshot is a full state, so the next one that fits supersedes them.

use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// One encoded, newline-terminated frame, shared between all recipients
pub type Frame = Arc<[u8]>;

/// Frames that may wait in one connection's queue
pub const OUTBOUND_QUEUE_CAPACITY: usize = 32;

/// A connected player
///
/// Each client holds:
/// - The tank id assigned at accept time (also used as the client id)
/// - The peer address, for logging
/// - The sending end of its writer task's queue
#[derive(Debug)]
pub struct Client {
    /// Tank id bound to this connection
    pub id: u32,
    /// Peer address of the connection
    pub addr: SocketAddr,
    /// When the connection was registered
    pub connected_at: Instant,
    sender: mpsc::Sender<Frame>,
}

impl Client {
    /// Creates a client bound to `id` whose frames go into `sender`
    pub fn new(id: u32, addr: SocketAddr, sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// Queues a frame for this client
    ///
    /// A frame that does not fit in a full queue is dropped. Returns false only
    /// when the writer task has already gone away, which means the connection
    /// is dead and should be cleaned up.
    pub fn send(&self, frame: Frame) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Queue for client {} is full, dropping frame", self.id);
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Manages all connected clients
///
/// The ClientManager owns the id → connection binding used for fan-out and
/// enforces the server's connection limit. It does not allocate ids itself;
/// ids come from the game state so that they follow tank creation.
pub struct ClientManager {
    /// Connected clients indexed by tank id
    clients: HashMap<u32, Client>,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty registry with the given capacity
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// Returns true when no further connections may be admitted
    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Registers a client for broadcasts
    ///
    /// Returns false (and drops the client) if its id is already registered.
    pub fn add_client(&mut self, client: Client) -> bool {
        if self.clients.contains_key(&client.id) {
            return false;
        }

        info!("Client {} connected from {}", client.id, client.addr);
        self.clients.insert(client.id, client);
        true
    }

    /// Removes a client from the registry
    ///
    /// Dropping the client closes its queue, which lets the writer task finish.
    /// Returns true if the client was found, false if it was already gone, so
    /// teardown paths may race without double-reporting.
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Client {} disconnected after {:.1}s",
                client.id,
                client.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    /// Queues the same frame for every client
    ///
    /// Returns the ids of clients whose queue is closed. The caller is
    /// responsible for tearing those connections down.
    pub fn broadcast(&self, frame: &Frame) -> Vec<u32> {
        self.clients
            .values()
            .filter(|client| !client.send(Arc::clone(frame)))
            .map(|client| client.id)
            .collect()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Tests cover registration, capacity, idempotent removal and fan-out to live
/// and dead queues.
#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn frame(text: &str) -> Frame {
        Arc::from(text.as_bytes())
    }

    fn client(id: u32) -> (Client, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        (Client::new(id, test_addr(), tx), rx)
    }

    #[test]
    fn test_client_creation() {
        let (client, _rx) = client(3);
        assert_eq!(client.id, 3);
        assert_eq!(client.addr, test_addr());
    }

    #[test]
    fn test_client_send() {
        let (client, mut rx) = client(1);
        assert!(client.send(frame("hello\n")));
        assert_eq!(&*rx.try_recv().unwrap(), b"hello\n");

        drop(rx);
        assert!(!client.send(frame("late\n")));
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new(5);
        assert_eq!(manager.max_clients, 5);
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
        assert!(!manager.is_full());
    }

    #[test]
    fn test_add_client() {
        let mut manager = ClientManager::new(2);
        let (c0, _rx0) = client(0);

        assert!(manager.add_client(c0));
        assert_eq!(manager.len(), 1);
        assert!(!manager.is_empty());
    }

    #[test]
    fn test_add_duplicate_client() {
        let mut manager = ClientManager::new(4);
        let (first, _rx0) = client(0);
        let (second, _rx1) = client(0);

        assert!(manager.add_client(first));
        assert!(!manager.add_client(second));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_capacity() {
        let mut manager = ClientManager::new(2);
        let (c0, _rx0) = client(0);
        let (c1, _rx1) = client(1);

        manager.add_client(c0);
        assert!(!manager.is_full());
        manager.add_client(c1);
        assert!(manager.is_full());
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new(2);
        let (c0, _rx0) = client(0);
        manager.add_client(c0);

        assert!(manager.remove_client(&0));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_remove_client_twice() {
        let mut manager = ClientManager::new(2);
        let (c0, _rx0) = client(0);
        manager.add_client(c0);

        assert!(manager.remove_client(&0));
        assert!(!manager.remove_client(&0));
        assert!(!manager.remove_client(&999));
    }

    #[test]
    fn test_remove_closes_queue() {
        let mut manager = ClientManager::new(2);
        let (c0, mut rx0) = client(0);
        manager.add_client(c0);

        manager.remove_client(&0);
        assert!(matches!(
            rx0.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_broadcast_reports_dead_clients() {
        let mut manager = ClientManager::new(4);
        let (c0, mut rx0) = client(0);
        let (c1, rx1) = client(1);
        let (c2, mut rx2) = client(2);
        manager.add_client(c0);
        manager.add_client(c1);
        manager.add_client(c2);
        drop(rx1);

        let failed = manager.broadcast(&frame("state\n"));

        assert_eq!(failed, vec![1]);
        assert_eq!(&*rx0.try_recv().unwrap(), b"state\n");
        assert_eq!(&*rx2.try_recv().unwrap(), b"state\n");
    }

    #[test]
    fn test_stalled_client_queue_stays_bounded() {
        let mut manager = ClientManager::new(2);
        let (stalled, mut rx) = client(0);
        manager.add_client(stalled);

        for i in 0..OUTBOUND_QUEUE_CAPACITY * 10 {
            let failed = manager.broadcast(&frame(&format!("state {}\n", i)));
            assert!(failed.is_empty());
        }

        let mut queued = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            queued.push(frame);
        }
        assert_eq!(queued.len(), OUTBOUND_QUEUE_CAPACITY);
        // The oldest frames are the ones kept; later ones were dropped
        assert_eq!(&*queued[0], b"state 0\n");

        // Once drained, the client receives again
        assert!(manager.broadcast(&frame("fresh\n")).is_empty());
        assert_eq!(&*rx.try_recv().unwrap(), b"fresh\n");
    }
}
