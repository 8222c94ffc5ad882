//! Handle to one live connection, shared between its own handler and every
//! broadcast that reaches it.

use crate::error::ServerError;
use log::warn;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

/// Messages a connection may have queued before it counts as stalled.
pub const OUTBOUND_QUEUE_LEN: usize = 1000;

/// Server-assigned key of a connection. Unrelated to the player's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cloneable sender side of a connection.
///
/// Outgoing text is queued on a bounded channel drained by the connection's
/// writer task. Queuing never blocks and messages reach the socket in the
/// order they were queued. A peer that stops reading fills its queue, and
/// further sends to it fail instead of growing the queue.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    outbound: mpsc::Sender<String>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Client {
    /// Creates the handle together with the receiver its writer task drains.
    pub fn new(id: ConnectionId, addr: SocketAddr) -> (Self, mpsc::Receiver<String>) {
        Self::with_queue_len(id, addr, OUTBOUND_QUEUE_LEN)
    }

    pub fn with_queue_len(
        id: ConnectionId,
        addr: SocketAddr,
        queue_len: usize,
    ) -> (Self, mpsc::Receiver<String>) {
        let (outbound, outbound_rx) = mpsc::channel(queue_len);
        let (shutdown, _) = watch::channel(false);

        let client = Self {
            id,
            addr,
            outbound,
            shutdown: Arc::new(shutdown),
        };
        (client, outbound_rx)
    }

    /// Queues raw text for this connection.
    ///
    /// Fails when the writer is gone or the queue is full.
    pub fn send(&self, message: &str) -> Result<(), ServerError> {
        self.outbound
            .try_send(message.to_string())
            .map_err(|e| {
                if let TrySendError::Full(_) = e {
                    warn!("Outbound queue of connection {} is full", self.id);
                }
                ServerError::SendFailure(self.id)
            })
    }

    /// Asks the connection's handler and writer to stop.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Receiver that resolves `changed()` once [`Client::close`] is called.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
