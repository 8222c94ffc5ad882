use crate::client::ConnectionId;
use shared::ProtocolError;
use thiserror::Error;

/// Failures inside the relay. None of them outlive the connection they
/// happened on.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A command arrived for a connection without a registry entry.
    #[error("no player registered for connection {0}")]
    RegistryMiss(ConnectionId),

    /// The connection's writer is gone.
    #[error("failed to queue message for connection {0}")]
    SendFailure(ConnectionId),
}
