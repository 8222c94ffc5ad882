use thiserror::Error;

/// Failures while framing or interpreting protocol text.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The stream ended before the sentinel of the current frame arrived.
    #[error("connection closed mid-frame with {pending} bytes pending")]
    Framing { pending: usize },

    /// No sentinel within the allowed number of bytes.
    #[error("frame exceeds {limit} bytes without a sentinel")]
    FrameTooLarge { limit: usize },

    /// A recognized command arrived with fewer fields than it carries.
    #[error("malformed {command} frame: expected {expected} fields, found {found}")]
    MalformedFrame {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("unknown command tag {0:?}")]
    UnknownCommand(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
