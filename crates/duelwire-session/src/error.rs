//! Error types for the session layer.

use duelwire_protocol::ServerError;

use crate::SessionState;

/// Errors that end or refuse a step of the lobby lifecycle.
///
/// Every one of these is fatal for the connection: the client closes
/// and reports it rather than trying to carry on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The join reply carried the wrong handshake constant, so the
    /// server speaks a protocol this client does not.
    #[error("handshake mismatch: expected {expected}, got {actual}")]
    HandshakeMismatch { expected: u32, actual: u32 },

    /// The server seated us as a spectator (position is 7 or more).
    #[error("seated as spectator (position {0})")]
    Spectator(u8),

    /// A lobby message arrived in a state where it makes no sense.
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    /// The server refused something and said why.
    #[error("server error: {0}")]
    Server(ServerError),
}
