//! Unified error type for the duelwire client.

use duelwire_duel::DuelError;
use duelwire_protocol::ProtocolError;
use duelwire_session::SessionError;
use duelwire_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each wrapped variant generates the `From`
/// impl, so `?` converts sub-crate errors on the way up.
#[derive(Debug, thiserror::Error)]
pub enum DuelwireError {
    /// The socket failed or went away.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A payload could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The lobby refused us or we refused the lobby.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The mirror could not follow an event.
    #[error(transparent)]
    Duel(#[from] DuelError),

    /// Our own replies no longer match what the server expects.
    ///
    /// Carries the last frame bodies in each direction so the mismatch
    /// can be diagnosed after the connection is gone.
    #[error("protocol desync: {reason}")]
    Desync {
        reason: String,
        last_sent: Vec<u8>,
        last_received: Vec<u8>,
    },
}

impl DuelwireError {
    /// A desync whose frames are attached later by the client loop.
    pub(crate) fn desync(reason: impl Into<String>) -> Self {
        Self::Desync {
            reason: reason.into(),
            last_sent: Vec::new(),
            last_received: Vec::new(),
        }
    }

    pub fn is_desync(&self) -> bool {
        matches!(self, Self::Desync { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelwire_protocol::{Location, Player};

    #[test]
    fn test_from_transport_error() {
        let err: DuelwireError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, DuelwireError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: DuelwireError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, DuelwireError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: DuelwireError = SessionError::Spectator(7).into();
        assert!(matches!(err, DuelwireError::Session(_)));
    }

    #[test]
    fn test_from_duel_error() {
        let err: DuelwireError = DuelError::CardNotFound {
            player: Player::Me,
            location: Location::HAND,
            index: 3,
        }
        .into();
        assert!(matches!(err, DuelwireError::Duel(_)));
    }

    #[test]
    fn test_desync_message() {
        let err = DuelwireError::desync("server asked for a retry");
        assert!(err.is_desync());
        assert_eq!(err.to_string(), "protocol desync: server asked for a retry");
    }
}
