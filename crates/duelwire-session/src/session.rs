//! The lobby lifecycle of one connection.
//!
//! A [`Session`] knows what the client has said to the lobby so far and
//! what it should say next. It never touches the socket: each step
//! returns the packets to send, and the caller sends them in order.

use std::fmt;

use duelwire_protocol::{HostInfo, Packet, SERVER_HANDSHAKE, SPECTATOR_POSITION};
use serde::{Deserialize, Serialize};

use crate::{SessionConfig, SessionError};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the connection is in the lobby lifecycle.
///
/// ```text
/// Connecting → Joining → Lobby ⇄ Dueling
///                           ↘     ↓
///                            Finished
/// ```
///
/// - **Connecting**: socket open, nothing sent yet.
/// - **Joining**: name and join request sent, waiting for the host info.
/// - **Lobby**: seated with a deck submitted, waiting for a duel to
///   start. The client comes back here for side-decking and rematches.
/// - **Dueling**: game messages are flowing.
/// - **Finished**: the match is over or the connection is being torn
///   down. Reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Connecting,
    Joining,
    Lobby,
    Dueling,
    Finished,
}

impl SessionState {
    /// Returns `true` if moving to `target` is a legal step.
    pub fn can_transition_to(self, target: Self) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Connecting, Joining)
                | (Joining, Lobby)
                | (Lobby, Dueling)
                | (Dueling, Lobby)
                | (Connecting | Joining | Lobby | Dueling, Finished)
        )
    }

    /// Returns `true` once nothing more will be sent.
    pub fn is_finished(self) -> bool {
        self == Self::Finished
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Joining => write!(f, "Joining"),
            Self::Lobby => write!(f, "Lobby"),
            Self::Dueling => write!(f, "Dueling"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchRecord
// ---------------------------------------------------------------------------

/// How a single duel ended for this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelResult {
    Win,
    Loss,
    Draw,
}

/// Duels played and won in the current match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub played: u32,
    pub won: u32,
    /// From the host info; 1 for a single duel.
    pub best_of: u32,
}

impl MatchRecord {
    pub fn record(&mut self, result: DuelResult) {
        self.played += 1;
        if result == DuelResult::Win {
            self.won += 1;
        }
    }

    /// Returns `true` if this client took the majority of a best-of-N.
    pub fn won_match(&self) -> bool {
        2 * self.won > self.best_of
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Lobby state for one connection.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    host: Option<HostInfo>,
    record: MatchRecord,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Connecting,
            host: None,
            record: MatchRecord {
                best_of: 1,
                ..MatchRecord::default()
            },
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Room settings from the join reply.
    pub fn host(&self) -> Option<&HostInfo> {
        self.host.as_ref()
    }

    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    fn transition(&mut self, target: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(target) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        tracing::debug!(from = %self.state, to = %target, "session transition");
        self.state = target;
        Ok(())
    }

    /// The opening packets: our name, then the join request.
    pub fn handshake(&mut self) -> Result<[Packet; 2], SessionError> {
        self.transition(SessionState::Joining)?;
        Ok([
            Packet::player_info(&self.config.name),
            Packet::join_game(self.config.version, &self.config.room_info),
        ])
    }

    /// Checks the join reply and answers with the deck.
    ///
    /// # Errors
    /// `HandshakeMismatch` if the server's handshake constant is wrong.
    /// The session is then finished and no deck must be sent.
    pub fn on_join_ack(&mut self, host: HostInfo) -> Result<Packet, SessionError> {
        if host.handshake != SERVER_HANDSHAKE {
            self.finish();
            return Err(SessionError::HandshakeMismatch {
                expected: SERVER_HANDSHAKE,
                actual: host.handshake,
            });
        }
        self.transition(SessionState::Lobby)?;
        tracing::info!(
            lflist = host.lflist,
            start_lp = host.start_lp,
            best_of = host.best_of,
            "joined game"
        );
        self.record.best_of = host.best_of.max(1);
        self.host = Some(host);
        Ok(self.deck_packet())
    }

    /// Answers a seat assignment with `HS_READY`.
    ///
    /// The low nibble is the seat, the high nibble flags the host.
    ///
    /// # Errors
    /// `Spectator` when the seat is a watcher's; the caller should
    /// close the connection.
    pub fn on_type_change(&mut self, kind: u8) -> Result<Packet, SessionError> {
        let position = kind & 0x0f;
        if position >= SPECTATOR_POSITION {
            self.finish();
            return Err(SessionError::Spectator(position));
        }
        tracing::debug!(position, is_host = kind >> 4 != 0, "seated");
        Ok(Packet::ready())
    }

    /// The server started a duel. Repeated starts inside a match are
    /// accepted as is.
    pub fn on_duel_start(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Dueling {
            return Ok(());
        }
        self.transition(SessionState::Dueling)
    }

    /// Side-decking between duels: back to the lobby, deck again.
    pub fn on_change_side(&mut self) -> Result<Packet, SessionError> {
        if self.state == SessionState::Dueling {
            self.transition(SessionState::Lobby)?;
        }
        Ok(self.deck_packet())
    }

    pub fn on_duel_result(&mut self, result: DuelResult) {
        self.record.record(result);
        tracing::info!(
            ?result,
            played = self.record.played,
            won = self.record.won,
            "duel finished"
        );
    }

    /// Answers a rematch offer. Accepting starts a fresh match record;
    /// declining keeps the finished one.
    pub fn on_rematch(&mut self, accept: bool) -> Result<Packet, SessionError> {
        if accept {
            if self.state == SessionState::Dueling {
                self.transition(SessionState::Lobby)?;
            }
            self.record = MatchRecord {
                best_of: self.record.best_of,
                ..MatchRecord::default()
            };
        }
        Ok(Packet::rematch_response(accept))
    }

    /// The match is over or the connection is going away.
    pub fn finish(&mut self) {
        if !self.state.is_finished() {
            tracing::debug!(from = %self.state, "session finished");
            self.state = SessionState::Finished;
        }
    }

    pub fn deck_packet(&self) -> Packet {
        let deck = &self.config.deck;
        Packet::update_deck(&deck.main, &deck.extra, &deck.side)
    }
}
