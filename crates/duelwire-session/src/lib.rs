//! Lobby session management for duelwire.
//!
//! This crate handles everything the client says outside of a duel:
//!
//! 1. **Joining**: name, join request and the handshake check
//!    ([`Session::handshake`], [`Session::on_join_ack`])
//! 2. **Seating**: readying up, or refusing a spectator seat
//! 3. **Between duels**: side-decking, match results and rematches
//!    ([`MatchRecord`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client loop (above)  ← sends whatever packets a session step returns
//!     ↕
//! Session Layer (this crate)  ← lobby state, deck, match record
//!     ↕
//! Protocol Layer (below)  ← provides Packet, HostInfo
//! ```
//!
//! A [`Session`] never owns a socket. Each step is a plain method that
//! returns the packets to send, which keeps the lifecycle testable
//! without any I/O.

mod config;
mod error;
mod session;

pub use config::{DEFAULT_VERSION, Deck, SessionConfig};
pub use error::SessionError;
pub use session::{DuelResult, MatchRecord, Session, SessionState};
