//! Wire protocol for duelwire.
//!
//! This crate defines the "language" the client and the duel server
//! speak:
//!
//! - **Codec** ([`PacketReader`], [`PacketWriter`], [`Perspective`]):
//!   fixed-width little-endian fields, UTF-16 text, and the seat
//!   translation applied to every player byte.
//! - **Message ids** ([`CtosMessage`], [`StocMessage`], [`GameMessage`]).
//! - **Vocabulary** ([`Player`], [`Location`], [`Position`], [`LocInfo`]
//!   and the card bitmasks) shared with the duel mirror.
//! - **Packets** ([`Packet`], [`HostInfo`], [`Response`], card
//!   queries): the concrete layouts built on top of the codec.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (framed bytes) and the
//! duel engine. It knows nothing about sockets or game state; it only
//! turns payloads into values and back.
//!
//! ```text
//! Transport (frames) → Protocol (fields) → Dispatch (duel events)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod lobby;
mod message;
mod packet;
pub mod query;
mod response;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{PacketReader, PacketWriter, Perspective};
pub use error::ProtocolError;
pub use lobby::{
    ChatMessage, HostInfo, ServerError, ServerErrorKind, SPECTATOR_POSITION,
    decode_player_enter,
};
pub use message::{CtosMessage, GameMessage, StocMessage};
pub use packet::{NAME_WIDTH, Packet, SERVER_HANDSHAKE, split_frame};
pub use query::CardQuery;
pub use response::Response;
pub use types::{
    Attribute, CardType, LocInfo, Location, Phase, Player, Position, Race,
};
