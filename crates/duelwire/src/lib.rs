//! # Duelwire
//!
//! Client for the YGOPro-style duel protocol.
//!
//! Duelwire connects to a duel server, joins a room, keeps a mirror of
//! the duel from its own seat, and answers every decision the server
//! asks by calling a [`DecisionProvider`]. The provider is the only
//! part that plays; everything else is protocol plumbing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duelwire::prelude::*;
//!
//! // Implement DecisionProvider for your player, then:
//! // let client = DuelClient::builder()
//! //     .host("127.0.0.1")
//! //     .port(7911)
//! //     .deck(deck)
//! //     .build(my_provider)
//! //     .await?;
//! // let record = client.run().await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TcpConnection (duelwire-transport)  ← length-prefixed frames
//!     ↓ frame
//! Dispatcher (this crate)             ← STOC kind, then GAME_MSG kind
//!     ├─ Session (duelwire-session)   ← lobby replies, deck, record
//!     ├─ Duel (duelwire-duel)         ← state events, in arrival order
//!     └─ DecisionProvider             ← decision requests
//!     ↓ Response
//! Packet (duelwire-protocol)          ← reply bytes
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod client;
mod decision;
mod dispatch;
mod error;
mod events;
pub mod request;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{ClientConfig, DuelClient, DuelClientBuilder};
pub use decision::{DecisionProvider, PAPER, ROCK, SCISSORS};
pub use dispatch::{DispatchTable, Dispatcher, GameHandler, Reaction};
pub use error::DuelwireError;
pub use events::decode_event;

pub use duelwire_duel as duel;
pub use duelwire_protocol as protocol;
pub use duelwire_session as session;
pub use duelwire_transport as transport;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, `info` when unset.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::request::{
        Activation, AttributeRequest, Attacker, BattleAction, BattleRequest, CardChoice,
        CardNameRequest, ChainRequest, CounterRequest, EffectYnRequest, IdleAction, IdleRequest,
        NumberRequest, OptionRequest, PlaceChoice, PlaceRequest, PositionRequest, RaceRequest,
        SelectCardRequest, SortRequest, SumRequest, UnselectRequest, YesNoRequest,
    };
    pub use crate::{ClientConfig, DecisionProvider, DuelClient, DuelwireError, init_tracing};
    pub use duelwire_duel::{Card, CardHandle, Duel, Outcome};
    pub use duelwire_protocol::{Attribute, LocInfo, Location, Phase, Player, Position, Race};
    pub use duelwire_session::{Deck, MatchRecord, SessionConfig};
}
