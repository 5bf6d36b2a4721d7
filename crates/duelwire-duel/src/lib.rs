//! Duel mirror for duelwire.
//!
//! Holds everything the client knows about a running duel, always from
//! its own seat: both half fields, every card seen so far, life points,
//! turn and phase, the chain being built and the summon in progress.
//!
//! # Key types
//!
//! - [`Duel`]: the aggregate; read it from a decision provider, mutate
//!   it only through [`Duel::apply`]
//! - [`DuelEvent`]: one decoded state change
//! - [`Card`] / [`CardHandle`]: card data and the arena index naming it
//! - [`HalfField`] / [`Zone`]: one side's piles and zone rows
//! - [`DuelError`]: lookups the mirror could not satisfy
//!
//! The server is authoritative. Nothing here checks game rules; the
//! mirror records what it is told and keeps its own structure sound.

mod card;
mod duel;
mod error;
mod event;
mod field;

pub use card::{Card, CardHandle, STATUS_DISABLED, STATUS_PROC_COMPLETE};
pub use duel::{DEFAULT_LIFE, Duel, Outcome};
pub use error::DuelError;
pub use event::{DuelEvent, SummonKind};
pub use field::{Area, HalfField, MONSTER_ZONES, Pile, Row, SPELL_ZONES, Zone};
