//! Error types for the duel mirror.

use duelwire_protocol::{LocInfo, Location, Player};

use crate::CardHandle;

/// Errors raised while applying an event to the mirror.
///
/// None of these mean the connection is broken. They mean the server
/// named something the mirror does not hold, which the dispatcher logs
/// and moves past.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DuelError {
    /// Nothing sits at the named address.
    #[error("no card at {player}:{:#x}[{index}]", .location.bits())]
    CardNotFound {
        player: Player,
        location: Location,
        index: u32,
    },

    /// The location has no primary category bit the mirror knows.
    #[error("unknown location bits {0:#x}")]
    UnknownLocation(u32),

    /// A zone index past the end of the monster or spell row.
    #[error("zone {index} out of range for {player}:{:#x}", .location.bits())]
    ZoneOutOfRange {
        player: Player,
        location: Location,
        index: u32,
    },

    /// Overlay material aimed at a zone with no holder in it.
    #[error("zone {player}:{:#x}[{index}] is empty", .location.bits())]
    ZoneEmpty {
        player: Player,
        location: Location,
        index: u32,
    },

    /// `SHUFFLE_SETCARD` named a different number of cards on each side.
    #[error("shuffle names {before} cards before and {after} after")]
    ShuffleMismatch { before: usize, after: usize },

    /// A batch move named the same address twice on one side.
    #[error("{player}:{:#x}[{index}] named twice in one batch", .location.bits())]
    RepeatedAddress {
        player: Player,
        location: Location,
        index: u32,
    },

    /// A handle whose card has already been released.
    #[error("{0} has been released")]
    StaleHandle(CardHandle),
}

impl DuelError {
    pub(crate) fn not_found(at: &LocInfo) -> Self {
        Self::CardNotFound {
            player: at.controller,
            location: at.location,
            index: at.index,
        }
    }

    pub(crate) fn out_of_range(at: &LocInfo) -> Self {
        Self::ZoneOutOfRange {
            player: at.controller,
            location: at.location,
            index: at.index,
        }
    }

    pub(crate) fn zone_empty(at: &LocInfo) -> Self {
        Self::ZoneEmpty {
            player: at.controller,
            location: at.location,
            index: at.index,
        }
    }

    pub(crate) fn repeated(at: &LocInfo) -> Self {
        Self::RepeatedAddress {
            player: at.controller,
            location: at.location,
            index: at.index,
        }
    }
}
