//! Reply shapes for decision requests.
//!
//! Every decision goes back in a `RESPONSE` packet whose layout depends
//! on the request kind. The server is strict: a reply with the wrong
//! shape is answered with `RETRY`, so each shape is spelled out here
//! once and reused by the dispatcher.

use crate::{CtosMessage, Location, Packet, Perspective, Player};

/// A decoded answer, ready to be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// One 4-byte signed value: an index, a command word, a position,
    /// a bitmask sum, or `-1` to decline.
    Int(i32),
    /// One byte, 0 or 1.
    Bool(bool),
    /// Multi-card selection: status 0, count, then one 4-byte index each.
    Cards(Vec<u32>),
    /// Select/unselect step: `-1` to finish, or count plus indices.
    Unselect(Option<Vec<u32>>),
    /// Zone choice: absolute seat, location byte, slot.
    Place {
        player: Player,
        location: Location,
        slot: u8,
    },
    /// One 2-byte count per candidate card.
    Counters(Vec<u16>),
    /// One raw byte per candidate, used for card sorting.
    Bytes(Vec<u8>),
    /// A card code, for card announcement.
    Code(u32),
}

impl Response {
    /// The `(index << 16) | action` word used by idle and battle
    /// command replies.
    pub fn command(index: usize, action: u8) -> Self {
        Self::Int(((index as i32) << 16) | i32::from(action))
    }

    /// The sentinel for "decline" where a reply is an index.
    pub fn decline() -> Self {
        Self::Int(-1)
    }

    /// Encodes the reply as a `RESPONSE` packet.
    pub fn into_packet(self, perspective: Perspective) -> Packet {
        let mut packet = Packet::with_perspective(CtosMessage::Response, perspective);
        let body = packet.body_mut();
        match self {
            Self::Int(value) => body.write_i32(value),
            Self::Bool(value) => body.write_bool(value),
            Self::Cards(indices) => {
                body.write_i32(0);
                body.write_u32(indices.len() as u32);
                for index in indices {
                    body.write_u32(index);
                }
            }
            Self::Unselect(None) => body.write_i32(-1),
            Self::Unselect(Some(indices)) => {
                body.write_u32(indices.len() as u32);
                for index in indices {
                    body.write_u32(index);
                }
            }
            Self::Place {
                player,
                location,
                slot,
            } => {
                body.write_player(player);
                body.write_u8((location.bits() & 0xff) as u8);
                body.write_u8(slot);
            }
            Self::Counters(counts) => {
                for count in counts {
                    body.write_u16(count);
                }
            }
            Self::Bytes(bytes) => body.write_bytes(&bytes),
            Self::Code(code) => body.write_u32(code),
        }
        packet
    }
}
