//! Decoders for the server's lobby messages.

use serde::{Deserialize, Serialize};

use crate::{PacketReader, ProtocolError, NAME_WIDTH};

/// Lobby slot index from which a `TYPE_CHANGE` means "you are watching".
pub const SPECTATOR_POSITION: u8 = 7;

/// Room settings the server sends in its `JOIN_GAME` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub lflist: u32,
    pub rule: u8,
    pub mode: u8,
    pub duel_rule: u8,
    pub no_check_deck: bool,
    pub no_shuffle_deck: bool,
    pub start_lp: u32,
    pub start_hand: u8,
    pub draw_count: u8,
    pub time_limit: u16,
    pub handshake: u32,
    pub version: u32,
    pub team1: u32,
    pub team2: u32,
    pub best_of: u32,
    pub duel_flag: u32,
    pub forbidden_types: u32,
    pub extra_rules: u32,
}

impl HostInfo {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let lflist = r.read_u32()?;
        let rule = r.read_u8()?;
        let mode = r.read_u8()?;
        let duel_rule = r.read_u8()?;
        let no_check_deck = r.read_bool()?;
        let no_shuffle_deck = r.read_bool()?;
        r.skip(3)?;
        let start_lp = r.read_u32()?;
        let start_hand = r.read_u8()?;
        let draw_count = r.read_u8()?;
        let time_limit = r.read_u16()?;
        r.skip(4)?;
        Ok(Self {
            lflist,
            rule,
            mode,
            duel_rule,
            no_check_deck,
            no_shuffle_deck,
            start_lp,
            start_hand,
            draw_count,
            time_limit,
            handshake: r.read_u32()?,
            version: r.read_u32()?,
            team1: r.read_u32()?,
            team2: r.read_u32()?,
            best_of: r.read_u32()?,
            duel_flag: r.read_u32()?,
            forbidden_types: r.read_u32()?,
            extra_rules: r.read_u32()?,
        })
    }
}

/// Why the server refused us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerErrorKind {
    Join,
    Deck,
    Side,
    Version,
    /// Version mismatch carrying the host's version.
    HostVersion,
    Unknown(u8),
}

impl From<u8> for ServerErrorKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Join,
            2 => Self::Deck,
            3 => Self::Side,
            4 => Self::Version,
            5 => Self::HostVersion,
            other => Self::Unknown(other),
        }
    }
}

/// Decoded `ERROR_MSG`: a kind byte, 3 padding bytes, then a 4-byte
/// code (the host version for [`ServerErrorKind::HostVersion`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    pub kind: ServerErrorKind,
    pub code: u32,
}

impl ServerError {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let kind = ServerErrorKind::from(r.read_u8()?);
        // Older servers stop after the kind byte.
        let code = if r.remaining() >= 7 {
            r.skip(3)?;
            r.read_u32()?
        } else {
            0
        };
        Ok(Self { kind, code })
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ServerErrorKind::HostVersion => write!(
                f,
                "host runs version {}.{}.{}.{}",
                self.code & 0xff,
                (self.code >> 8) & 0xff,
                (self.code >> 16) & 0xff,
                (self.code >> 24) & 0xff,
            ),
            kind => write!(f, "{kind:?} error (code {:#x})", self.code),
        }
    }
}

/// Decoded `CHAT`: sender slot and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: u16,
    pub text: String,
}

impl ChatMessage {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let sender = r.read_u16()?;
        let width = r.remaining() & !1;
        Ok(Self {
            sender,
            text: r.read_text(width)?,
        })
    }
}

/// Decoded `HS_PLAYER_ENTER`: the name of whoever sat down.
pub fn decode_player_enter(r: &mut PacketReader<'_>) -> Result<String, ProtocolError> {
    r.read_text(NAME_WIDTH)
}
