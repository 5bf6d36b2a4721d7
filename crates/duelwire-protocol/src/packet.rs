//! Outbound packets and inbound frame splitting.
//!
//! A packet is one message-kind byte followed by its payload. The
//! 2-byte length prefix belongs to the transport; this module never
//! sees it.

use crate::{CtosMessage, PacketWriter, Perspective, ProtocolError};

/// Width of every fixed text field in the lobby messages (20 UTF-16 units).
pub const NAME_WIDTH: usize = 40;

/// The handshake constant a compatible server echoes in its join reply.
pub const SERVER_HANDSHAKE: u32 = 4_043_399_681;

/// Junk bytes the join request carries between the two version fields.
const JOIN_RESERVED: [u8; 6] = [0xcc, 0xcc, 0x00, 0x00, 0x00, 0x00];

/// Chat messages are capped at 256 UTF-16 units including the terminator.
const CHAT_MAX_UNITS: usize = 256;

/// A client-to-server message under construction.
#[derive(Debug, Clone)]
pub struct Packet {
    kind: CtosMessage,
    body: PacketWriter,
}

impl Packet {
    pub fn new(kind: CtosMessage) -> Self {
        Self::with_perspective(kind, Perspective::default())
    }

    /// A packet whose player fields are written through `perspective`.
    pub fn with_perspective(kind: CtosMessage, perspective: Perspective) -> Self {
        Self {
            kind,
            body: PacketWriter::new().with_perspective(perspective),
        }
    }

    pub fn kind(&self) -> CtosMessage {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        self.body.as_bytes()
    }

    /// Mutable access to the payload for field-by-field encoding.
    pub fn body_mut(&mut self) -> &mut PacketWriter {
        &mut self.body
    }

    /// Kind byte followed by the payload, ready for framing.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.body.len());
        bytes.push(self.kind as u8);
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }

    // -----------------------------------------------------------------------
    // Lobby packets
    // -----------------------------------------------------------------------

    /// `PLAYER_INFO`: the display name in a 40-byte field.
    pub fn player_info(name: &str) -> Self {
        let mut packet = Self::new(CtosMessage::PlayerInfo);
        packet.body.write_text(name, NAME_WIDTH);
        packet
    }

    /// `JOIN_GAME`: low 16 bits of the version, reserved bytes, the room
    /// password/info field, then the full version.
    pub fn join_game(version: u32, room_info: &str) -> Self {
        let mut packet = Self::new(CtosMessage::JoinGame);
        packet.body.write_u16((version & 0xffff) as u16);
        packet.body.write_bytes(&JOIN_RESERVED);
        packet.body.write_text(room_info, NAME_WIDTH);
        packet.body.write_u32(version);
        packet
    }

    /// `UPDATE_DECK`: main+extra count, side count, then every id in
    /// main, extra, side order.
    pub fn update_deck(main: &[u32], extra: &[u32], side: &[u32]) -> Self {
        let mut packet = Self::new(CtosMessage::UpdateDeck);
        packet.body.write_u32((main.len() + extra.len()) as u32);
        packet.body.write_u32(side.len() as u32);
        for &code in main.iter().chain(extra).chain(side) {
            packet.body.write_u32(code);
        }
        packet
    }

    pub fn ready() -> Self {
        Self::new(CtosMessage::HsReady)
    }

    pub fn time_confirm() -> Self {
        Self::new(CtosMessage::TimeConfirm)
    }

    /// `HAND_RESULT`: rock (1), paper (2) or scissors (3) for the
    /// turn-order hand game.
    pub fn hand_result(hand: u8) -> Self {
        let mut packet = Self::new(CtosMessage::HandResult);
        packet.body.write_u8(hand);
        packet
    }

    pub fn turn_order(go_first: bool) -> Self {
        let mut packet = Self::new(CtosMessage::TpResult);
        packet.body.write_bool(go_first);
        packet
    }

    pub fn rematch_response(accept: bool) -> Self {
        let mut packet = Self::new(CtosMessage::RematchResponse);
        packet.body.write_bool(accept);
        packet
    }

    pub fn surrender() -> Self {
        Self::new(CtosMessage::Surrender)
    }

    /// `CHAT`: NUL-terminated UTF-16 text.
    pub fn chat(text: &str) -> Self {
        let units = text.encode_utf16().count().min(CHAT_MAX_UNITS - 1) + 1;
        let mut packet = Self::new(CtosMessage::Chat);
        packet.body.write_text(text, units * 2);
        packet
    }
}

/// Splits an inbound frame into its kind byte and payload.
///
/// # Errors
/// `InvalidMessage` for an empty frame.
pub fn split_frame(frame: &[u8]) -> Result<(u8, &[u8]), ProtocolError> {
    frame
        .split_first()
        .map(|(&kind, payload)| (kind, payload))
        .ok_or_else(|| ProtocolError::InvalidMessage("empty frame".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PacketReader;

    #[test]
    fn test_player_info_is_kind_plus_forty_bytes() {
        let bytes = Packet::player_info("Kaiba").to_bytes();
        assert_eq!(bytes[0], 0x10);
        assert_eq!(bytes.len(), 41);
        let mut r = PacketReader::new(&bytes[1..]);
        assert_eq!(r.read_text(NAME_WIDTH).unwrap(), "Kaiba");
    }

    #[test]
    fn test_join_game_layout() {
        let version = 38 | 1 << 8 | 8 << 16;
        let packet = Packet::join_game(version, "");
        let payload = packet.payload();
        assert_eq!(payload.len(), 2 + 6 + 40 + 4);
        assert_eq!(&payload[..2], &[38, 1]);
        assert_eq!(&payload[2..8], &JOIN_RESERVED);
        assert!(payload[8..48].iter().all(|&b| b == 0));
        let mut r = PacketReader::new(&payload[48..]);
        assert_eq!(r.read_u32().unwrap(), version);
    }

    #[test]
    fn test_update_deck_orders_main_extra_side() {
        let packet = Packet::update_deck(&[1, 2], &[3], &[4]);
        let mut r = PacketReader::new(packet.payload());
        assert_eq!(r.read_u32().unwrap(), 3);
        assert_eq!(r.read_u32().unwrap(), 1);
        let ids: Vec<u32> = (0..4).map(|_| r.read_u32().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(r.is_empty());
    }

    #[test]
    fn test_chat_is_nul_terminated() {
        let packet = Packet::chat("gg");
        assert_eq!(packet.payload(), &[b'g', 0, b'g', 0, 0, 0]);
    }

    #[test]
    fn test_empty_packets_have_no_payload() {
        assert_eq!(Packet::ready().to_bytes(), vec![0x22]);
        assert_eq!(Packet::time_confirm().to_bytes(), vec![0x15]);
        assert_eq!(Packet::surrender().to_bytes(), vec![0x14]);
    }

    #[test]
    fn test_split_frame_rejects_empty() {
        assert!(split_frame(&[]).is_err());
        assert_eq!(split_frame(&[7, 1, 2]).unwrap(), (7, &[1u8, 2][..]));
    }
}
