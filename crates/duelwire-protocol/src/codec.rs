//! Sequential binary reader and writer for packet payloads.
//!
//! Every field on the wire is little-endian with an explicit width.
//! Nothing is padded or aligned implicitly: if a layout has alignment
//! bytes, the caller skips them by name.
//!
//! Both halves carry a [`Perspective`], the one bit of duel-scoped
//! state the codec needs. It turns absolute wire seats into relative
//! [`Player`] values on the way in and back again on the way out.
//!
//! ```rust
//! use duelwire_protocol::{PacketReader, PacketWriter};
//!
//! let mut w = PacketWriter::new();
//! w.write_int(-1, 4).unwrap();
//! assert_eq!(w.as_bytes(), &[0xff, 0xff, 0xff, 0xff]);
//!
//! let mut r = PacketReader::new(w.as_bytes());
//! assert_eq!(r.read_int(4).unwrap(), -1);
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::{Location, LocInfo, Player, Position, ProtocolError};

// ---------------------------------------------------------------------------
// Perspective
// ---------------------------------------------------------------------------

/// Maps absolute wire seats to relative players for one duel.
///
/// Seat 0 on the wire is whoever went first. If that was us, the mapping
/// is the identity; otherwise every player byte is XORed with 1. The
/// value is fixed when the duel starts and stays put until the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perspective {
    went_first: bool,
}

impl Perspective {
    pub fn new(went_first: bool) -> Self {
        Self { went_first }
    }

    pub fn went_first(self) -> bool {
        self.went_first
    }

    /// Absolute seat for a relative player.
    pub fn to_wire(self, player: Player) -> u8 {
        player as u8 ^ self.flip()
    }

    /// Relative player for an absolute seat.
    ///
    /// # Errors
    /// `InvalidPlayer` for anything other than seat 0 or 1.
    pub fn from_wire(self, seat: u8) -> Result<Player, ProtocolError> {
        if seat > 1 {
            return Err(ProtocolError::InvalidPlayer(seat));
        }
        Player::from_index(seat ^ self.flip())
            .ok_or(ProtocolError::InvalidPlayer(seat))
    }

    fn flip(self) -> u8 {
        if self.went_first { 0 } else { 1 }
    }
}

impl Default for Perspective {
    fn default() -> Self {
        Self::new(true)
    }
}

fn check_width(width: usize) -> Result<(), ProtocolError> {
    if (1..=8).contains(&width) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidWidth(width))
    }
}

// ---------------------------------------------------------------------------
// PacketReader
// ---------------------------------------------------------------------------

/// A cursor over one message payload.
///
/// Reads advance the cursor by exactly the requested width. Asking for
/// more than what is left fails with [`ProtocolError::UnexpectedEof`]
/// and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
    perspective: Perspective,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            perspective: Perspective::default(),
        }
    }

    /// Returns the reader with a different seat mapping.
    pub fn with_perspective(mut self, perspective: Perspective) -> Self {
        self.perspective = perspective;
        self
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Everything not yet consumed, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if n > self.remaining() {
            return Err(ProtocolError::UnexpectedEof {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.take(n).map(|_| ())
    }

    /// Splits off the next `n` bytes as their own reader.
    ///
    /// Used for length-prefixed entries: whatever the sub-reader leaves
    /// unread is skipped along with it.
    pub fn sub_reader(&mut self, n: usize) -> Result<PacketReader<'a>, ProtocolError> {
        let bytes = self.take(n)?;
        Ok(PacketReader::new(bytes).with_perspective(self.perspective))
    }

    /// Signed integer of `width` bytes, sign-extended.
    pub fn read_int(&mut self, width: usize) -> Result<i64, ProtocolError> {
        check_width(width)?;
        let bytes = self.take(width)?;
        Ok(LittleEndian::read_int(bytes, width))
    }

    /// Unsigned integer of `width` bytes.
    pub fn read_uint(&mut self, width: usize) -> Result<u64, ProtocolError> {
        check_width(width)?;
        let bytes = self.take(width)?;
        Ok(LittleEndian::read_uint(bytes, width))
    }

    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u8()? != 0)
    }

    /// UTF-16LE text in a fixed `width`-byte field, cut at the first NUL.
    ///
    /// Malformed text decodes to an empty string; only running out of
    /// bytes is an error.
    pub fn read_text(&mut self, width: usize) -> Result<String, ProtocolError> {
        let bytes = self.take(width)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .take_while(|&unit| unit != 0)
            .collect();
        Ok(String::from_utf16(&units).unwrap_or_default())
    }

    /// One seat byte, translated to the relative player.
    pub fn read_player(&mut self) -> Result<Player, ProtocolError> {
        let seat = self.read_u8()?;
        self.perspective.from_wire(seat)
    }

    /// One location byte. Unknown bits are kept.
    pub fn read_location(&mut self) -> Result<Location, ProtocolError> {
        Ok(Location::from_bits_retain(u32::from(self.read_u8()?)))
    }

    /// Four position bytes. Unknown bits are kept.
    pub fn read_position(&mut self) -> Result<Position, ProtocolError> {
        Ok(Position::from_bits_retain(self.read_u32()?))
    }

    /// The compact one-byte position used by a few messages.
    pub fn read_position_u8(&mut self) -> Result<Position, ProtocolError> {
        Ok(Position::from_bits_retain(u32::from(self.read_u8()?)))
    }

    /// Controller, location, index and position: 10 bytes.
    pub fn read_loc_info(&mut self) -> Result<LocInfo, ProtocolError> {
        Ok(LocInfo {
            controller: self.read_player()?,
            location: self.read_location()?,
            index: self.read_u32()?,
            position: self.read_position()?,
        })
    }
}

// ---------------------------------------------------------------------------
// PacketWriter
// ---------------------------------------------------------------------------

/// Builds a payload field by field.
#[derive(Debug, Clone, Default)]
pub struct PacketWriter {
    buf: Vec<u8>,
    perspective: Perspective,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_perspective(mut self, perspective: Perspective) -> Self {
        self.perspective = perspective;
        self
    }

    /// Two's-complement integer in `width` bytes.
    ///
    /// Accepts the full signed and unsigned range of the width, so
    /// `write_int(-1, 4)` and `write_int(0xffff_ffff, 4)` write the same
    /// bytes.
    ///
    /// # Errors
    /// `ValueOutOfRange` when the value needs more than `width` bytes.
    pub fn write_int(&mut self, value: i64, width: usize) -> Result<(), ProtocolError> {
        check_width(width)?;
        if width < 8 {
            let bits = 8 * width as u32;
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << bits) - 1;
            if value < min || value > max {
                return Err(ProtocolError::ValueOutOfRange { value, width });
            }
        }
        // Masking a negative value to `width` bytes is the same as
        // biasing it by 1 << (8 * width).
        let mask = if width == 8 {
            u64::MAX
        } else {
            (1u64 << (8 * width)) - 1
        };
        let mut field = [0u8; 8];
        LittleEndian::write_uint(&mut field[..width], value as u64 & mask, width);
        self.buf.extend_from_slice(&field[..width]);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut field = [0u8; 2];
        LittleEndian::write_u16(&mut field, value);
        self.buf.extend_from_slice(&field);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut field = [0u8; 4];
        LittleEndian::write_u32(&mut field, value);
        self.buf.extend_from_slice(&field);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut field = [0u8; 4];
        LittleEndian::write_i32(&mut field, value);
        self.buf.extend_from_slice(&field);
    }

    pub fn write_u64(&mut self, value: u64) {
        let mut field = [0u8; 8];
        LittleEndian::write_u64(&mut field, value);
        self.buf.extend_from_slice(&field);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// UTF-16LE text, truncated or zero-padded to exactly `width` bytes.
    ///
    /// On truncation the last two bytes are zeroed so the field always
    /// ends on a whole character.
    pub fn write_text(&mut self, value: &str, width: usize) {
        let mut encoded: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
        if encoded.len() > width {
            encoded.truncate(width.saturating_sub(2));
        }
        encoded.resize(width, 0);
        self.buf.extend_from_slice(&encoded);
    }

    /// One seat byte, translated from the relative player.
    pub fn write_player(&mut self, player: Player) {
        self.buf.push(self.perspective.to_wire(player));
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_int_negative_one_is_all_ones() {
        let mut w = PacketWriter::new();
        w.write_int(-1, 4).unwrap();
        assert_eq!(w.as_bytes(), &[0xff, 0xff, 0xff, 0xff]);

        let mut r = PacketReader::new(w.as_bytes());
        assert_eq!(r.read_int(4).unwrap(), -1);
    }

    #[test]
    fn test_write_int_negative_two_byte_is_biased() {
        let mut w = PacketWriter::new();
        w.write_int(-2, 2).unwrap();
        // -2 + 0x10000 = 0xfffe
        assert_eq!(w.as_bytes(), &[0xfe, 0xff]);
    }

    #[test]
    fn test_write_int_accepts_full_unsigned_range() {
        let mut w = PacketWriter::new();
        w.write_int(0xffff_ffff, 4).unwrap();
        assert_eq!(w.as_bytes(), &[0xff; 4]);
        let mut r = PacketReader::new(w.as_bytes());
        assert_eq!(r.read_uint(4).unwrap(), 0xffff_ffff);
    }

    #[test]
    fn test_write_int_rejects_value_wider_than_field() {
        let mut w = PacketWriter::new();
        let err = w.write_int(256, 1).unwrap_err();
        assert_eq!(err, ProtocolError::ValueOutOfRange { value: 256, width: 1 });
        assert!(w.is_empty());
        assert!(w.write_int(-129, 1).is_err());
    }

    #[test]
    fn test_write_int_rejects_zero_width() {
        let mut w = PacketWriter::new();
        assert_eq!(w.write_int(0, 0), Err(ProtocolError::InvalidWidth(0)));
    }

    #[test]
    fn test_read_past_end_fails_without_advancing() {
        let mut r = PacketReader::new(&[1, 2, 3]);
        let err = r.read_u32().unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedEof { wanted: 4, remaining: 3 });
        assert_eq!(r.remaining(), 3);
        assert_eq!(r.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_read_is_sequential() {
        let mut r = PacketReader::new(&[0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_u32().unwrap(), 0x1234_5678);
        assert!(r.is_empty());
    }

    #[test]
    fn test_write_text_pads_to_width() {
        let mut w = PacketWriter::new();
        w.write_text("ab", 8);
        assert_eq!(w.as_bytes(), &[b'a', 0, b'b', 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_write_text_truncates_with_terminator() {
        let mut w = PacketWriter::new();
        w.write_text("abcdef", 8);
        assert_eq!(w.as_bytes(), &[b'a', 0, b'b', 0, b'c', 0, 0, 0]);
    }

    #[test]
    fn test_read_text_stops_at_nul() {
        let mut w = PacketWriter::new();
        w.write_text("Yugi", 40);
        let mut r = PacketReader::new(w.as_bytes());
        assert_eq!(r.read_text(40).unwrap(), "Yugi");
        assert!(r.is_empty());
    }

    #[test]
    fn test_read_text_malformed_decodes_empty() {
        // A lone high surrogate is not valid UTF-16.
        let mut r = PacketReader::new(&[0x00, 0xd8, 0x41, 0x00]);
        assert_eq!(r.read_text(4).unwrap(), "");
        assert!(r.is_empty());
    }

    #[test]
    fn test_player_round_trip_from_either_seat() {
        for went_first in [true, false] {
            let perspective = Perspective::new(went_first);
            for player in Player::BOTH {
                let mut w = PacketWriter::new().with_perspective(perspective);
                w.write_player(player);
                let mut r = PacketReader::new(w.as_bytes()).with_perspective(perspective);
                assert_eq!(r.read_player().unwrap(), player);
            }
        }
    }

    #[test]
    fn test_player_second_seat_flips_wire_value() {
        let perspective = Perspective::new(false);
        assert_eq!(perspective.to_wire(Player::Me), 1);
        assert_eq!(perspective.from_wire(0).unwrap(), Player::Opponent);
    }

    #[test]
    fn test_read_player_rejects_third_seat() {
        let mut r = PacketReader::new(&[2]);
        assert_eq!(r.read_player(), Err(ProtocolError::InvalidPlayer(2)));
    }

    #[test]
    fn test_read_loc_info_layout() {
        let bytes = [1, 0x02, 3, 0, 0, 0, 0x0a, 0, 0, 0];
        let mut r = PacketReader::new(&bytes);
        let loc = r.read_loc_info().unwrap();
        assert_eq!(loc.controller, Player::Opponent);
        assert_eq!(loc.location, Location::HAND);
        assert_eq!(loc.index, 3);
        assert_eq!(loc.position, Position::FACEDOWN);
        assert!(r.is_empty());
    }

    #[test]
    fn test_read_location_keeps_unknown_bits() {
        let mut r = PacketReader::new(&[0x84]);
        let loc = r.read_location().unwrap();
        assert_eq!(loc, Location::MONSTER_ZONE | Location::OVERLAY);
        let mut r = PacketReader::new(&[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(r.read_position().unwrap().bits(), 0xffff_ffff);
    }

    #[test]
    fn test_sub_reader_confines_reads() {
        let mut r = PacketReader::new(&[1, 2, 3, 4, 5]);
        let mut sub = r.sub_reader(2).unwrap();
        assert_eq!(sub.read_u8().unwrap(), 1);
        assert!(sub.read_u16().is_err());
        assert_eq!(r.read_u8().unwrap(), 3);
    }
}
