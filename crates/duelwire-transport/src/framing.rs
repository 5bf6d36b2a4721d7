//! Length-prefixed framing.
//!
//! Each frame is a little-endian `u16` length followed by that many
//! bytes (message kind plus payload). A zero length is the peer telling
//! us it is about to hang up.

use byteorder::{ByteOrder, LittleEndian};

use crate::TransportError;

/// Size of the length prefix.
pub const HEADER_LEN: usize = 2;

/// Largest body a frame can carry.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// What the decoder pulled off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Message(Vec<u8>),
    /// A zero-length frame: the peer is closing.
    Close,
}

/// Prepends the length prefix to `body`.
///
/// # Errors
/// `FrameTooLarge` if `body` is longer than 65535 bytes. The body is
/// never truncated to fit.
pub fn encode_frame(body: &[u8]) -> Result<Vec<u8>, TransportError> {
    if body.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(body.len()));
    }
    let mut frame = vec![0u8; HEADER_LEN + body.len()];
    LittleEndian::write_u16(&mut frame[..HEADER_LEN], body.len() as u16);
    frame[HEADER_LEN..].copy_from_slice(body);
    Ok(frame)
}

/// Reassembles frames from arbitrarily split chunks of a byte stream.
///
/// Feed it whatever the socket returns; it only yields a frame once the
/// header and the full body have arrived.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly received bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pops the next complete frame, if there is one.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.buf.len() < HEADER_LEN {
            return None;
        }
        let len = usize::from(LittleEndian::read_u16(&self.buf[..HEADER_LEN]));
        if len == 0 {
            self.buf.drain(..HEADER_LEN);
            return Some(Frame::Close);
        }
        if self.buf.len() < HEADER_LEN + len {
            return None;
        }
        let body = self.buf[HEADER_LEN..HEADER_LEN + len].to_vec();
        self.buf.drain(..HEADER_LEN + len);
        Some(Frame::Message(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_of(bodies: &[&[u8]]) -> Vec<u8> {
        bodies
            .iter()
            .flat_map(|body| encode_frame(body).unwrap())
            .collect()
    }

    fn drain(decoder: &mut FrameDecoder, out: &mut Vec<Frame>) {
        while let Some(frame) = decoder.next_frame() {
            out.push(frame);
        }
    }

    #[test]
    fn test_encode_frame_prefixes_little_endian_length() {
        let frame = encode_frame(&[0x01, 0xaa, 0xbb]).unwrap();
        assert_eq!(frame, vec![3, 0, 0x01, 0xaa, 0xbb]);
    }

    #[test]
    fn test_encode_frame_rejects_oversized_body() {
        let body = vec![0u8; MAX_FRAME_LEN + 1];
        assert!(matches!(
            encode_frame(&body),
            Err(TransportError::FrameTooLarge(65536))
        ));
        assert!(encode_frame(&body[..MAX_FRAME_LEN]).is_ok());
    }

    #[test]
    fn test_decoder_waits_for_full_body() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[4, 0, 1, 2]);
        assert_eq!(decoder.next_frame(), None);
        decoder.push(&[3, 4]);
        assert_eq!(decoder.next_frame(), Some(Frame::Message(vec![1, 2, 3, 4])));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decoder_zero_length_is_close() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0, 0, 1, 0, 9]);
        assert_eq!(decoder.next_frame(), Some(Frame::Close));
        assert_eq!(decoder.next_frame(), Some(Frame::Message(vec![9])));
    }

    #[test]
    fn test_decoder_split_at_every_boundary_matches_whole() {
        let stream = stream_of(&[&[1, 2, 3], &[0x10], &[7; 300], &[]]);

        let mut whole = Vec::new();
        let mut decoder = FrameDecoder::new();
        decoder.push(&stream);
        drain(&mut decoder, &mut whole);
        assert_eq!(whole.len(), 4);
        assert_eq!(whole[3], Frame::Close);

        for split in 0..=stream.len() {
            let mut pieces = Vec::new();
            let mut decoder = FrameDecoder::new();
            decoder.push(&stream[..split]);
            drain(&mut decoder, &mut pieces);
            decoder.push(&stream[split..]);
            drain(&mut decoder, &mut pieces);
            assert_eq!(pieces, whole, "split at {split}");
        }
    }

    #[test]
    fn test_decoder_byte_by_byte_matches_whole() {
        let stream = stream_of(&[&[1; 5], &[2; 1], &[3; 258]]);
        let mut frames = Vec::new();
        let mut decoder = FrameDecoder::new();
        for byte in &stream {
            decoder.push(std::slice::from_ref(byte));
            drain(&mut decoder, &mut frames);
        }
        assert_eq!(
            frames,
            vec![
                Frame::Message(vec![1; 5]),
                Frame::Message(vec![2; 1]),
                Frame::Message(vec![3; 258]),
            ]
        );
    }
}
