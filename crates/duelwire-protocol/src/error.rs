//! Error types for the protocol layer.
//!
//! Each crate in duelwire defines its own error enum. When you see a
//! `ProtocolError`, the problem is in how bytes were laid out, not in
//! the socket underneath or the duel mirror on top.

/// Errors that can occur while encoding or decoding packets.
///
/// `#[derive(thiserror::Error)]` auto-generates the `std::error::Error`
/// implementation. The `#[error("...")]` attributes define the message
/// you see when the error is printed or logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A read asked for more bytes than the payload has left.
    ///
    /// This is fatal for the message being decoded: the cursor never
    /// hands out stale or zero-filled bytes to paper over a short
    /// payload.
    #[error("unexpected end of payload: wanted {wanted} bytes, {remaining} remaining")]
    UnexpectedEof { wanted: usize, remaining: usize },

    /// An integer does not fit in the requested field width.
    #[error("value {value} does not fit in {width} bytes")]
    ValueOutOfRange { value: i64, width: usize },

    /// Field widths must be between 1 and 8 bytes.
    #[error("unsupported field width: {0}")]
    InvalidWidth(usize),

    /// A player byte outside the two seats.
    #[error("invalid player index: {0}")]
    InvalidPlayer(u8),

    /// An encoded packet would not fit in a 16-bit length prefix.
    #[error("packet of {0} bytes exceeds the 65535-byte frame limit")]
    FrameTooLarge(usize),

    /// The message is structurally readable but breaks a protocol rule,
    /// e.g. an empty frame where a message kind byte was expected.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
