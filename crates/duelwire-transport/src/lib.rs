//! Transport layer for duelwire.
//!
//! Provides the [`Connection`] trait over a framed, bidirectional byte
//! stream, and [`TcpConnection`], the implementation the duel server
//! speaks: `u16` little-endian length prefix, then the frame body.
//!
//! # Feature Flags
//!
//! - `tcp` (default): TCP connection via `tokio::net`

#![allow(async_fn_in_trait)]

mod error;
pub mod framing;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
pub use framing::{Frame, FrameDecoder, encode_frame};
#[cfg(feature = "tcp")]
pub use tcp::TcpConnection;

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The most recent frame bodies in each direction, kept for diagnosing
/// a desynchronised session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exchange {
    pub last_sent: Vec<u8>,
    pub last_received: Vec<u8>,
}

/// A single framed connection.
///
/// Frame bodies passed to [`send`](Self::send) and returned from
/// [`recv`](Self::recv) never include the length prefix.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Queues one frame for the peer.
    ///
    /// The frame may sit in a buffer until [`drain`](Self::drain).
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Waits until everything sent so far has been handed to the socket.
    ///
    /// Callers drain before issuing the next send.
    async fn drain(&self) -> Result<(), Self::Error>;

    /// Receives the next frame from the inbound queue.
    ///
    /// Returns `Ok(None)` once the connection is closed and the queue
    /// is empty.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection and stops the receive loop.
    async fn close(&self) -> Result<(), Self::Error>;

    /// `false` once either side has shut the connection down.
    fn is_alive(&self) -> bool;

    /// The last frame sent and the last frame received.
    async fn last_exchange(&self) -> Exchange;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
