/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The connection was closed, locally or by the peer.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing or flushing data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The frame does not fit in a 16-bit length prefix.
    #[error("frame of {0} bytes exceeds the 65535-byte limit")]
    FrameTooLarge(usize),
}
