//! TCP connection with a background receive loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{Mutex, Notify, mpsc};

use crate::framing::{Frame, FrameDecoder, encode_frame};
use crate::{Connection, ConnectionId, Exchange, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

const READ_CHUNK: usize = 4096;

/// A framed TCP connection to the duel server.
///
/// A spawned task reads the socket, cuts the stream into frames, and
/// pushes them onto an unbounded queue; [`recv`](Connection::recv)
/// pops from that queue. Writes go through a buffer that
/// [`drain`](Connection::drain) flushes.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<BufWriter<OwnedWriteHalf>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    alive: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    exchange: Mutex<Exchange>,
}

impl TcpConnection {
    /// Connects to `addr` and starts the receive loop.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        Self::from_stream(stream)
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        let peer = stream.peer_addr().map_err(TransportError::ConnectFailed)?;
        stream
            .set_nodelay(true)
            .map_err(TransportError::ConnectFailed)?;
        let (read_half, write_half) = stream.into_split();

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let alive = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(Notify::new());

        tokio::spawn(receive_loop(
            id,
            read_half,
            tx,
            Arc::clone(&alive),
            Arc::clone(&shutdown),
        ));
        tracing::debug!(%id, %peer, "connected");

        Ok(Self {
            id,
            peer,
            writer: Mutex::new(BufWriter::new(write_half)),
            inbound: Mutex::new(rx),
            alive,
            shutdown,
            exchange: Mutex::new(Exchange::default()),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if !self.is_alive() {
            return Err(TransportError::ConnectionClosed(
                "send on a closed connection".into(),
            ));
        }
        let frame = encode_frame(data)?;
        self.writer
            .lock()
            .await
            .write_all(&frame)
            .await
            .map_err(TransportError::SendFailed)?;
        self.exchange.lock().await.last_sent = data.to_vec();
        tracing::trace!(id = %self.id, bytes = ?data, "frame queued");
        Ok(())
    }

    async fn drain(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .flush()
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let frame = self.inbound.lock().await.recv().await;
        if let Some(data) = &frame {
            tracing::trace!(id = %self.id, bytes = ?data, "frame received");
            self.exchange.lock().await.last_received = data.clone();
        }
        Ok(frame)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        if self.alive.swap(false, Ordering::SeqCst) {
            tracing::debug!(id = %self.id, "closing connection");
        }
        self.shutdown.notify_one();
        let mut writer = self.writer.lock().await;
        // The peer may already be gone; a failed flush or shutdown on
        // the way out changes nothing for the caller.
        let _ = writer.flush().await;
        let _ = writer.shutdown().await;
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn last_exchange(&self) -> Exchange {
        self.exchange.lock().await.clone()
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Reads the socket until EOF, error, a close frame, or local shutdown.
///
/// Dropping `inbound` on exit is what wakes a caller blocked in `recv`.
async fn receive_loop(
    id: ConnectionId,
    mut reader: OwnedReadHalf,
    inbound: mpsc::UnboundedSender<Vec<u8>>,
    alive: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    let mut decoder = FrameDecoder::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    'read: loop {
        let n = tokio::select! {
            _ = shutdown.notified() => {
                tracing::debug!(%id, "receive loop stopped locally");
                break 'read;
            }
            read = reader.read(&mut chunk) => match read {
                Ok(0) => {
                    tracing::debug!(%id, "peer closed the stream");
                    break 'read;
                }
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(%id, error = %e, "receive failed");
                    break 'read;
                }
            },
        };

        decoder.push(&chunk[..n]);
        while let Some(frame) = decoder.next_frame() {
            match frame {
                Frame::Message(body) => {
                    if inbound.send(body).is_err() {
                        break 'read;
                    }
                }
                Frame::Close => {
                    tracing::debug!(%id, "peer sent a close frame");
                    break 'read;
                }
            }
        }
    }

    alive.store(false, Ordering::SeqCst);
}
