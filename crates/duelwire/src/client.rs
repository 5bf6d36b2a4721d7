//! `DuelClient` builder and connection loop.
//!
//! This is the entry point for playing on a duel server. It ties the
//! layers together: transport → dispatch (protocol, session, mirror) →
//! decision provider.

use duelwire_protocol::Packet;
use duelwire_session::{Deck, MatchRecord, SessionConfig};
use duelwire_transport::{Connection, TcpConnection, TransportError};
use serde::{Deserialize, Serialize};

use crate::DuelwireError;
use crate::decision::DecisionProvider;
use crate::dispatch::Dispatcher;

/// Where to connect and who to be once connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7911,
            session: SessionConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and connecting a [`DuelClient`].
///
/// # Example
///
/// ```rust,ignore
/// use duelwire::prelude::*;
///
/// let client = DuelClient::builder()
///     .host("127.0.0.1")
///     .port(7911)
///     .name("duelwire")
///     .deck(deck)
///     .build(MyProvider::default())
///     .await?;
/// let record = client.run().await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DuelClientBuilder {
    config: ClientConfig,
}

impl DuelClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a loaded configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the name shown in the lobby.
    pub fn name(mut self, name: &str) -> Self {
        self.config.session.name = name.to_string();
        self
    }

    pub fn deck(mut self, deck: Deck) -> Self {
        self.config.session.deck = deck;
        self
    }

    /// Sets the room password or creation string.
    pub fn room_info(mut self, room_info: &str) -> Self {
        self.config.session.room_info = room_info.to_string();
        self
    }

    /// Overrides the client version sent in the join request.
    pub fn version(mut self, version: u32) -> Self {
        self.config.session.version = version;
        self
    }

    /// Connects to the server. Nothing is sent until [`DuelClient::run`].
    pub async fn build<P: DecisionProvider>(
        self,
        provider: P,
    ) -> Result<DuelClient<P>, DuelwireError> {
        let ClientConfig {
            host,
            port,
            session,
        } = self.config;
        let conn = TcpConnection::connect((host.as_str(), port)).await?;
        tracing::info!(%host, port, id = %conn.id(), "connected");
        Ok(DuelClient::with_connection(conn, session, provider))
    }
}

// ---------------------------------------------------------------------------
// DuelClient
// ---------------------------------------------------------------------------

/// One connection to a duel server, played by one decision provider.
///
/// Call [`run()`](Self::run) to play until the server ends the match.
pub struct DuelClient<P, C = TcpConnection> {
    conn: C,
    dispatcher: Dispatcher<P>,
}

impl DuelClient<()> {
    /// Creates a new builder.
    pub fn builder() -> DuelClientBuilder {
        DuelClientBuilder::new()
    }
}

impl<P, C> DuelClient<P, C>
where
    P: DecisionProvider,
    C: Connection<Error = TransportError>,
{
    /// Plays over an existing connection.
    pub fn with_connection(conn: C, session: SessionConfig, provider: P) -> Self {
        Self {
            conn,
            dispatcher: Dispatcher::new(session, provider),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<P> {
        &self.dispatcher
    }

    /// Runs the connection to completion.
    ///
    /// Sends the handshake, then routes every inbound frame in arrival
    /// order and sends the replies, draining after each. Returns the
    /// match record once the server ends the match or closes the socket.
    /// The connection is closed on every exit path.
    ///
    /// # Errors
    /// Any fatal condition; a [`DuelwireError::Desync`] carries the last
    /// frames exchanged.
    pub async fn run(mut self) -> Result<MatchRecord, DuelwireError> {
        let id = self.conn.id();
        let result = match self.drive().await {
            Err(DuelwireError::Desync { reason, .. }) => {
                let exchange = self.conn.last_exchange().await;
                Err(DuelwireError::Desync {
                    reason,
                    last_sent: exchange.last_sent,
                    last_received: exchange.last_received,
                })
            }
            other => other,
        };

        if let Err(e) = &result {
            let exchange = self.conn.last_exchange().await;
            tracing::error!(
                %id,
                error = %e,
                last_sent = ?exchange.last_sent,
                last_received = ?exchange.last_received,
                "session failed"
            );
        }
        if let Err(e) = self.conn.close().await {
            tracing::debug!(%id, error = %e, "close failed");
        }

        let record = *self.dispatcher.session().record();
        tracing::info!(%id, played = record.played, won = record.won, "connection closed");
        result.map(|()| record)
    }

    async fn drive(&mut self) -> Result<(), DuelwireError> {
        let handshake = self.dispatcher.handshake()?;
        self.send_all(&handshake).await?;

        while let Some(frame) = self.conn.recv().await? {
            let reaction = self.dispatcher.handle_frame(&frame)?;
            self.send_all(&reaction.replies).await?;
            if reaction.close {
                return Ok(());
            }
        }
        tracing::info!(id = %self.conn.id(), "server closed the connection");
        Ok(())
    }

    async fn send_all(&self, packets: &[Packet]) -> Result<(), DuelwireError> {
        for packet in packets {
            if !self.conn.is_alive() {
                tracing::debug!(kind = ?packet.kind(), "connection gone, reply dropped");
                return Ok(());
            }
            self.conn.send(&packet.to_bytes()).await?;
            self.conn.drain().await?;
        }
        Ok(())
    }
}
