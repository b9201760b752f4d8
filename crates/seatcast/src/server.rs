//! `RelayServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room. Each accepted
//! connection gets its own handler task; rooms are resolved through the
//! shared registry.

use std::sync::Arc;

use seatcast_protocol::JsonCodec;
use seatcast_room::{RoomConfig, RoomRegistry};
use seatcast_transport::{Transport, WebSocketTransport};

use crate::RelayError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) registry: Arc<RoomRegistry>,
    pub(crate) room_config: RoomConfig,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,ignore
/// use seatcast::prelude::*;
///
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:8181")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    registry: Option<Arc<RoomRegistry>>,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8181".to_string(),
            room_config: RoomConfig::default(),
            registry: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration applied to every room this server
    /// creates.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Uses an externally constructed registry instead of a private
    /// one, e.g. to share it with an observer.
    pub fn registry(mut self, registry: &Arc<RoomRegistry>) -> Self {
        self.registry = Some(Arc::clone(registry));
        self
    }

    /// Builds the server, binding the WebSocket transport.
    pub async fn build(self) -> Result<RelayServer, RelayError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(RoomRegistry::new())),
            room_config: self.room_config,
            codec: JsonCodec,
        });

        Ok(RelayServer { transport, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the registry this server resolves rooms through.
    pub fn registry(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!("seatcast relay running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
