//! Transport abstraction layer for Seatcast.
//!
//! Provides the [`Transport`] and [`Connection`] traits the relay server
//! is written against, plus the WebSocket implementation. Control
//! messages and broadcast payloads share one connection but are kept
//! apart by frame type: control is text, payloads are binary.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

use bytes::Bytes;

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

/// One inbound frame, split by traffic class.
#[derive(Debug, Clone)]
pub enum Frame {
    /// A control message (request/response JSON).
    Control(Vec<u8>),
    /// An opaque broadcast payload.
    Payload(Bytes),
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection carrying control messages and payloads.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a control message to the remote peer.
    async fn send_control(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends an opaque broadcast payload to the remote peer.
    async fn send_payload(&self, payload: Bytes) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Frame>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "publisher");
        map.insert(ConnectionId::new(2), "subscriber");
        assert_eq!(map[&ConnectionId::new(1)], "publisher");
    }
}
