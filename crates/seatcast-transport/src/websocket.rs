//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Frame mapping: text frames carry control JSON, binary frames carry
//! opaque broadcast payloads. Ping/pong is left to the library.
//!
//! The socket is split into sink and stream halves behind separate
//! locks, so a writer task can push broadcast payloads while another
//! task sits in `recv` — a receive in progress must never block
//! outbound delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Frame, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            sink: Arc::new(Mutex::new(sink)),
            stream: Arc::new(Mutex::new(stream)),
        })
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Arc<Mutex<SplitSink<WsStream, Message>>>,
    stream: Arc<Mutex<SplitStream<WsStream>>>,
}

impl WebSocketConnection {
    async fn send_message(&self, msg: Message) -> Result<(), TransportError> {
        use futures_util::SinkExt;
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send_control(&self, data: &[u8]) -> Result<(), Self::Error> {
        let text = String::from_utf8(data.to_vec()).map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))
        })?;
        self.send_message(Message::Text(text.into())).await
    }

    async fn send_payload(&self, payload: Bytes) -> Result<(), Self::Error> {
        self.send_message(Message::Binary(payload)).await
    }

    async fn recv(&self) -> Result<Option<Frame>, Self::Error> {
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Frame::Control(text.as_bytes().to_vec())));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Frame::Payload(data)));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
