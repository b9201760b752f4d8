//! Integration tests for the WebSocket transport: a real server and
//! client exchanging control (text) and payload (binary) frames.

#[cfg(feature = "websocket")]
mod websocket {
    use bytes::Bytes;
    use seatcast_transport::{Connection, Frame, Transport, WebSocketTransport};

    async fn connect_client(
        addr: &str,
    ) -> tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    > {
        let url = format!("ws://{addr}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    /// Binds on port 0, returns the transport and the resolved address.
    async fn bind_transport() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    #[tokio::test]
    async fn test_frames_split_by_traffic_class() {
        let (mut transport, addr) = bind_transport().await;

        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::tungstenite::Message;

        // Client text frame → Control.
        client_ws
            .send(Message::Text(r#"{"op":"room.create"}"#.into()))
            .await
            .unwrap();
        match server_conn.recv().await.unwrap() {
            Some(Frame::Control(data)) => {
                assert_eq!(data, br#"{"op":"room.create"}"#);
            }
            other => panic!("expected Control frame, got {other:?}"),
        }

        // Client binary frame → Payload.
        client_ws
            .send(Message::Binary(b"raw payload".to_vec().into()))
            .await
            .unwrap();
        match server_conn.recv().await.unwrap() {
            Some(Frame::Payload(data)) => {
                assert_eq!(data.as_ref(), b"raw payload");
            }
            other => panic!("expected Payload frame, got {other:?}"),
        }

        // Server control → client text frame.
        server_conn
            .send_control(br#"{"event":"detached"}"#)
            .await
            .expect("send_control should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_data().as_ref(), br#"{"event":"detached"}"#);

        // Server payload → client binary frame.
        server_conn
            .send_payload(Bytes::from_static(b"fanned out"))
            .await
            .expect("send_payload should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
        assert_eq!(msg.into_data().as_ref(), b"fanned out");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind_transport().await;

        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        use futures_util::SinkExt;
        use tokio_tungstenite::tungstenite::Message;
        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }
}
