//! Integration tests for the relay server: real WebSocket clients
//! creating rooms, claiming seats, and streaming payloads end to end.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use seatcast::prelude::*;
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port and returns the address.
async fn start_server(room_config: RoomConfig) -> String {
    let server = RelayServer::builder()
        .bind("127.0.0.1:0")
        .room_config(room_config)
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_request(ws: &mut ClientWs, request: &Request) {
    let json = serde_json::to_string(request).expect("encode request");
    ws.send(Message::Text(json.into())).await.expect("send request");
}

/// Reads frames until a control response arrives.
async fn read_response(ws: &mut ClientWs) -> Response {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("response should arrive")
            .expect("stream should stay open")
            .expect("frame should decode");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("decode response");
            }
            Message::Binary(_) => panic!("expected control frame, got payload"),
            _ => continue,
        }
    }
}

/// Reads frames until a broadcast payload arrives.
async fn read_payload(ws: &mut ClientWs) -> Vec<u8> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("payload should arrive")
            .expect("stream should stay open")
            .expect("frame should decode");
        match msg {
            Message::Binary(data) => return data.to_vec(),
            Message::Text(text) => panic!("expected payload, got control: {text}"),
            _ => continue,
        }
    }
}

async fn create_room(ws: &mut ClientWs) -> RoomId {
    send_request(ws, &Request::RoomCreate).await;
    match read_response(ws).await {
        Response::RoomCreated { room_id } => room_id,
        other => panic!("expected room_created, got {other:?}"),
    }
}

async fn join_room(ws: &mut ClientWs, room_id: &RoomId) -> SeatId {
    send_request(
        ws,
        &Request::RoomJoin {
            room_id: room_id.clone(),
        },
    )
    .await;
    match read_response(ws).await {
        Response::SeatClaimed { seat_id, .. } => seat_id,
        other => panic!("expected seat_claimed, got {other:?}"),
    }
}

async fn attach(ws: &mut ClientWs, room_id: &RoomId, seat_id: SeatId) {
    send_request(
        ws,
        &Request::RoomAttach {
            room_id: room_id.clone(),
            seat_id,
        },
    )
    .await;
    match read_response(ws).await {
        Response::Attached { .. } => {}
        other => panic!("expected attached, got {other:?}"),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_and_join_assigns_sequential_seats() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr).await;

    let room_id = create_room(&mut ws).await;
    assert!(room_id.as_str().starts_with('r'));

    assert_eq!(join_room(&mut ws, &room_id).await, SeatId(1));
    assert_eq!(join_room(&mut ws, &room_id).await, SeatId(2));
}

#[tokio::test]
async fn test_join_unknown_room_not_found() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr).await;

    send_request(
        &mut ws,
        &Request::RoomJoin {
            room_id: RoomId::from("r0"),
        },
    )
    .await;

    match read_response(&mut ws).await {
        Response::Error { code: c, .. } => assert_eq!(c, code::NOT_FOUND),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_broadcast_relays_to_every_attached_connection() {
    let addr = start_server(RoomConfig::default()).await;

    let mut sender = connect(&addr).await;
    let room_id = create_room(&mut sender).await;
    let sender_seat = join_room(&mut sender, &room_id).await;
    attach(&mut sender, &room_id, sender_seat).await;

    let mut receiver = connect(&addr).await;
    let receiver_seat = join_room(&mut receiver, &room_id).await;
    assert_ne!(sender_seat, receiver_seat);
    attach(&mut receiver, &room_id, receiver_seat).await;

    sender
        .send(Message::Binary(b"hello room".to_vec().into()))
        .await
        .expect("send payload");

    // Delivery includes the sender's own seat.
    assert_eq!(read_payload(&mut sender).await, b"hello room");
    assert_eq!(read_payload(&mut receiver).await, b"hello room");
}

#[tokio::test]
async fn test_payload_without_attach_is_rejected() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Binary(b"orphan".to_vec().into()))
        .await
        .expect("send payload");

    match read_response(&mut ws).await {
        Response::Error { code: c, .. } => assert_eq!(c, code::BAD_REQUEST),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_full_room_is_gone() {
    let config = RoomConfig {
        capacity: 2,
        ..RoomConfig::default()
    };
    let addr = start_server(config).await;
    let mut ws = connect(&addr).await;

    let room_id = create_room(&mut ws).await;
    join_room(&mut ws, &room_id).await;
    join_room(&mut ws, &room_id).await;

    send_request(
        &mut ws,
        &Request::RoomJoin {
            room_id: room_id.clone(),
        },
    )
    .await;
    match read_response(&mut ws).await {
        Response::Error { code: c, message } => {
            assert_eq!(c, code::GONE);
            assert!(message.contains("full"));
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_attach_out_of_range_seat_is_rejected() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr).await;

    let room_id = create_room(&mut ws).await;
    send_request(
        &mut ws,
        &Request::RoomAttach {
            room_id: room_id.clone(),
            seat_id: SeatId(99),
        },
    )
    .await;

    match read_response(&mut ws).await {
        Response::Error { code: c, .. } => assert_eq!(c, code::BAD_REQUEST),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_leave_frees_the_seat() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr).await;

    let room_id = create_room(&mut ws).await;
    let seat = join_room(&mut ws, &room_id).await;
    assert_eq!(seat, SeatId(1));
    attach(&mut ws, &room_id, seat).await;

    send_request(&mut ws, &Request::RoomLeave).await;
    match read_response(&mut ws).await {
        Response::Detached => {}
        other => panic!("expected detached, got {other:?}"),
    }

    // The freed seat is preferred on the next claim.
    assert_eq!(join_room(&mut ws, &room_id).await, SeatId(1));
}

#[tokio::test]
async fn test_leave_without_seat_is_rejected() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr).await;

    send_request(&mut ws, &Request::RoomLeave).await;
    match read_response(&mut ws).await {
        Response::Error { code: c, .. } => assert_eq!(c, code::BAD_REQUEST),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_frees_the_seat() {
    let addr = start_server(RoomConfig::default()).await;

    let mut first = connect(&addr).await;
    let room_id = create_room(&mut first).await;
    let seat = join_room(&mut first, &room_id).await;
    attach(&mut first, &room_id, seat).await;

    first.close(None).await.expect("close");
    drop(first);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut second = connect(&addr).await;
    assert_eq!(join_room(&mut second, &room_id).await, SeatId(1));
}

#[tokio::test]
async fn test_created_room_appears_in_shared_registry() {
    let registry = Arc::new(RoomRegistry::new());
    let server = RelayServer::builder()
        .bind("127.0.0.1:0")
        .registry(&registry)
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let mut ws = connect(&addr).await;
    let room_id = create_room(&mut ws).await;

    assert!(registry.get_by_id(room_id.as_str()).await.is_some());
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_idle_room_disappears_from_server() {
    let config = RoomConfig {
        idle_check_interval: Duration::from_millis(50),
        ..RoomConfig::default()
    };
    let addr = start_server(config).await;
    let mut ws = connect(&addr).await;

    let room_id = create_room(&mut ws).await;

    // Nobody ever claims a seat; the room evicts itself and leaves the
    // registry, so a later join finds nothing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    send_request(
        &mut ws,
        &Request::RoomJoin {
            room_id: room_id.clone(),
        },
    )
    .await;
    match read_response(&mut ws).await {
        Response::Error { code: c, .. } => assert_eq!(c, code::NOT_FOUND),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_request_is_rejected() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json".into()))
        .await
        .expect("send");

    match read_response(&mut ws).await {
        Response::Error { code: c, .. } => assert_eq!(c, code::BAD_REQUEST),
        other => panic!("expected error, got {other:?}"),
    }

    // The connection survives a bad request.
    let room_id = create_room(&mut ws).await;
    assert!(!room_id.as_str().is_empty());
}
