//! Per-connection handler: request parsing, room resolution, and the
//! payload path.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. Control frames carry JSON requests; binary frames from an
//! attached connection are broadcast from its seat. The connection's
//! seat is released on every exit path.

use std::sync::Arc;

use bytes::Bytes;
use seatcast_protocol::{Codec, JsonCodec, Request, Response, SeatId, code};
use seatcast_room::{Room, RoomBuilder, RoomError, RoomStatus};
use seatcast_transport::{Connection, Frame, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::RelayError;
use crate::client::ChannelClient;
use crate::server::ServerState;

/// A connection's current seat: the room handle, the seat id, and the
/// writer task pumping broadcast payloads onto the socket.
struct SeatBinding {
    room: Room,
    seat_id: SeatId,
    writer: JoinHandle<()>,
}

/// Tracks the seat a connection is attached to and guarantees release.
///
/// `Drop` covers abnormal exits (handler error, panic): since `Drop` is
/// synchronous, it fires the detach as a task. Clean paths call
/// [`release`](Self::release) and await the detach instead.
struct SeatGuard {
    binding: Option<SeatBinding>,
}

impl SeatGuard {
    fn new() -> Self {
        Self { binding: None }
    }

    fn current(&self) -> Option<(Room, SeatId)> {
        self.binding
            .as_ref()
            .map(|b| (b.room.clone(), b.seat_id))
    }

    /// Takes over a new seat, releasing any prior one first.
    async fn bind(&mut self, room: Room, seat_id: SeatId, writer: JoinHandle<()>) {
        self.release().await;
        self.binding = Some(SeatBinding {
            room,
            seat_id,
            writer,
        });
    }

    /// Detaches the bound seat, if any. Returns whether one was bound.
    async fn release(&mut self) -> bool {
        let Some(binding) = self.binding.take() else {
            return false;
        };
        binding.writer.abort();
        if let Err(e) = binding.room.detach(binding.seat_id).await {
            // The room may already have stopped; the seat is gone
            // either way.
            tracing::debug!(error = %e, "detach on release failed");
        }
        true
    }
}

impl Drop for SeatGuard {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.writer.abort();
            tokio::spawn(async move {
                let _ = binding.room.detach(binding.seat_id).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), RelayError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let conn = Arc::new(conn);
    let mut guard = SeatGuard::new();

    let result = connection_loop(&conn, &state, &mut guard).await;

    guard.release().await;
    result
}

async fn connection_loop(
    conn: &Arc<WebSocketConnection>,
    state: &Arc<ServerState>,
    guard: &mut SeatGuard,
) -> Result<(), RelayError> {
    loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(conn_id = %conn.id(), "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(conn_id = %conn.id(), error = %e, "recv error");
                return Ok(());
            }
        };

        match frame {
            Frame::Control(data) => {
                let request: Request = match state.codec.decode(&data) {
                    Ok(req) => req,
                    Err(e) => {
                        tracing::debug!(
                            conn_id = %conn.id(),
                            error = %e,
                            "failed to decode request"
                        );
                        send_error(
                            conn,
                            &state.codec,
                            code::BAD_REQUEST,
                            "malformed request",
                        )
                        .await?;
                        continue;
                    }
                };
                handle_request(conn, state, guard, request).await?;
            }
            Frame::Payload(payload) => {
                handle_payload(conn, state, guard, payload).await?;
            }
        }
    }
}

async fn handle_request(
    conn: &Arc<WebSocketConnection>,
    state: &Arc<ServerState>,
    guard: &mut SeatGuard,
    request: Request,
) -> Result<(), RelayError> {
    match request {
        Request::RoomCreate => {
            let built = RoomBuilder::new()
                .config(state.room_config.clone())
                .registry(&state.registry)
                .build()
                .await;
            match built {
                Ok(room) => {
                    tokio::spawn({
                        let room = room.clone();
                        async move {
                            let _ = room.serve().await;
                        }
                    });
                    // Don't announce the room until the serve task has
                    // started, or a join racing the create response
                    // could find it not serving.
                    while room.status() == RoomStatus::Idle {
                        tokio::task::yield_now().await;
                    }
                    respond(
                        conn,
                        &state.codec,
                        &Response::RoomCreated {
                            room_id: room.id().clone(),
                        },
                    )
                    .await
                }
                Err(e) => {
                    send_error(conn, &state.codec, code::INTERNAL, &e.to_string())
                        .await
                }
            }
        }

        Request::RoomJoin { room_id } => {
            let Some(room) = state.registry.get_by_id(room_id.as_str()).await
            else {
                return send_error(
                    conn,
                    &state.codec,
                    code::NOT_FOUND,
                    &format!("room {room_id} not found"),
                )
                .await;
            };
            match room.claim_seat().await {
                Ok(seat_id) => {
                    respond(
                        conn,
                        &state.codec,
                        &Response::SeatClaimed { room_id, seat_id },
                    )
                    .await
                }
                Err(e) => {
                    send_error(conn, &state.codec, code_for(&e), &e.to_string())
                        .await
                }
            }
        }

        Request::RoomAttach { room_id, seat_id } => {
            let Some(room) = state.registry.get_by_id(room_id.as_str()).await
            else {
                return send_error(
                    conn,
                    &state.codec,
                    code::NOT_FOUND,
                    &format!("room {room_id} not found"),
                )
                .await;
            };

            let (client, payload_rx) = ChannelClient::new();
            match room.attach(seat_id, Box::new(client)).await {
                Ok(()) => {
                    let writer = spawn_payload_pump(Arc::clone(conn), payload_rx);
                    guard.bind(room, seat_id, writer).await;
                    respond(
                        conn,
                        &state.codec,
                        &Response::Attached { room_id, seat_id },
                    )
                    .await
                }
                Err(e) => {
                    send_error(conn, &state.codec, code_for(&e), &e.to_string())
                        .await
                }
            }
        }

        Request::RoomLeave => {
            if guard.release().await {
                respond(conn, &state.codec, &Response::Detached).await
            } else {
                send_error(
                    conn,
                    &state.codec,
                    code::BAD_REQUEST,
                    "no seat attached",
                )
                .await
            }
        }
    }
}

/// Broadcasts a binary frame from the connection's attached seat.
/// Success is silent; failures come back as error responses.
async fn handle_payload(
    conn: &Arc<WebSocketConnection>,
    state: &Arc<ServerState>,
    guard: &mut SeatGuard,
    payload: Bytes,
) -> Result<(), RelayError> {
    let Some((room, seat_id)) = guard.current() else {
        return send_error(
            conn,
            &state.codec,
            code::BAD_REQUEST,
            "no seat attached",
        )
        .await;
    };

    if let Err(e) = room.broadcast(seat_id, payload).await {
        // The fan-out already reached every healthy seat; only this
        // sender hears about the failure.
        send_error(conn, &state.codec, code_for(&e), &e.to_string()).await?;
    }
    Ok(())
}

/// Forwards broadcast payloads from the room to the socket until the
/// channel or the connection goes away.
fn spawn_payload_pump(
    conn: Arc<WebSocketConnection>,
    mut payload_rx: mpsc::UnboundedReceiver<Bytes>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = payload_rx.recv().await {
            if let Err(e) = conn.send_payload(payload).await {
                tracing::debug!(
                    conn_id = %conn.id(),
                    error = %e,
                    "payload pump ended"
                );
                break;
            }
        }
    })
}

fn code_for(err: &RoomError) -> u16 {
    match err {
        RoomError::RoomFull(_) | RoomError::NotServing(_) => code::GONE,
        RoomError::InvalidSeat { .. } | RoomError::SenderNotSeated { .. } => {
            code::BAD_REQUEST
        }
        _ => code::INTERNAL,
    }
}

async fn respond(
    conn: &Arc<WebSocketConnection>,
    codec: &JsonCodec,
    response: &Response,
) -> Result<(), RelayError> {
    let bytes = codec.encode(response)?;
    conn.send_control(&bytes).await?;
    Ok(())
}

async fn send_error(
    conn: &Arc<WebSocketConnection>,
    codec: &JsonCodec,
    code: u16,
    message: &str,
) -> Result<(), RelayError> {
    respond(
        conn,
        codec,
        &Response::Error {
            code,
            message: message.to_string(),
        },
    )
    .await
}
