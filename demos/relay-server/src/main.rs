//! Standalone broadcast relay server.
//!
//! Run with: `cargo run -p relay-server [BIND_ADDR]` (default
//! `0.0.0.0:8181`).
//!
//! Talk to it with any WebSocket client:
//!
//! ```text
//! > {"op":"room.create"}
//! < {"event":"room_created","room_id":"r1234567890"}
//! > {"op":"room.join","room_id":"r1234567890"}
//! < {"event":"seat_claimed","room_id":"r1234567890","seat_id":1}
//! > {"op":"room.attach","room_id":"r1234567890","seat_id":1}
//! < {"event":"attached","room_id":"r1234567890","seat_id":1}
//! ```
//!
//! After attaching, binary frames you send are fanned out to every
//! attached seat in the room, your own included.

use std::sync::Arc;

use seatcast::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8181".to_string());

    let registry = Arc::new(RoomRegistry::new());
    let server = RelayServer::builder()
        .bind(&bind_addr)
        .registry(&registry)
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, "relay listening");

    server.run().await?;
    Ok(())
}
