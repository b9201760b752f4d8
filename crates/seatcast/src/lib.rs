//! # Seatcast
//!
//! A bounded-room broadcast relay. Clients join a room, claim one of
//! its numbered seats, attach their connection, and from then on any
//! occupant's binary frames are fanned out to every occupant.
//!
//! Each room is an isolated actor task that serializes seat allocation,
//! attachment, and broadcast; the shared [`RoomRegistry`] resolves
//! incoming requests to rooms. Idle rooms evict themselves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seatcast::prelude::*;
//!
//! # async fn run() -> Result<(), RelayError> {
//! let server = RelayServer::builder()
//!     .bind("0.0.0.0:8181")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! [`RoomRegistry`]: seatcast_room::RoomRegistry

mod client;
mod error;
mod handler;
mod server;

pub use client::ChannelClient;
pub use error::RelayError;
pub use server::{RelayServer, RelayServerBuilder};

/// One-stop imports for building and running a relay.
pub mod prelude {
    pub use crate::{ChannelClient, RelayError, RelayServer, RelayServerBuilder};
    pub use seatcast_protocol::{
        Codec, JsonCodec, Request, Response, RoomId, SeatId, code,
    };
    pub use seatcast_room::{
        ClientStream, Room, RoomBuilder, RoomConfig, RoomError, RoomRegistry,
        RoomStatus,
    };
    pub use seatcast_transport::{
        Connection, Frame, Transport, WebSocketTransport,
    };
}
