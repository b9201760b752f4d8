//! Room lifecycle, seat allocation, and broadcast fan-out for Seatcast.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! seat table and serializes every mutation. The registry is the
//! concurrency-safe directory used to resolve requests to a room.
//!
//! # Key types
//!
//! - [`Room`] — handle to a room actor; submit commands to it
//! - [`RoomBuilder`] — constructs rooms with random ids
//! - [`RoomRegistry`] — directory of live rooms by id
//! - [`ClientStream`] — the write/flush capability bound to a seat
//! - [`RoomStatus`] — lifecycle state machine
//! - [`RoomConfig`] — room settings (capacity, idle eviction, ...)

mod builder;
mod client;
mod config;
mod error;
mod registry;
mod room;

pub use builder::RoomBuilder;
pub use client::ClientStream;
pub use config::{DEFAULT_CAPACITY, DEFAULT_IDLE_CHECK_INTERVAL, RoomConfig, RoomStatus};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Room, RoomInfo};
