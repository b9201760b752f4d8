//! Wire protocol for Seatcast.
//!
//! This crate defines the language clients and the relay speak:
//!
//! - **Types** ([`RoomId`], [`SeatId`], [`Request`], [`Response`]) —
//!   identifiers and the control-message surface.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how control messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! Broadcast payloads are deliberately absent: the relay treats them as
//! opaque byte sequences and this crate never decodes them.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Request, Response, RoomId, SeatId, code};
