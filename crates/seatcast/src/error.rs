//! Unified error type for the relay server.

use seatcast_protocol::ProtocolError;
use seatcast_room::RoomError;
use seatcast_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid request).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not serving, invalid seat).
    #[error(transparent)]
    Room(#[from] RoomError),
}
