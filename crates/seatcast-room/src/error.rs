//! Error types for the room layer.

use seatcast_protocol::{RoomId, SeatId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// `serve` was called on a room that is already serving, or that
    /// has stopped. A room instance serves at most once.
    #[error("room {0} already started")]
    AlreadyStarted(RoomId),

    /// No vacant seat left to claim.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Broadcast requested from a seat with no bound client.
    #[error("seat {seat} in room {room} has no client attached")]
    SenderNotSeated { room: RoomId, seat: SeatId },

    /// The seat id is outside `1..=capacity`.
    #[error("seat {seat} is out of range for room {room}")]
    InvalidSeat { room: RoomId, seat: SeatId },

    /// A command was submitted to a room whose worker is not running —
    /// either not started yet or already stopped.
    #[error("room {0} is not serving")]
    NotServing(RoomId),

    /// At least one client write failed during a broadcast. The fan-out
    /// still reached every other occupied seat; `seat` names the last
    /// seat that failed.
    #[error("broadcast write to seat {seat} failed: {source}")]
    BroadcastWrite {
        seat: SeatId,
        #[source]
        source: std::io::Error,
    },

    /// The room could not be built from the given configuration.
    #[error("invalid room configuration: {0}")]
    Config(String),
}
