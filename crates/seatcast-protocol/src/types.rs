//! Core protocol types: identifiers and the control-message surface.
//!
//! Control messages are small JSON documents exchanged as text frames.
//! Broadcast payloads never appear here — they travel as opaque binary
//! frames and the relay does not decode them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A room's opaque identifier.
///
/// Generated by the room factory as `"r{n}"` with `n` drawn at random
/// from a large integer space. Treated as an opaque string everywhere
/// else; `#[serde(transparent)]` keeps the wire form a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lets maps keyed by `RoomId` be queried with a plain `&str`.
impl std::borrow::Borrow<str> for RoomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A seat number within a room, always in `1..=capacity`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SeatId(pub u32);

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Control messages
// ---------------------------------------------------------------------------

/// A client→server control request.
///
/// The `op` names keep the original dotted API surface (`room.create`,
/// `room.join`, ...) so the wire format reads the same as the HTTP
/// routes it replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    /// Create a new room and start serving it.
    #[serde(rename = "room.create")]
    RoomCreate,

    /// Claim a seat in an existing room.
    #[serde(rename = "room.join")]
    RoomJoin { room_id: RoomId },

    /// Bind this connection as the client for a claimed seat. After a
    /// successful attach the connection receives broadcast payloads as
    /// binary frames, and its own binary frames are broadcast from the
    /// attached seat.
    #[serde(rename = "room.attach")]
    RoomAttach { room_id: RoomId, seat_id: SeatId },

    /// Detach this connection from its seat, freeing it.
    #[serde(rename = "room.leave")]
    RoomLeave,
}

/// A server→client control response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Response {
    RoomCreated { room_id: RoomId },
    SeatClaimed { room_id: RoomId, seat_id: SeatId },
    Attached { room_id: RoomId, seat_id: SeatId },
    Detached,
    Error { code: u16, message: String },
}

/// Error codes carried by [`Response::Error`].
///
/// The numbering follows the HTTP statuses of the original API so
/// existing dashboards keep making sense.
pub mod code {
    /// Malformed or out-of-context request.
    pub const BAD_REQUEST: u16 = 400;
    /// Unknown room id.
    pub const NOT_FOUND: u16 = 404;
    /// The room exists but cannot take the request (full, not serving).
    pub const GONE: u16 = 410;
    /// Internal failure while handling the request.
    pub const INTERNAL: u16 = 500;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_display_and_as_str() {
        let id = RoomId::from("r123");
        assert_eq!(id.to_string(), "r123");
        assert_eq!(id.as_str(), "r123");
    }

    #[test]
    fn test_request_wire_format_keeps_dotted_ops() {
        let req = Request::RoomJoin {
            room_id: RoomId::from("r42"),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"op":"room.join","room_id":"r42"}"#);

        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn test_response_wire_format() {
        let resp = Response::SeatClaimed {
            room_id: RoomId::from("r1"),
            seat_id: SeatId(3),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"event":"seat_claimed","room_id":"r1","seat_id":3}"#
        );
    }

    #[test]
    fn test_unknown_op_fails_to_parse() {
        let result: Result<Request, _> =
            serde_json::from_str(r#"{"op":"room.destroy"}"#);
        assert!(result.is_err());
    }
}
