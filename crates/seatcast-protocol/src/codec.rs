//! Codec trait and implementations for control messages.
//!
//! A codec converts control messages to and from bytes. The relay only
//! ships [`JsonCodec`]; the trait exists so a binary codec can slot in
//! without touching the handler.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes and decodes control messages.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, so control traffic can be inspected with any
/// WebSocket client during development.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Request, Response, RoomId, SeatId};

    #[test]
    fn test_json_codec_request_round_trip() {
        let codec = JsonCodec;
        let req = Request::RoomAttach {
            room_id: RoomId::from("r7"),
            seat_id: SeatId(2),
        };
        let bytes = codec.encode(&req).unwrap();
        let decoded: Request = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_json_codec_decode_garbage() {
        let codec = JsonCodec;
        let result: Result<Response, _> = codec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
