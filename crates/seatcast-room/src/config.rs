//! Room configuration and lifecycle state.

use std::time::Duration;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Default number of seats in a room.
pub const DEFAULT_CAPACITY: u32 = 8;

/// Default period of the idle-eviction check.
pub const DEFAULT_IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(180);

/// Default command channel size for room workers.
const DEFAULT_COMMAND_BUFFER: usize = 64;

/// Configuration for a room instance. Immutable after construction.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Number of seats, numbered `1..=capacity`. Must be positive.
    pub capacity: u32,

    /// How often the worker checks for an empty room. A check that
    /// finds every seat vacant stops the room.
    pub idle_check_interval: Duration,

    /// Command channel size. When the channel fills up, callers wait
    /// (bounded channel backpressure).
    pub command_buffer: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            idle_check_interval: DEFAULT_IDLE_CHECK_INTERVAL,
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Idle → Serving → Stopped
/// ```
///
/// - **Idle**: built, seat table initialized, worker not yet running.
/// - **Serving**: the worker loop is processing commands.
/// - **Stopped**: the worker terminated (explicit stop or idle
///   eviction). Terminal — a room instance serves at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Idle,
    Serving,
    Stopped,
}

impl RoomStatus {
    /// Returns `true` if the worker loop is running and commands can be
    /// submitted.
    pub fn is_serving(&self) -> bool {
        matches!(self, Self::Serving)
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Serving => 1,
            Self::Stopped => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Serving,
            _ => Self::Stopped,
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Serving => write!(f, "Serving"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}
