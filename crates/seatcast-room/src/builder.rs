//! Room factory: id generation and configured construction.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use seatcast_protocol::RoomId;

use crate::{Room, RoomConfig, RoomError, RoomRegistry};

/// Size of the random id space. Large enough that collisions among live
/// rooms are negligible; the builder still checks the registry to be
/// sure.
const ROOM_ID_SPACE: u64 = 1 << 53;

/// Bounded retries against a pathologically full registry.
const MAX_ID_ATTEMPTS: u32 = 8;

/// Builds a [`Room`] with a random id and an initialized seat table.
///
/// Configuration steps apply in order; if any fails, construction fails
/// and no partially registered room is left behind — registration with
/// the registry is always the last step.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Arc::new(RoomRegistry::new());
/// let room = RoomBuilder::new()
///     .registry(&registry)
///     .build()
///     .await?;
/// tokio::spawn({
///     let room = room.clone();
///     async move { room.serve().await }
/// });
/// ```
pub struct RoomBuilder {
    config: RoomConfig,
    registry: Option<Arc<RoomRegistry>>,
}

impl RoomBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: RoomConfig::default(),
            registry: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RoomConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the seat capacity.
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Sets the idle-eviction check period.
    pub fn idle_check_interval(mut self, period: Duration) -> Self {
        self.config.idle_check_interval = period;
        self
    }

    /// Binds the room to `registry`: the id uniqueness check runs
    /// against it, the built room self-registers into it, and the room
    /// deregisters itself on stop.
    pub fn registry(mut self, registry: &Arc<RoomRegistry>) -> Self {
        self.registry = Some(Arc::clone(registry));
        self
    }

    /// Builds the room: all seats vacant, allocation hint at 1, not yet
    /// serving.
    pub async fn build(self) -> Result<Room, RoomError> {
        if self.config.capacity == 0 {
            return Err(RoomError::Config("capacity must be positive".into()));
        }

        let id = self.unique_id().await?;
        let room = Room::new(
            id,
            self.config,
            self.registry.as_ref().map(Arc::downgrade),
        );

        if let Some(registry) = &self.registry {
            registry.add(room.clone()).await;
        }

        tracing::info!(
            room_id = %room.id(),
            capacity = room.capacity(),
            "room created"
        );
        Ok(room)
    }

    async fn unique_id(&self) -> Result<RoomId, RoomError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let n: u64 = rand::rng().random_range(0..ROOM_ID_SPACE);
            let id = RoomId(format!("r{n}"));
            match &self.registry {
                Some(registry) if registry.get_by_id(id.as_str()).await.is_some() => {
                    tracing::debug!(room_id = %id, "room id collision, retrying");
                }
                _ => return Ok(id),
            }
        }
        Err(RoomError::Config(format!(
            "no unique room id after {MAX_ID_ATTEMPTS} attempts"
        )))
    }
}

impl Default for RoomBuilder {
    fn default() -> Self {
        Self::new()
    }
}
