//! Room registry: a concurrency-safe directory of live rooms by id.

use std::collections::HashMap;

use seatcast_protocol::RoomId;
use tokio::sync::RwLock;

use crate::Room;

/// Maps room ids to room handles.
///
/// One reader-writer lock guards the whole map: lookups proceed
/// concurrently, insertions and removals are exclusive. The lock is
/// never held across a room command submission, so there is no ordering
/// hazard between the registry and any room's internals.
///
/// The registry is explicitly constructed and explicitly passed —
/// typically as an `Arc` shared by the transport layer and every room
/// built against it. It lives for the whole process.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts `room`, overwriting any entry with the same id.
    pub async fn add(&self, room: Room) {
        let mut rooms = self.rooms.write().await;
        tracing::debug!(room_id = %room.id(), "room added to registry");
        rooms.insert(room.id().clone(), room);
    }

    /// Looks up a room by id. A miss returns `None`; lookup never
    /// creates an entry and never blocks on room-internal state.
    pub async fn get_by_id(&self, id: &str) -> Option<Room> {
        self.rooms.read().await.get(id).cloned()
    }

    /// Removes the entry for `id` if present; no-op otherwise.
    pub async fn remove_by_id(&self, id: &str) {
        if self.rooms.write().await.remove(id).is_some() {
            tracing::debug!(room_id = %id, "room removed from registry");
        }
    }

    /// Number of registered rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Returns `true` when no rooms are registered.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Ids of all registered rooms.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.read().await.keys().cloned().collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
