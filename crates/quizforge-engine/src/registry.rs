//! Room registry: creates, tracks, and looks up rooms by pin.
//!
//! The registry is the entry point for higher layers (HTTP handlers,
//! socket accept loops). It hands out cloned [`RoomHandle`]s so callers
//! never hold the map lock across an await on a room.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::RwLock;
use tracing::info;

use quizforge_protocol::{Question, RoomPin};

use crate::actor::{spawn_room, RoomHandle};
use crate::config::GameSettings;
use crate::error::EngineError;
use crate::room::Room;

/// Draws a six-digit join pin. Zero-padded, so "003217" is valid.
fn generate_pin() -> RoomPin {
    RoomPin::new(format!(
        "{n:06}",
        n = rand::rng().random_range(0..1_000_000u32)
    ))
}

/// Tracks all live rooms. Cloning shares the underlying map, so one
/// registry serves every connection task.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<RoomPin, RoomHandle>>>,
}

impl RoomRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room under a fresh random pin and spawns its actor.
    pub async fn create(
        &self,
        settings: GameSettings,
        questions: Vec<Question>,
    ) -> (RoomPin, RoomHandle) {
        let mut rooms = self.rooms.write().await;
        let pin = loop {
            let candidate = generate_pin();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle = spawn_room(Room::new(pin.clone(), settings, questions));
        rooms.insert(pin.clone(), handle.clone());
        info!(room_pin = %pin, rooms = rooms.len(), "room created");
        (pin, handle)
    }

    /// Creates a room under a caller-chosen pin.
    pub async fn create_with_pin(
        &self,
        pin: RoomPin,
        settings: GameSettings,
        questions: Vec<Question>,
    ) -> Result<RoomHandle, EngineError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&pin) {
            return Err(EngineError::DuplicatePin(pin));
        }
        let handle = spawn_room(Room::new(pin.clone(), settings, questions));
        rooms.insert(pin.clone(), handle.clone());
        info!(room_pin = %pin, rooms = rooms.len(), "room created");
        Ok(handle)
    }

    /// Looks up the handle for a pin.
    pub async fn get(&self, pin: &RoomPin) -> Result<RoomHandle, EngineError> {
        self.rooms
            .read()
            .await
            .get(pin)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(pin.clone()))
    }

    /// Shuts a room down and forgets it.
    pub async fn remove(&self, pin: &RoomPin) -> Result<(), EngineError> {
        let handle = {
            let mut rooms = self.rooms.write().await;
            rooms
                .remove(pin)
                .ok_or_else(|| EngineError::NotFound(pin.clone()))?
        };
        let _ = handle.shutdown().await;
        info!(room_pin = %pin, "room removed");
        Ok(())
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Lists the pins of all live rooms.
    pub async fn pins(&self) -> Vec<RoomPin> {
        self.rooms.read().await.keys().cloned().collect()
    }

    /// Shuts down every room. The registry stays usable afterwards.
    pub async fn shutdown_all(&self) {
        let drained: Vec<(RoomPin, RoomHandle)> = {
            let mut rooms = self.rooms.write().await;
            rooms.drain().collect()
        };
        for (pin, handle) in drained {
            let _ = handle.shutdown().await;
            info!(room_pin = %pin, "room removed");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
