//! Room lifecycle management for Quizforge.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! game: its players, question list, mode state, and phase timer. The
//! game rules themselves live in synchronous code, so the whole flow is
//! testable without a runtime.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms, looks them up by pin
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`GameSettings`]: per-room configuration, including the game mode
//! - [`RoomState`]: the Lobby / Question / Finished lifecycle
//! - [`RoomSnapshot`]: room metadata for lobby screens and admin views

mod actor;
mod config;
mod dispatch;
mod error;
mod modes;
mod outbox;
mod registry;
mod room;
#[cfg(test)]
mod testkit;
mod timer;

pub use actor::{EventSender, RoomHandle, RoomSnapshot};
pub use config::{GameSettings, RoomState};
pub use error::EngineError;
pub use registry::RoomRegistry;
