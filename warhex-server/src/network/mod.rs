//! Network Layer
//!
//! The point where concurrent connections meet the single-threaded engine.
//! This layer is **non-deterministic**; all game logic runs through `game/`.

pub mod host;
pub mod protocol;

pub use host::{HostConfig, HostError, HostHandle, MatchHost};
pub use protocol::{ClientMessage, ServerMessage};
