//! # Warhex Server
//!
//! Authoritative rules core for turn-based hex-grid armored combat.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WARHEX SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Seeded Xorshift128+ dice                  │
//! │  ├── hash.rs     - State hashing for verification            │
//! │  └── hex.rs      - Hex coordinates and facings               │
//! │                                                              │
//! │  game/           - Rules engine (deterministic)              │
//! │  ├── state.rs    - Match, players, teams                     │
//! │  ├── unit.rs     - Units, locations, equipment               │
//! │  ├── phase.rs    - Phase table                               │
//! │  ├── scheduler.rs- Turn order                                │
//! │  ├── movement/   - Movement resolver                         │
//! │  ├── combat/     - Attack and damage resolver                │
//! │  └── orchestrator.rs - Phase state machine                   │
//! │                                                              │
//! │  record/         - Snapshots and replayable transcripts      │
//! │                                                              │
//! │  network/        - Match host actor (non-deterministic)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - Every die comes from the match's seeded generator
//!
//! Given the same initial match and the same accepted intents, a replay
//! produces identical reports and state hashes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod record;

// Re-export commonly used types
pub use core::hex::{Facing, HexCoord};
pub use core::rng::DeterministicRng;
pub use game::{GameOptions, Intent, IntentError, Match, Orchestrator, Phase, PlayerId, TeamId, UnitId};
pub use network::{HostConfig, HostHandle, MatchHost};
pub use record::{MatchSnapshot, MatchTranscript};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
