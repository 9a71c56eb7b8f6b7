//! Match Records
//!
//! Persistence for matches in flight and replay of finished ones.
//!
//! - `snapshot`: full state save/restore (binary or JSON)
//! - `transcript`: initial state plus the accepted intents, verified by replay

pub mod snapshot;
pub mod transcript;

pub use snapshot::{MatchSnapshot, SnapshotError, SNAPSHOT_VERSION};
pub use transcript::{MatchTranscript, ReplayError, TRANSCRIPT_VERSION};
