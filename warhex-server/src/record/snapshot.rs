//! Match Snapshots
//!
//! A snapshot holds the whole match, generator state included, so a restored
//! match rolls exactly the dice the saved one would have.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::hash::StateHash;
use crate::game::state::Match;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Errors reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Binary encoding or decoding failed
    #[error("binary snapshot: {0}")]
    Binary(#[from] bincode::Error),
    /// JSON encoding or decoding failed
    #[error("json snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// Written by an incompatible version
    #[error("snapshot version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Version this build reads
        expected: u8,
        /// Version found in the data
        got: u8,
    },
}

/// Saved match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Format version
    pub version: u8,
    /// When the snapshot was taken
    pub saved_at: DateTime<Utc>,
    /// The match
    pub game: Match,
}

impl MatchSnapshot {
    /// Snapshot `game` now.
    pub fn capture(game: &Match) -> Self {
        Self { version: SNAPSHOT_VERSION, saved_at: Utc::now(), game: game.clone() }
    }

    /// State hash of the saved match.
    pub fn state_hash(&self) -> StateHash {
        self.game.compute_hash()
    }

    /// Serialize with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bincode, refusing other format versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(data)?;
        snapshot.check_version()
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON, refusing other format versions.
    pub fn from_json(data: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(data)?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch { expected: SNAPSHOT_VERSION, got: self.version });
        }
        Ok(self)
    }

    /// The match, ready to be driven again.
    ///
    /// Back-references are rebuilt and every player waits as a ghost until
    /// reconnected.
    pub fn restore(self) -> Match {
        let mut game = self.game;
        game.relink();
        game
    }
}
