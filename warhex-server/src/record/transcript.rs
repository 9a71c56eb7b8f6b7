//! Match Transcripts
//!
//! A transcript is the match as it stood before play plus every action the
//! orchestrator accepted, each with the state hash it produced. Replaying
//! the actions against the initial state must reproduce every hash.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::hash::StateHash;
use crate::game::input::{IntentLog, IntentRecord, LoggedAction};
use crate::game::orchestrator::{IntentError, Orchestrator};
use crate::game::state::Match;

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Errors that can occur while reading or replaying a transcript.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Transcript version mismatch
    #[error("transcript version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Expected version
        expected: u8,
        /// Actual version
        got: u8,
    },
    /// An action accepted live was refused on replay
    #[error("record {seq} was refused on replay: {source}")]
    Refused {
        /// Record sequence number
        seq: u32,
        /// Refusal
        #[source]
        source: IntentError,
    },
    /// Replay produced a different state
    #[error("state diverged at record {seq}")]
    Diverged {
        /// Record sequence number
        seq: u32,
        /// Hash in the transcript
        expected: StateHash,
        /// Hash computed on replay
        computed: StateHash,
    },
    /// Records out of order or missing
    #[error("record {got} found where {expected} was expected")]
    OutOfOrder {
        /// Expected sequence number
        expected: u32,
        /// Sequence number found
        got: u32,
    },
    /// Binary encoding failed
    #[error("transcript encoding: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Complete record of a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchTranscript {
    /// Version for forward compatibility.
    pub version: u8,
    /// Generator seed the match started from.
    pub seed: u64,
    /// The match before the first action.
    pub initial: Match,
    /// Accepted actions in order.
    pub records: Vec<IntentRecord>,
}

impl MatchTranscript {
    /// Empty transcript starting from `initial`.
    pub fn new(initial: Match) -> Self {
        Self { version: TRANSCRIPT_VERSION, seed: initial.rng_seed, initial, records: Vec::new() }
    }

    /// Transcript of everything in `log`, played from `initial`.
    pub fn from_log(initial: Match, log: &IntentLog) -> Self {
        let mut transcript = Self::new(initial);
        transcript.records = log.records().to_vec();
        transcript
    }

    /// Hash the match should end on, or the initial hash for an empty transcript.
    pub fn final_hash(&self) -> StateHash {
        self.records.last().map(|r| r.state_hash).unwrap_or_else(|| self.initial.compute_hash())
    }

    /// Number of recorded actions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes, refusing other versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReplayError> {
        let transcript: Self = bincode::deserialize(data)?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(ReplayError::VersionMismatch { expected: TRANSCRIPT_VERSION, got: transcript.version });
        }
        Ok(transcript)
    }

    /// Replay every record with the standard rules, checking each hash.
    ///
    /// Returns the orchestrator in the state the last record left it.
    pub fn replay(&self) -> Result<Orchestrator, ReplayError> {
        self.replay_with(Orchestrator::new(self.initial.clone()))
    }

    /// Replay onto a caller-built orchestrator (custom resolvers).
    pub fn replay_with(&self, mut orc: Orchestrator) -> Result<Orchestrator, ReplayError> {
        if self.version != TRANSCRIPT_VERSION {
            return Err(ReplayError::VersionMismatch { expected: TRANSCRIPT_VERSION, got: self.version });
        }
        for (expected, record) in self.records.iter().enumerate() {
            let expected = expected as u32;
            if record.seq != expected {
                return Err(ReplayError::OutOfOrder { expected, got: record.seq });
            }
            let applied = match &record.action {
                LoggedAction::Intent(intent) => orc.submit_intent(record.player, intent.clone()),
                LoggedAction::Connection(connected) => orc.set_connected(record.player, *connected),
            };
            applied.map_err(|source| ReplayError::Refused { seq: record.seq, source })?;

            let computed = orc.state_hash();
            if computed != record.state_hash {
                return Err(ReplayError::Diverged { seq: record.seq, expected: record.state_hash, computed });
            }
            debug!(seq = record.seq, hash = %hex::encode(&computed[..4]), "record verified");
        }
        info!(records = self.records.len(), round = orc.game().round, "transcript verified");
        Ok(orc)
    }
}
