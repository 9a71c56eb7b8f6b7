//! Game Logic Module
//!
//! The deterministic engine. Nothing here touches the clock, the network or
//! a hash map; every die comes from the match's seeded generator.
//!
//! ## Module Structure
//!
//! - `state`, `unit`, `board`: the match model
//! - `options`: rule switches
//! - `events`: the report log
//! - `input`: player intents and the intent log
//! - `phase`, `turn`: the phase table and turn queue
//! - `initiative`, `scheduler`: who acts next
//! - `psr`: piloting skill rolls
//! - `movement`, `combat`: the resolvers
//! - `deploy`, `end_phase`: setup actions and round bookkeeping
//! - `visibility`: per-viewer filtering
//! - `orchestrator`: the state machine that ties it together

pub mod board;
pub mod combat;
pub mod deploy;
pub mod end_phase;
pub mod events;
pub mod initiative;
pub mod input;
pub mod movement;
pub mod options;
pub mod orchestrator;
pub mod phase;
pub mod psr;
pub mod scheduler;
pub mod state;
pub mod turn;
pub mod unit;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testkit;

// Re-export key types
pub use events::{Report, ReportKind};
pub use input::{Intent, MovePath, MoveStep};
pub use options::GameOptions;
pub use orchestrator::{IntentError, Orchestrator};
pub use phase::Phase;
pub use state::{Match, Player, PlayerId, TeamId};
pub use turn::Turn;
pub use unit::{Unit, UnitId};
