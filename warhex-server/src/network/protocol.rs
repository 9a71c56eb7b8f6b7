//! Protocol Messages
//!
//! Messages exchanged between connections and the match host.
//! Serialized as JSON; framing is left to the transport.

use serde::{Deserialize, Serialize};

use crate::game::events::Report;
use crate::game::input::Intent;
use crate::game::phase::Phase;
use crate::game::state::{PlayerId, TeamId};
use crate::game::turn::Turn;

// =============================================================================
// CLIENT -> HOST MESSAGES
// =============================================================================

/// Messages a connection forwards to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A player declares an action.
    Intent {
        /// Acting player
        player: PlayerId,
        /// The action
        intent: Intent,
    },
    /// A player's connection came up.
    Connect {
        /// Player
        player: PlayerId,
    },
    /// A player's connection dropped.
    Disconnect {
        /// Player
        player: PlayerId,
    },
}

impl ClientMessage {
    /// Player the message speaks for.
    pub fn player(&self) -> PlayerId {
        match self {
            Self::Intent { player, .. } | Self::Connect { player } | Self::Disconnect { player } => *player,
        }
    }
}

// =============================================================================
// HOST -> CLIENT MESSAGES
// =============================================================================

/// Messages the host fans out to every connection.
///
/// Addressed messages carry their recipient; connections drop the ones
/// meant for someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// New report entries, already filtered for the recipient.
    Reports {
        /// Recipient
        player: PlayerId,
        /// Entries in order
        reports: Vec<Report>,
    },
    /// The match entered a new phase.
    PhaseChanged {
        /// Round
        round: u32,
        /// Phase entered
        phase: Phase,
    },
    /// Remaining turns of the current phase, next first.
    TurnQueue {
        /// Turns
        turns: Vec<Turn>,
    },
    /// An intent was refused.
    Rejected {
        /// Recipient
        player: PlayerId,
        /// Why
        reason: String,
    },
    /// The match is decided.
    GameOver {
        /// Winning team, `None` for a draw
        winner: Option<TeamId>,
        /// Deciding round
        round: u32,
        /// Reason
        reason: String,
    },
}

impl ServerMessage {
    /// Recipient of an addressed message, `None` for everyone.
    pub fn recipient(&self) -> Option<PlayerId> {
        match self {
            Self::Reports { player, .. } | Self::Rejected { player, .. } => Some(*player),
            _ => None,
        }
    }

    /// True when `player` should receive this message.
    pub fn is_for(&self, player: PlayerId) -> bool {
        self.recipient().map(|p| p == player).unwrap_or(true)
    }
}
