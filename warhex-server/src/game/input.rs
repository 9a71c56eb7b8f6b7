//! Player Intents
//!
//! Everything a player can ask the engine to do, and the ordered log of
//! accepted intents that drives replay.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::core::hex::{Facing, HexCoord};
use crate::game::board::MinefieldKind;
use crate::game::combat::attack::{AttackAction, ToHit};
use crate::game::state::PlayerId;
use crate::game::unit::UnitId;

// =============================================================================
// MOVEMENT PATHS
// =============================================================================

/// One step of a planned move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStep {
    /// Enter the hex ahead
    Forward,
    /// Enter the hex behind without turning
    Backward,
    /// Rotate one hexside counter-clockwise
    TurnLeft,
    /// Rotate one hexside clockwise
    TurnRight,
    /// Sidestep to the front-left hex
    LateralLeft,
    /// Sidestep to the front-right hex
    LateralRight,
    /// Begin a jump (must be the first step)
    StartJump,
    /// Climb one level inside a building or out of water
    Up,
    /// Descend one level
    Down,
    /// Stand up from prone
    GetUp,
    /// Drop prone
    GoProne,
    /// Take a friendly unit in the same hex aboard
    Load(UnitId),
    /// Drop a carried unit into the current hex
    Unload(UnitId),
    /// Ram an adjacent unit
    Charge {
        /// Unit rammed
        target: UnitId,
        /// Pre-computed to-hit number
        to_hit: ToHit,
    },
    /// Land on an adjacent unit at the end of a jump
    Dfa {
        /// Unit landed on
        target: UnitId,
        /// Pre-computed to-hit number
        to_hit: ToHit,
    },
}

impl MoveStep {
    /// Steps that end the path when reached.
    pub fn ends_path(&self) -> bool {
        matches!(
            self,
            MoveStep::Load(_) | MoveStep::Unload(_) | MoveStep::Charge { .. } | MoveStep::Dfa { .. }
        )
    }
}

/// Ordered steps for one unit's move.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePath {
    /// Steps in order
    pub steps: Vec<MoveStep>,
}

impl MovePath {
    /// Path from steps.
    pub fn new(steps: Vec<MoveStep>) -> Self {
        Self { steps }
    }

    /// True when the path starts with a jump.
    pub fn is_jump(&self) -> bool {
        self.steps.first() == Some(&MoveStep::StartJump)
    }

    /// Stay in place.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// =============================================================================
// INTENTS
// =============================================================================

/// A minefield a player wants to lay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinefieldPlacement {
    /// Hex
    pub coords: HexCoord,
    /// Variety
    pub kind: MinefieldKind,
    /// Damage on detonation (5 to 30, in steps of 5)
    pub density: u32,
}

/// Declared player action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Move a unit along a path
    Move {
        /// Unit moving
        unit: UnitId,
        /// Planned path
        path: MovePath,
    },
    /// Declare attacks for a unit
    Attack {
        /// Attacking unit
        unit: UnitId,
        /// Attacks in declaration order
        actions: Vec<AttackAction>,
    },
    /// Place a unit on the board
    Deploy {
        /// Unit entering
        unit: UnitId,
        /// Hex
        coords: HexCoord,
        /// Facing
        facing: Facing,
        /// Units loaded aboard
        loaded: Vec<UnitId>,
        /// Drop from the air
        assault_drop: bool,
    },
    /// Lay minefields
    DeployMinefields {
        /// Fields to lay
        minefields: Vec<MinefieldPlacement>,
    },
    /// Pre-designate artillery auto-hit hexes
    SetArtilleryAutoHitHexes {
        /// Hexes
        hexes: Vec<HexCoord>,
    },
    /// Unload passengers from an immobile carrier
    UnloadStranded {
        /// Passengers to unload
        units: Vec<UnitId>,
    },
    /// Declare (or withdraw) readiness to leave the current phase
    PlayerReady(bool),
    /// Ask for a tactical-genius initiative reroll
    RerollInitiative,
    /// Skip a turn that is stuck on a ghost or empty holder
    SkipTurn,
}

impl Intent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Move { .. } => "move",
            Intent::Attack { .. } => "attack",
            Intent::Deploy { .. } => "deploy",
            Intent::DeployMinefields { .. } => "deploy_minefields",
            Intent::SetArtilleryAutoHitHexes { .. } => "set_artillery_autohit",
            Intent::UnloadStranded { .. } => "unload_stranded",
            Intent::PlayerReady(_) => "player_ready",
            Intent::RerollInitiative => "reroll_initiative",
            Intent::SkipTurn => "skip_turn",
        }
    }

    /// Unit the intent acts with, when it names one.
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Intent::Move { unit, .. } | Intent::Attack { unit, .. } | Intent::Deploy { unit, .. } => Some(*unit),
            _ => None,
        }
    }
}

// =============================================================================
// INTENT LOG
// =============================================================================

/// Something the orchestrator accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoggedAction {
    /// An intent
    Intent(Intent),
    /// A player connected or disconnected
    Connection(bool),
}

/// One accepted action with the state hash it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRecord {
    /// Order of acceptance (starts at 0)
    pub seq: u32,
    /// Submitting player
    pub player: PlayerId,
    /// Action
    pub action: LoggedAction,
    /// Match state hash after applying the action
    pub state_hash: StateHash,
}

/// Ordered log of accepted actions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentLog {
    records: Vec<IntentRecord>,
}

impl IntentLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an accepted action.
    pub fn record(&mut self, player: PlayerId, action: LoggedAction, state_hash: StateHash) {
        let seq = self.records.len() as u32;
        self.records.push(IntentRecord { seq, player, action, state_hash });
    }

    /// Records in order.
    pub fn records(&self) -> &[IntentRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was accepted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hash over the whole log (order-sensitive).
    pub fn digest(&self) -> StateHash {
        let mut hasher = StateHasher::for_intent_log();
        for record in &self.records {
            hasher.update_u32(record.seq);
            hasher.update_u32(record.player.0);
            hasher.update_bytes(&record.state_hash);
        }
        hasher.finalize()
    }
}
