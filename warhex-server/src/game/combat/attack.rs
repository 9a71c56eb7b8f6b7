//! Attack declarations.
//!
//! Declarations arrive with their to-hit number already computed; the
//! resolvers only roll against it.

use serde::{Serialize, Deserialize};

use crate::core::hex::HexCoord;
use crate::game::board::BuildingId;
use crate::game::unit::{EquipmentId, UnitId};

/// What an attack is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackTarget {
    /// A unit
    Unit(UnitId),
    /// A hex (terrain, artillery, mines, smoke)
    Hex(HexCoord),
    /// A building hex
    Building(BuildingId, HexCoord),
}

impl AttackTarget {
    /// Target unit, if any.
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            AttackTarget::Unit(id) => Some(*id),
            _ => None,
        }
    }
}

/// Pre-computed to-hit number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToHit {
    /// Hit on 2d6 >= value
    Value(i32),
    /// Hits without a roll
    Automatic,
    /// Cannot hit
    Impossible,
}

impl ToHit {
    /// True when a 2d6 roll of `total` hits.
    pub fn is_hit(&self, total: i32) -> bool {
        match self {
            ToHit::Value(target) => total >= *target,
            ToHit::Automatic => true,
            ToHit::Impossible => false,
        }
    }

    /// True when a roll is needed.
    pub fn needs_roll(&self) -> bool {
        matches!(self, ToHit::Value(_))
    }
}

impl std::fmt::Display for ToHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToHit::Value(v) => write!(f, "{}", v),
            ToHit::Automatic => f.write_str("automatic"),
            ToHit::Impossible => f.write_str("impossible"),
        }
    }
}

/// Arm side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limb {
    /// Left arm or leg
    Left,
    /// Right arm or leg
    Right,
}

/// Physical attack variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicalKind {
    /// Punch with one arm
    Punch(Limb),
    /// Kick with one leg
    Kick(Limb),
    /// Swing a club
    Club,
    /// Shove an adjacent unit one hex
    Push,
    /// Ram at the end of a move
    Charge,
    /// Death from above at the end of a jump
    Dfa,
    /// Flail at infantry in the same hex
    Thrash,
    /// Knock a swarming unit off
    BrushOff(Limb),
}

/// Attack payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    /// Fire a weapon
    Weapon {
        /// Weapon fired
        weapon: EquipmentId,
        /// Ammo bin to draw from (first compatible bin when absent)
        ammo: Option<EquipmentId>,
        /// Shots for rotary autocannons
        shots: u32,
    },
    /// Physical attack
    Physical(PhysicalKind),
    /// Exo-armor swarm attack
    Swarm,
}

/// One declared attack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackAction {
    /// Attacking unit
    pub attacker: UnitId,
    /// Target
    pub target: AttackTarget,
    /// Payload
    pub kind: AttackKind,
    /// To-hit number
    pub to_hit: ToHit,
}

impl AttackAction {
    /// Weapon attack on a unit.
    pub fn weapon(attacker: UnitId, target: UnitId, weapon: EquipmentId, to_hit: ToHit) -> Self {
        Self {
            attacker,
            target: AttackTarget::Unit(target),
            kind: AttackKind::Weapon { weapon, ammo: None, shots: 1 },
            to_hit,
        }
    }

    /// Physical attack on a unit.
    pub fn physical(attacker: UnitId, target: UnitId, kind: PhysicalKind, to_hit: ToHit) -> Self {
        Self {
            attacker,
            target: AttackTarget::Unit(target),
            kind: AttackKind::Physical(kind),
            to_hit,
        }
    }

    /// True for physical attacks (including charges and swarms).
    pub fn is_physical(&self) -> bool {
        matches!(self.kind, AttackKind::Physical(_))
    }
}
