//! Turns
//!
//! A turn is the right for one player to act once in a turn-bearing phase,
//! optionally narrowed to one unit or to a set of unit classes.

use std::collections::VecDeque;

use serde::{Serialize, Deserialize};

use crate::game::state::PlayerId;
use crate::game::unit::{ClassSet, Unit, UnitId};

/// One entry in the turn queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    /// Any of the player's units (or a player-level action in setup phases)
    AnyUnit {
        /// Holder
        player: PlayerId,
    },
    /// One particular unit
    SpecificUnit {
        /// Holder
        player: PlayerId,
        /// Unit that must act
        unit: UnitId,
        /// Granted to continue a move interrupted by a fall
        resumed: bool,
    },
    /// Any of the player's units of the allowed classes
    UnitClass {
        /// Holder
        player: PlayerId,
        /// Classes that may act
        allowed: ClassSet,
        /// Follow-up of a multi-unit group move
        chained: bool,
    },
    /// Unload passengers whose carrier cannot move
    UnloadStranded {
        /// Holder
        player: PlayerId,
        /// Stranded passengers
        units: Vec<UnitId>,
    },
}

impl Turn {
    /// Player holding the turn.
    pub fn player(&self) -> PlayerId {
        match self {
            Turn::AnyUnit { player }
            | Turn::SpecificUnit { player, .. }
            | Turn::UnitClass { player, .. }
            | Turn::UnloadStranded { player, .. } => *player,
        }
    }

    /// True when `unit` may act with this turn.
    pub fn allows(&self, unit: &Unit) -> bool {
        match self {
            Turn::AnyUnit { player } => unit.owner == *player,
            Turn::SpecificUnit { player, unit: id, .. } => unit.owner == *player && unit.id == *id,
            Turn::UnitClass { player, allowed, .. } => unit.owner == *player && allowed.contains(unit.class()),
            Turn::UnloadStranded { .. } => false,
        }
    }

    /// Short description for reports.
    pub fn describe(&self) -> String {
        match self {
            Turn::AnyUnit { player } => format!("player {}", player.0),
            Turn::SpecificUnit { player, unit, .. } => format!("player {} (unit {})", player.0, unit),
            Turn::UnitClass { player, .. } => format!("player {} (restricted)", player.0),
            Turn::UnloadStranded { player, units } => {
                format!("player {} (unload {} stranded)", player.0, units.len())
            }
        }
    }
}

/// Ordered queue of turns for the current phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnQueue {
    turns: VecDeque<Turn>,
}

impl TurnQueue {
    /// Queue from an ordered list.
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns: turns.into() }
    }

    /// Turn currently being played.
    pub fn current(&self) -> Option<&Turn> {
        self.turns.front()
    }

    /// Remove and return the current turn.
    pub fn pop(&mut self) -> Option<Turn> {
        self.turns.pop_front()
    }

    /// Insert turns to be played right after the current one is removed.
    pub fn insert_next(&mut self, turns: Vec<Turn>) {
        for turn in turns.into_iter().rev() {
            self.turns.push_front(turn);
        }
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
    }

    /// Remove every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Turns in order.
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Snapshot as a list.
    pub fn to_vec(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Turns left.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// No turns left.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::unit::UnitClass;

    #[test]
    fn test_insert_next_keeps_order() {
        let p = PlayerId(1);
        let mut queue = TurnQueue::from_turns(vec![Turn::AnyUnit { player: p }, Turn::AnyUnit { player: PlayerId(2) }]);
        queue.pop();
        let chained = Turn::UnitClass { player: p, allowed: ClassSet::only(UnitClass::Infantry), chained: true };
        queue.insert_next(vec![chained.clone(), chained.clone()]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.current(), Some(&chained));
        assert_eq!(queue.iter().last().map(|t| t.player()), Some(PlayerId(2)));
    }

    #[test]
    fn test_allows() {
        let mech = Unit::mech(UnitId(4), "Griffin", PlayerId(1), 55, 5, 5);
        assert!(Turn::AnyUnit { player: PlayerId(1) }.allows(&mech));
        assert!(!Turn::AnyUnit { player: PlayerId(2) }.allows(&mech));
        let only_infantry = Turn::UnitClass {
            player: PlayerId(1),
            allowed: ClassSet::only(UnitClass::Infantry),
            chained: false,
        };
        assert!(!only_infantry.allows(&mech));
        let specific = Turn::SpecificUnit { player: PlayerId(1), unit: UnitId(4), resumed: false };
        assert!(specific.allows(&mech));
    }
}
