//! Phases
//!
//! The phase machine is data: [`TRANSITIONS`] lists, for every phase, the
//! guarded successors in priority order. The first guard that holds picks
//! the next phase, and every phase ends with an unconditional fallback.

use serde::{Serialize, Deserialize};

/// Game phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Phase {
    /// Waiting room before a match
    #[default]
    Lobby,
    /// Final unit and map exchange before play
    Exchange,
    /// Players pre-designate artillery auto-hit hexes
    SetArtilleryAutoHitHexes,
    /// Players lay minefields
    DeployMinefields,
    /// Initiative is rolled (resolves immediately)
    Initiative,
    /// Initiative results checkpoint
    InitiativeReport,
    /// Units enter the board
    Deployment,
    /// Units move
    Movement,
    /// Movement results checkpoint
    MovementReport,
    /// Artillery fire
    Offboard,
    /// Artillery results checkpoint
    OffboardReport,
    /// Weapon attacks are declared
    Firing,
    /// Weapon results checkpoint
    FiringReport,
    /// Physical attacks are declared
    Physical,
    /// End-of-round bookkeeping (resolves immediately)
    End,
    /// End-of-round results checkpoint
    EndReport,
    /// A side has won
    Victory,
}

impl Phase {
    /// Phases in which units or players act in a turn order.
    pub fn has_turns(self) -> bool {
        matches!(
            self,
            Phase::SetArtilleryAutoHitHexes
                | Phase::DeployMinefields
                | Phase::Deployment
                | Phase::Movement
                | Phase::Offboard
                | Phase::Firing
                | Phase::Physical
        )
    }

    /// Phases that resolve on entry without waiting for anyone.
    pub fn is_automatic(self) -> bool {
        matches!(self, Phase::Initiative | Phase::End)
    }

    /// Phases that end when every active player declares ready.
    pub fn is_ready_gated(self) -> bool {
        !self.has_turns() && !self.is_automatic()
    }

    /// Report checkpoints.
    pub fn is_report(self) -> bool {
        matches!(
            self,
            Phase::InitiativeReport
                | Phase::MovementReport
                | Phase::OffboardReport
                | Phase::FiringReport
                | Phase::EndReport
        )
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Lobby => "Lobby",
            Phase::Exchange => "Exchange",
            Phase::SetArtilleryAutoHitHexes => "Artillery Auto-Hit Designation",
            Phase::DeployMinefields => "Minefield Deployment",
            Phase::Initiative => "Initiative",
            Phase::InitiativeReport => "Initiative Report",
            Phase::Deployment => "Deployment",
            Phase::Movement => "Movement",
            Phase::MovementReport => "Movement Report",
            Phase::Offboard => "Offboard",
            Phase::OffboardReport => "Offboard Report",
            Phase::Firing => "Firing",
            Phase::FiringReport => "Firing Report",
            Phase::Physical => "Physical",
            Phase::End => "End",
            Phase::EndReport => "End Report",
            Phase::Victory => "Victory",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// TRANSITION TABLE
// =============================================================================

/// Guard on a phase transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Always holds
    Always,
    /// Some player still has minefields to lay
    MinefieldsInPlay,
    /// Some unit can fire artillery or a strike is in flight
    ArtilleryInPlay,
    /// Some unit enters the board this round
    DeploymentPending,
    /// A side has won
    VictoryAchieved,
}

/// Facts about the match that transition guards read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseContext {
    /// See [`Condition::MinefieldsInPlay`]
    pub minefields_in_play: bool,
    /// See [`Condition::ArtilleryInPlay`]
    pub artillery_in_play: bool,
    /// See [`Condition::DeploymentPending`]
    pub deployment_pending: bool,
    /// See [`Condition::VictoryAchieved`]
    pub victory: bool,
}

impl PhaseContext {
    fn holds(&self, condition: Condition) -> bool {
        match condition {
            Condition::Always => true,
            Condition::MinefieldsInPlay => self.minefields_in_play,
            Condition::ArtilleryInPlay => self.artillery_in_play,
            Condition::DeploymentPending => self.deployment_pending,
            Condition::VictoryAchieved => self.victory,
        }
    }
}

/// One guarded edge of the phase machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Source phase
    pub from: Phase,
    /// Guard
    pub when: Condition,
    /// Destination phase
    pub to: Phase,
}

const fn edge(from: Phase, when: Condition, to: Phase) -> Transition {
    Transition { from, when, to }
}

/// Every phase edge, grouped by source phase in priority order.
pub const TRANSITIONS: &[Transition] = &[
    edge(Phase::Lobby, Condition::Always, Phase::Exchange),
    edge(Phase::Exchange, Condition::Always, Phase::SetArtilleryAutoHitHexes),
    edge(Phase::SetArtilleryAutoHitHexes, Condition::MinefieldsInPlay, Phase::DeployMinefields),
    edge(Phase::SetArtilleryAutoHitHexes, Condition::Always, Phase::Initiative),
    edge(Phase::DeployMinefields, Condition::Always, Phase::Initiative),
    edge(Phase::Initiative, Condition::Always, Phase::InitiativeReport),
    edge(Phase::InitiativeReport, Condition::DeploymentPending, Phase::Deployment),
    edge(Phase::InitiativeReport, Condition::Always, Phase::Movement),
    edge(Phase::Deployment, Condition::Always, Phase::Movement),
    edge(Phase::Movement, Condition::Always, Phase::MovementReport),
    edge(Phase::MovementReport, Condition::ArtilleryInPlay, Phase::Offboard),
    edge(Phase::MovementReport, Condition::Always, Phase::Firing),
    edge(Phase::Offboard, Condition::Always, Phase::OffboardReport),
    edge(Phase::OffboardReport, Condition::Always, Phase::Firing),
    edge(Phase::Firing, Condition::Always, Phase::FiringReport),
    edge(Phase::FiringReport, Condition::Always, Phase::Physical),
    edge(Phase::Physical, Condition::Always, Phase::End),
    edge(Phase::End, Condition::VictoryAchieved, Phase::Victory),
    edge(Phase::End, Condition::Always, Phase::EndReport),
    edge(Phase::EndReport, Condition::VictoryAchieved, Phase::Victory),
    edge(Phase::EndReport, Condition::Always, Phase::Initiative),
    edge(Phase::Victory, Condition::Always, Phase::Lobby),
];

/// Successor of `from` given the current facts.
pub fn next_phase(from: Phase, ctx: &PhaseContext) -> Phase {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == from)
        .find(|t| ctx.holds(t.when))
        .map(|t| t.to)
        .unwrap_or(Phase::Lobby)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Phase; 17] = [
        Phase::Lobby,
        Phase::Exchange,
        Phase::SetArtilleryAutoHitHexes,
        Phase::DeployMinefields,
        Phase::Initiative,
        Phase::InitiativeReport,
        Phase::Deployment,
        Phase::Movement,
        Phase::MovementReport,
        Phase::Offboard,
        Phase::OffboardReport,
        Phase::Firing,
        Phase::FiringReport,
        Phase::Physical,
        Phase::End,
        Phase::EndReport,
        Phase::Victory,
    ];

    #[test]
    fn test_every_phase_has_unconditional_fallback() {
        for phase in ALL {
            let edges: Vec<_> = TRANSITIONS.iter().filter(|t| t.from == phase).collect();
            assert!(!edges.is_empty(), "{} has no successor", phase);
            assert_eq!(edges.last().map(|t| t.when), Some(Condition::Always), "{}", phase);
            assert_eq!(edges.iter().filter(|t| t.when == Condition::Always).count(), 1);
        }
    }

    #[test]
    fn test_plain_round() {
        let ctx = PhaseContext::default();
        let mut phase = Phase::Initiative;
        let mut seen = vec![phase];
        while phase != Phase::Initiative || seen.len() == 1 {
            phase = next_phase(phase, &ctx);
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                Phase::Initiative,
                Phase::InitiativeReport,
                Phase::Movement,
                Phase::MovementReport,
                Phase::Firing,
                Phase::FiringReport,
                Phase::Physical,
                Phase::End,
                Phase::EndReport,
                Phase::Initiative,
            ]
        );
    }

    #[test]
    fn test_setup_with_minefields() {
        let ctx = PhaseContext { minefields_in_play: true, ..Default::default() };
        assert_eq!(next_phase(Phase::SetArtilleryAutoHitHexes, &ctx), Phase::DeployMinefields);
        assert_eq!(next_phase(Phase::DeployMinefields, &ctx), Phase::Initiative);
    }

    #[test]
    fn test_deployment_and_artillery_branches() {
        let ctx = PhaseContext { deployment_pending: true, artillery_in_play: true, ..Default::default() };
        assert_eq!(next_phase(Phase::InitiativeReport, &ctx), Phase::Deployment);
        assert_eq!(next_phase(Phase::MovementReport, &ctx), Phase::Offboard);
    }

    #[test]
    fn test_victory_loops_to_lobby() {
        let ctx = PhaseContext { victory: true, ..Default::default() };
        assert_eq!(next_phase(Phase::End, &ctx), Phase::Victory);
        assert_eq!(next_phase(Phase::Victory, &ctx), Phase::Lobby);
    }

    #[test]
    fn test_phase_categories_are_disjoint() {
        for phase in ALL {
            let categories = [phase.has_turns(), phase.is_automatic(), phase.is_ready_gated()];
            assert_eq!(categories.iter().filter(|c| **c).count(), 1, "{}", phase);
        }
    }
}
