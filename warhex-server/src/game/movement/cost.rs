//! Movement costs and path planning.
//!
//! A path is planned in full before anything moves: every step is priced
//! and checked against the board, so an illegal path is rejected without
//! touching the match. Hazards and rolls happen later, during replay.

use thiserror::Error;

use crate::core::hex::{Facing, HexCoord};
use crate::game::board::{Hex, Woods};
use crate::game::input::{MovePath, MoveStep};
use crate::game::state::Match;
use crate::game::unit::{MotiveType, MoveType, Unit, UnitKind};

/// MP to stand up.
pub const GET_UP_COST: u32 = 2;
/// MP to drop prone.
pub const GO_PRONE_COST: u32 = 1;
/// MP for a lateral shift.
pub const LATERAL_COST: u32 = 2;

/// Why a planned path cannot be walked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalMove {
    /// The unit cannot move at all
    #[error("unit cannot move")]
    Immobile,
    /// A step leaves the board
    #[error("step {0} leaves the board")]
    OffBoard(usize),
    /// Terrain the unit cannot enter
    #[error("step {0} enters impassable terrain")]
    Impassable(usize),
    /// Level change too large
    #[error("step {0} climbs or drops too far")]
    TooSteep(usize),
    /// Enemy units block the hex
    #[error("step {0} enters an occupied hex")]
    Occupied(usize),
    /// The step is not available to this unit here
    #[error("step {index}: {reason}")]
    NotAllowed {
        /// Step index
        index: usize,
        /// Why
        reason: &'static str,
    },
    /// More MP than the unit has
    #[error("path needs {used} MP but only {available} are available")]
    OutOfMp {
        /// MP the path costs
        used: u32,
        /// MP available
        available: u32,
    },
}

/// The state after one planned step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedStep {
    /// Step taken
    pub step: MoveStep,
    /// Hex after the step
    pub position: HexCoord,
    /// Facing after the step
    pub facing: Facing,
    /// Elevation after the step
    pub elevation: i32,
    /// Prone after the step
    pub prone: bool,
    /// MP spent so far
    pub mp_used: u32,
    /// Hexes entered so far
    pub hexes_moved: u32,
    /// The step entered a new hex
    pub entered: bool,
}

/// A fully priced path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPlan {
    /// Starting hex
    pub start: HexCoord,
    /// Starting facing
    pub start_facing: Facing,
    /// Steps in order
    pub steps: Vec<PlannedStep>,
    /// Walk, run or jump
    pub move_type: MoveType,
    /// MP spent this phase before the path
    pub prior_mp: u32,
    /// Hexes entered this phase before the path
    pub prior_hexes: u32,
    /// Total MP this phase, path included
    pub mp_used: u32,
    /// Total hexes entered this phase, path included
    pub hexes_moved: u32,
}

impl PathPlan {
    /// Final hex.
    pub fn end(&self) -> HexCoord {
        self.steps.last().map(|s| s.position).unwrap_or(self.start)
    }
}

fn is_walker(unit: &Unit) -> bool {
    matches!(
        unit.kind,
        UnitKind::Mech(_) | UnitKind::ProtoMech(_) | UnitKind::Infantry | UnitKind::BattleArmor
    )
}

fn motive(unit: &Unit) -> Option<MotiveType> {
    match &unit.kind {
        UnitKind::Vehicle(v) => Some(v.motive),
        _ => None,
    }
}

/// Extra MP to enter `hex`, `None` when the unit cannot enter it.
pub fn terrain_cost(hex: &Hex, unit: &Unit) -> Option<u32> {
    if matches!(unit.kind, UnitKind::Aero(_)) {
        return Some(0);
    }
    let ground = matches!(motive(unit), Some(MotiveType::Tracked | MotiveType::Wheeled));
    let hover = motive(unit) == Some(MotiveType::Hover);
    let mut cost = 0;
    match hex.woods {
        Some(Woods::Light) => cost += 1,
        Some(Woods::Heavy) if ground => return None,
        Some(Woods::Heavy) => cost += 2,
        None => {}
    }
    if hex.rough {
        cost += 1;
    }
    if hex.rubble {
        cost += 1;
    }
    if hex.swamp {
        cost += 1;
    }
    if hex.water_depth > 0 && !hex.ice {
        if ground {
            return None;
        }
        if !hover {
            cost += if hex.water_depth == 1 { 1 } else { 3 };
        }
    }
    Some(cost)
}

/// Surface level a unit stands on in `hex`.
fn surface(hex: &Hex, unit: &Unit) -> i32 {
    let hover = motive(unit) == Some(MotiveType::Hover);
    if hex.water_depth > 0 && !hex.ice && !hover {
        hex.level - hex.water_depth as i32
    } else {
        hex.level
    }
}

/// Largest level change a unit can make in one step.
fn max_climb(unit: &Unit) -> i32 {
    if is_walker(unit) {
        2
    } else {
        1
    }
}

/// Heat for a move.
pub fn movement_heat(move_type: MoveType, hexes_jumped: u32) -> u32 {
    match move_type {
        MoveType::None => 0,
        MoveType::Walk => 1,
        MoveType::Run => 2,
        MoveType::Jump => hexes_jumped.max(3),
    }
}

/// Price and check a path for `unit` without changing anything.
///
/// A unit resuming its move after a fall keeps what it already spent, so
/// walk, run and jump limits apply to the phase total.
pub fn plan_path(game: &Match, unit: &Unit, path: &MovePath) -> Result<PathPlan, IllegalMove> {
    let Some(start) = unit.position else { return Err(IllegalMove::Immobile) };
    if !path.is_empty() && unit.is_immobile() {
        return Err(IllegalMove::Immobile);
    }
    let jumping = path.is_jump();
    if jumping && (unit.jump_mp == 0 || unit.status.prone) {
        return Err(IllegalMove::NotAllowed { index: 0, reason: "cannot jump" });
    }
    let prior_mp = unit.movement.mp_used;
    let prior_hexes = unit.movement.hexes_moved;
    if jumping && prior_mp > 0 {
        return Err(IllegalMove::NotAllowed { index: 0, reason: "already moved this phase" });
    }
    let infantry = unit.kind.is_infantry();
    let walker = is_walker(unit);

    let mut position = start;
    let mut facing = unit.facing;
    let mut elevation = unit.elevation;
    let mut prone = unit.status.prone;
    let mut mp = prior_mp;
    let mut hexes = prior_hexes;
    let mut backward = false;
    let mut steps = Vec::with_capacity(path.steps.len());

    for (index, step) in path.steps.iter().enumerate() {
        if index + 1 < path.steps.len() && step.ends_path() {
            return Err(IllegalMove::NotAllowed { index, reason: "must be the last step" });
        }
        let mut entered = false;
        match step {
            MoveStep::StartJump => {
                if index != 0 {
                    return Err(IllegalMove::NotAllowed { index, reason: "a jump must start the path" });
                }
            }
            MoveStep::TurnLeft | MoveStep::TurnRight => {
                let delta = if *step == MoveStep::TurnLeft { -1 } else { 1 };
                facing = facing.rotated(delta);
                if !jumping && !infantry {
                    mp += 1;
                }
            }
            MoveStep::Forward | MoveStep::Backward | MoveStep::LateralLeft | MoveStep::LateralRight => {
                if prone && !infantry {
                    return Err(IllegalMove::NotAllowed { index, reason: "must stand up first" });
                }
                let direction = match step {
                    MoveStep::Forward => facing,
                    MoveStep::Backward => facing.opposite(),
                    MoveStep::LateralLeft => facing.rotated(-1),
                    _ => facing.rotated(1),
                };
                if matches!(step, MoveStep::LateralLeft | MoveStep::LateralRight) && !walker {
                    return Err(IllegalMove::NotAllowed { index, reason: "only walkers shift sideways" });
                }
                if *step == MoveStep::Backward {
                    if jumping {
                        return Err(IllegalMove::NotAllowed { index, reason: "cannot jump backward" });
                    }
                    backward = true;
                }
                let next = position.neighbor(direction);
                let (Some(from_hex), Some(to_hex)) = (game.board.hex(position), game.board.hex(next)) else {
                    return Err(IllegalMove::OffBoard(index));
                };
                if jumping {
                    mp += 1;
                } else {
                    let terrain = terrain_cost(to_hex, unit).ok_or(IllegalMove::Impassable(index))?;
                    let rise = surface(to_hex, unit) - surface(from_hex, unit);
                    if rise.abs() > max_climb(unit) {
                        return Err(IllegalMove::TooSteep(index));
                    }
                    let climb = if walker { rise.max(0) as u32 } else { 0 };
                    let base = if matches!(step, MoveStep::LateralLeft | MoveStep::LateralRight) {
                        LATERAL_COST
                    } else {
                        1
                    };
                    mp += base + terrain + climb;
                    let blocked = game
                        .units_at(next)
                        .iter()
                        .filter_map(|id| game.unit(*id))
                        .any(|other| game.are_enemies(unit.id, other.id) && !other.kind.is_infantry() && !infantry);
                    if blocked {
                        return Err(IllegalMove::Occupied(index));
                    }
                    elevation = 0;
                }
                position = next;
                hexes += 1;
                entered = true;
            }
            MoveStep::Up | MoveStep::Down => {
                let floors = game
                    .board
                    .building_at(position)
                    .and_then(|b| b.hexes.get(&position))
                    .map(|h| h.floors as i32)
                    .unwrap_or(0);
                let next = elevation + if *step == MoveStep::Up { 1 } else { -1 };
                if next < 0 || next >= floors.max(1) {
                    return Err(IllegalMove::NotAllowed { index, reason: "no floor there" });
                }
                elevation = next;
                mp += 1;
            }
            MoveStep::GetUp => {
                if !prone {
                    return Err(IllegalMove::NotAllowed { index, reason: "not prone" });
                }
                prone = false;
                mp += GET_UP_COST;
            }
            MoveStep::GoProne => {
                if prone || !walker {
                    return Err(IllegalMove::NotAllowed { index, reason: "cannot go prone" });
                }
                prone = true;
                mp += GO_PRONE_COST;
            }
            MoveStep::Load(_) | MoveStep::Unload(_) => {}
            MoveStep::Charge { .. } => {
                if jumping {
                    return Err(IllegalMove::NotAllowed { index, reason: "cannot charge while jumping" });
                }
            }
            MoveStep::Dfa { .. } => {
                if !jumping {
                    return Err(IllegalMove::NotAllowed { index, reason: "death from above needs a jump" });
                }
            }
        }
        steps.push(PlannedStep {
            step: *step,
            position,
            facing,
            elevation,
            prone,
            mp_used: mp,
            hexes_moved: hexes,
            entered,
        });
    }

    let walk = unit.effective_walk_mp();
    let move_type = if path.is_empty() || mp == prior_mp {
        unit.movement.move_type
    } else if jumping {
        if mp > unit.jump_mp {
            return Err(IllegalMove::OutOfMp { used: mp, available: unit.jump_mp });
        }
        MoveType::Jump
    } else if mp <= walk {
        MoveType::Walk
    } else if mp <= unit.run_mp() && !backward {
        MoveType::Run
    } else {
        let available = if backward { walk } else { unit.run_mp() };
        return Err(IllegalMove::OutOfMp { used: mp, available });
    };

    if position != start && !game.can_stack(unit, position) {
        return Err(IllegalMove::Occupied(path.steps.len().saturating_sub(1)));
    }

    Ok(PathPlan {
        start,
        start_facing: unit.facing,
        steps,
        move_type,
        prior_mp,
        prior_hexes,
        mp_used: mp,
        hexes_moved: hexes,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testkit;
    use crate::game::unit::UnitId;

    fn plan(game: &Match, steps: Vec<MoveStep>) -> Result<PathPlan, IllegalMove> {
        let unit = game.unit(testkit::RED_MECH).unwrap();
        plan_path(game, unit, &MovePath::new(steps))
    }

    #[test]
    fn test_terrain_costs() {
        let mech = Unit::mech(UnitId(1), "Wolverine", testkit::RED, 55, 5, 5);
        let tank = Unit::vehicle(UnitId(2), "Bulldog", testkit::RED, 60, 4, MotiveType::Tracked, true, 20);
        let hover = Unit::vehicle(UnitId(3), "Saracen", testkit::RED, 50, 7, MotiveType::Hover, true, 15);
        let heavy = Hex { woods: Some(Woods::Heavy), ..Hex::clear(0) };
        let lake = Hex { water_depth: 2, ..Hex::clear(0) };
        assert_eq!(terrain_cost(&heavy, &mech), Some(2));
        assert_eq!(terrain_cost(&heavy, &tank), None);
        assert_eq!(terrain_cost(&lake, &mech), Some(3));
        assert_eq!(terrain_cost(&lake, &tank), None);
        assert_eq!(terrain_cost(&lake, &hover), Some(0));
        let frozen = Hex { ice: true, ..lake };
        assert_eq!(terrain_cost(&frozen, &tank), Some(0));
    }

    #[test]
    fn test_movement_heat() {
        assert_eq!(movement_heat(MoveType::Walk, 0), 1);
        assert_eq!(movement_heat(MoveType::Run, 0), 2);
        assert_eq!(movement_heat(MoveType::Jump, 2), 3);
        assert_eq!(movement_heat(MoveType::Jump, 5), 5);
    }

    #[test]
    fn test_walk_then_run() {
        let game = testkit::duel();
        let walk = plan(&game, vec![MoveStep::Forward, MoveStep::Forward]).unwrap();
        assert_eq!(walk.move_type, MoveType::Walk);
        assert_eq!(walk.mp_used, 2);
        let run = plan(&game, vec![MoveStep::Forward; 6]).unwrap();
        assert_eq!(run.move_type, MoveType::Run);
        assert_eq!(run.hexes_moved, 6);
    }

    #[test]
    fn test_too_far_is_rejected() {
        let game = testkit::duel();
        let result = plan(&game, vec![MoveStep::Forward; 7]);
        assert!(matches!(result, Err(IllegalMove::OutOfMp { used: 7, .. })));
    }

    #[test]
    fn test_cannot_run_backward() {
        let game = testkit::duel();
        assert!(plan(&game, vec![MoveStep::Backward; 4]).is_ok());
        assert!(plan(&game, vec![MoveStep::Backward; 5]).is_err());
    }

    #[test]
    fn test_prone_must_stand_first() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.status.prone = true;
        }
        assert!(matches!(
            plan(&game, vec![MoveStep::Forward]),
            Err(IllegalMove::NotAllowed { index: 0, .. })
        ));
        let plan = plan(&game, vec![MoveStep::GetUp, MoveStep::Forward]).unwrap();
        assert_eq!(plan.mp_used, 3);
    }

    #[test]
    fn test_resumed_move_counts_mp_already_spent() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.status.prone = true;
            unit.movement.mp_used = GET_UP_COST;
            unit.movement.move_type = MoveType::Walk;
        }
        let mut steps = vec![MoveStep::GetUp];
        steps.extend([MoveStep::Forward; 4]);
        assert_eq!(plan(&game, steps), Err(IllegalMove::OutOfMp { used: 8, available: 6 }));

        let resumed = plan(&game, vec![MoveStep::GetUp, MoveStep::Forward]).unwrap();
        assert_eq!(resumed.prior_mp, GET_UP_COST);
        assert_eq!(resumed.mp_used, 5);
        assert_eq!(resumed.move_type, MoveType::Run);

        let idle = plan(&game, Vec::new()).unwrap();
        assert_eq!(idle.move_type, MoveType::Walk);
        assert_eq!(idle.mp_used, GET_UP_COST);
    }

    #[test]
    fn test_no_jump_after_moving() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.jump_mp = 4;
            unit.movement.mp_used = 1;
        }
        assert!(matches!(
            plan(&game, vec![MoveStep::StartJump, MoveStep::Forward]),
            Err(IllegalMove::NotAllowed { index: 0, .. })
        ));
    }

    #[test]
    fn test_charge_must_end_path() {
        let game = testkit::duel();
        let charge = MoveStep::Charge { target: testkit::BLUE_MECH, to_hit: crate::game::combat::ToHit::Value(7) };
        assert!(plan(&game, vec![charge, MoveStep::Forward]).is_err());
    }

    #[test]
    fn test_off_board() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.position = Some(HexCoord::from_offset(0, 0));
            unit.facing = Facing::N;
        }
        assert_eq!(plan(&game, vec![MoveStep::Forward]), Err(IllegalMove::OffBoard(0)));
    }
}
