//! Movement Resolution
//!
//! A move is planned in full by [`cost::plan_path`] and then replayed step
//! by step. Replay is where the dice come in: standing up, turning at a run
//! on a slippery surface, terrain hazards, minefields and building walls.
//! A failed stand-up ends the path with the unit on the ground; a failed
//! skid roll turns the rest of the move into a skid.

pub mod cost;
pub mod fall;
pub mod hazards;
pub mod skid;

use tracing::{debug, warn};

use crate::core::hex::{Facing, HexCoord};
use crate::game::combat::attack::{AttackAction, PhysicalKind};
use crate::game::combat::cascade::{self, DamageJob};
use crate::game::combat::secondary;
use crate::game::events::ReportKind;
use crate::game::input::{MovePath, MoveStep};
use crate::game::phase::Phase;
use crate::game::psr::{self, PsrOutcome};
use crate::game::state::Match;
use crate::game::unit::{CanFall, HasHeat, MoveType, UnitId};

pub use cost::{plan_path, IllegalMove, PathPlan};

/// Piloting modifier for a skid check on pavement.
pub const SKID_PAVEMENT_MODIFIER: i32 = 0;
/// Piloting modifier for a skid check on ice.
pub const SKID_ICE_MODIFIER: i32 = 4;

// =============================================================================
// RESOLVER INTERFACE
// =============================================================================

/// Result of one move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The path was accepted
    pub legal: bool,
    /// The unit fell mid-path and may keep moving with a fresh turn
    pub continue_turn: bool,
}

/// Applies a unit's path to the match.
pub trait MovementResolver: Send + Sync {
    /// Move `unit` along `path` and report what happened.
    fn resolve_move(&self, game: &mut Match, unit: UnitId, path: &MovePath) -> MoveOutcome;
}

/// The standard rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardMovement;

impl MovementResolver for StandardMovement {
    fn resolve_move(&self, game: &mut Match, unit: UnitId, path: &MovePath) -> MoveOutcome {
        execute(game, unit, path)
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// How the replay ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Halt {
    /// Every step taken
    Completed,
    /// Failed to stand and fell
    FellStanding,
    /// Lost footing and skidded
    Skidded,
    /// Stopped by terrain, a minefield or death
    Stopped,
}

fn execute(game: &mut Match, unit_id: UnitId, path: &MovePath) -> MoveOutcome {
    let Some(unit) = game.unit(unit_id) else {
        warn!(unit = unit_id.0, "move for unknown unit");
        return MoveOutcome::default();
    };
    let name = unit.name.clone();
    let plan = match plan_path(game, unit, path) {
        Ok(plan) => plan,
        Err(err) => {
            debug!(unit = unit_id.0, %err, "illegal path");
            game.report(ReportKind::Error, Some(unit_id), format!("{} cannot move that way: {}", name, err));
            finish(game, unit_id);
            return MoveOutcome::default();
        }
    };
    let jumping = plan.move_type == MoveType::Jump;
    let slippery_modifier = |game: &Match, coords: HexCoord| {
        game.board.hex(coords).and_then(|h| {
            if h.ice {
                Some(SKID_ICE_MODIFIER)
            } else if h.pavement {
                Some(SKID_PAVEMENT_MODIFIER)
            } else {
                None
            }
        })
    };

    let mut halt = Halt::Completed;
    let mut taken = 0usize;
    let mut heading = plan.start_facing;
    for (index, planned) in plan.steps.iter().enumerate() {
        let before = plan.steps[..index].last();
        let (position, hexes_so_far) =
            before.map(|s| (s.position, s.hexes_moved)).unwrap_or((plan.start, plan.prior_hexes));
        taken = index + 1;
        match planned.step {
            MoveStep::GetUp => {
                if psr::roll_psr(game, unit_id, "getting up", 0) == PsrOutcome::Failed {
                    commit(game, unit_id, &plan, index, true);
                    cascade::run(game, vec![DamageJob::Fall { unit: unit_id, height: 0 }]);
                    halt = Halt::FellStanding;
                    break;
                }
            }
            MoveStep::TurnLeft | MoveStep::TurnRight if plan.move_type == MoveType::Run => {
                if let Some(modifier) = slippery_modifier(game, position) {
                    if psr::roll_psr(game, unit_id, "turning at a run on a slippery surface", modifier)
                        == PsrOutcome::Failed
                    {
                        commit(game, unit_id, &plan, index, false);
                        let jobs = skid::resolve_skid(game, unit_id, heading, hexes_so_far / 2);
                        cascade::run(game, jobs);
                        halt = Halt::Skidded;
                        break;
                    }
                }
            }
            MoveStep::Load(passenger) => {
                if let Err(reason) = load(game, unit_id, passenger) {
                    game.report(ReportKind::Error, Some(unit_id), format!("{} cannot load: {}", name, reason));
                }
            }
            MoveStep::Unload(passenger) => {
                if let Err(reason) = unload(game, unit_id, passenger, planned.position) {
                    game.report(ReportKind::Error, Some(unit_id), format!("{} cannot unload: {}", name, reason));
                }
            }
            MoveStep::Charge { target, to_hit } => {
                game.pending_physicals.push(AttackAction::physical(unit_id, target, PhysicalKind::Charge, to_hit));
            }
            MoveStep::Dfa { target, to_hit } => {
                game.pending_physicals.push(AttackAction::physical(unit_id, target, PhysicalKind::Dfa, to_hit));
            }
            _ => {}
        }

        if planned.entered {
            heading = match planned.step {
                MoveStep::Forward => planned.facing,
                MoveStep::Backward => planned.facing.opposite(),
                _ => heading,
            };
            let landing = index + 1 == plan.steps.len() || !jumping;
            if !landing {
                continue;
            }
            if let Some(u) = game.unit_mut(unit_id) {
                u.position = Some(planned.position);
                u.elevation = planned.elevation;
            }
            if !enter(game, unit_id, planned.position, jumping) {
                commit(game, unit_id, &plan, index, false);
                halt = Halt::Stopped;
                break;
            }
        }
    }

    if halt == Halt::Completed {
        commit(game, unit_id, &plan, plan.steps.len().saturating_sub(1), false);
    }
    let (to, spent) = game
        .unit(unit_id)
        .map(|u| (u.position.unwrap_or(plan.start), u.movement.mp_used))
        .unwrap_or((plan.start, plan.prior_mp));
    let from = plan.start;
    let verb = match plan.move_type {
        MoveType::None => "stays put",
        MoveType::Walk => "walks",
        MoveType::Run => "runs",
        MoveType::Jump => "jumps",
    };
    game.report(
        ReportKind::Movement,
        Some(unit_id),
        format!("{} {} from {} to {} ({} MP, {} of {} steps)", name, verb, from, to, spent, taken, plan.steps.len()),
    );

    psr::drain_psrs(game, Some(unit_id));
    let jobs = secondary::check_building_loads(game);
    cascade::run(game, jobs);

    let continue_turn = halt == Halt::FellStanding && may_continue(game, unit_id);
    if !continue_turn {
        finish(game, unit_id);
    }
    debug!(unit = unit_id.0, ?halt, continue_turn, "move resolved");
    MoveOutcome { legal: true, continue_turn }
}

/// Terrain, minefields and walls for a unit arriving in `coords`.
/// Returns false when the unit cannot go on.
fn enter(game: &mut Match, unit_id: UnitId, coords: HexCoord, jumping: bool) -> bool {
    let outcome = hazards::enter_hex(game, unit_id, coords);
    let mut jobs = outcome.jobs;
    jobs.extend(secondary::enter_minefields(game, unit_id, coords));
    if !jumping && game.board.building_at(coords).is_some() {
        if let Some(u) = game.unit(unit_id) {
            let damage = u.weight.div_ceil(10);
            let walker = u.kind.can_fall();
            jobs.extend(secondary::damage_building(game, coords, damage));
            if walker {
                psr::queue_psr(game, unit_id, "entered a building", 0);
            }
        }
    }
    cascade::run(game, jobs);
    let alive = game.unit(unit_id).map(|u| u.is_alive()).unwrap_or(false);
    alive && !outcome.stop
}

/// Write the state after step `last` to the unit.
fn commit(game: &mut Match, unit_id: UnitId, plan: &PathPlan, last: usize, standing_failed: bool) {
    let Some(step) = plan.steps.get(last) else {
        if let Some(u) = game.unit_mut(unit_id) {
            u.movement.move_type = plan.move_type;
        }
        return;
    };
    let Some(unit) = game.unit_mut(unit_id) else { return };
    let previous = unit.movement.move_type;
    if unit.is_alive() {
        unit.position = Some(step.position);
        unit.facing = step.facing;
        unit.elevation = step.elevation;
        unit.status.prone = if standing_failed { true } else { step.prone };
    }
    unit.movement.mp_used = step.mp_used;
    unit.movement.hexes_moved = step.hexes_moved;
    unit.movement.move_type = plan.move_type;
    if unit.kind.tracks_heat() {
        let hexes = if plan.move_type == MoveType::Jump { step.hexes_moved } else { 0 };
        // A resumed move only pays for stepping up to a hotter mode.
        let heat = cost::movement_heat(plan.move_type, hexes).saturating_sub(cost::movement_heat(previous, 0));
        unit.heat_buildup += heat;
    }
    let position = unit.position;
    let carried: Vec<UnitId> = unit.transport.carrying.clone();
    let swarmer = unit.swarmed_by;
    for passenger in carried.into_iter().chain(swarmer) {
        if let Some(p) = game.unit_mut(passenger) {
            p.position = position;
        }
    }
}

fn may_continue(game: &Match, unit_id: UnitId) -> bool {
    let Some(unit) = game.unit(unit_id) else { return false };
    unit.is_alive() && unit.movement.mp_used < unit.run_mp() && game.is_eligible(unit_id, Phase::Movement)
}

fn finish(game: &mut Match, unit_id: UnitId) {
    if let Some(u) = game.unit_mut(unit_id) {
        u.status.done = true;
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Take `passenger` aboard `carrier`. Both must share a hex.
pub fn load(game: &mut Match, carrier: UnitId, passenger: UnitId) -> Result<(), String> {
    let c = game.unit(carrier).ok_or("no carrier")?;
    let p = game.unit(passenger).ok_or("no such passenger")?;
    if game.are_enemies(carrier, passenger) {
        return Err("passenger is hostile".into());
    }
    if c.position != p.position || !p.is_on_board() {
        return Err("passenger is not in the same hex".into());
    }
    let load: u32 = c.transport.carrying.iter().filter_map(|id| game.unit(*id)).map(|u| u.weight).sum();
    if load + p.weight > c.transport.capacity {
        return Err("not enough room".into());
    }
    let passenger_name = p.name.clone();
    let carrier_name = c.name.clone();
    if let Some(c) = game.unit_mut(carrier) {
        c.transport.carrying.push(passenger);
    }
    if let Some(p) = game.unit_mut(passenger) {
        p.transport.carried_by = Some(carrier);
        p.status.done = true;
    }
    game.report(ReportKind::Movement, Some(carrier), format!("{} loads {}", carrier_name, passenger_name));
    Ok(())
}

/// Drop `passenger` from `carrier` into `coords`.
pub fn unload(game: &mut Match, carrier: UnitId, passenger: UnitId, coords: HexCoord) -> Result<(), String> {
    let p = game.unit(passenger).ok_or("no such passenger")?;
    if p.transport.carried_by != Some(carrier) {
        return Err("not carried by this unit".into());
    }
    let mut dropped = p.clone();
    dropped.transport.carried_by = None;
    if !game.can_stack(&dropped, coords) {
        return Err("no room in the hex".into());
    }
    let name = p.name.clone();
    if let Some(c) = game.unit_mut(carrier) {
        c.transport.carrying.retain(|id| *id != passenger);
    }
    if let Some(p) = game.unit_mut(passenger) {
        p.transport.carried_by = None;
        p.position = Some(coords);
        p.elevation = 0;
        p.status.done = true;
    }
    game.report(ReportKind::Movement, Some(passenger), format!("{} is unloaded at {}", name, coords));
    let jobs = secondary::enter_minefields(game, passenger, coords);
    cascade::run(game, jobs);
    Ok(())
}

/// Unload passengers whose carrier cannot move this round.
pub fn unload_stranded(game: &mut Match, passengers: &[UnitId]) -> usize {
    let mut unloaded = 0;
    for passenger in passengers {
        let Some(carrier) = game.unit(*passenger).and_then(|u| u.transport.carried_by) else { continue };
        let Some(coords) = game.unit(carrier).and_then(|u| u.position) else { continue };
        match unload(game, carrier, *passenger, coords) {
            Ok(()) => unloaded += 1,
            Err(reason) => game.report(ReportKind::Error, Some(*passenger), format!("cannot unload: {}", reason)),
        }
    }
    unloaded
}

/// Direction a charge or push travels.
pub fn travel_direction(from: HexCoord, to: HexCoord) -> Option<Facing> {
    from.direction_to(&to)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Hex;
    use crate::game::combat::ToHit;
    use crate::game::testkit;
    use crate::game::unit::{MotiveType, Unit};

    fn walk(game: &mut Match, steps: Vec<MoveStep>) -> MoveOutcome {
        StandardMovement.resolve_move(game, testkit::RED_MECH, &MovePath::new(steps))
    }

    fn red(game: &Match) -> &Unit {
        game.unit(testkit::RED_MECH).unwrap()
    }

    #[test]
    fn test_walk_commits_position_and_heat() {
        let mut game = testkit::duel();
        let start = red(&game).position.unwrap();
        let outcome = walk(&mut game, vec![MoveStep::Forward, MoveStep::TurnRight, MoveStep::Forward]);
        assert!(outcome.legal && !outcome.continue_turn);
        let unit = red(&game);
        assert_eq!(unit.position, Some(start.neighbor(Facing::N).neighbor(Facing::NE)));
        assert_eq!(unit.facing, Facing::NE);
        assert_eq!(unit.movement.move_type, MoveType::Walk);
        assert_eq!(unit.movement.mp_used, 3);
        assert_eq!(unit.heat_buildup, 1);
        assert!(unit.status.done);
    }

    #[test]
    fn test_illegal_path_consumes_turn() {
        let mut game = testkit::duel();
        let start = red(&game).position;
        let outcome = walk(&mut game, vec![MoveStep::Forward; 9]);
        assert!(!outcome.legal);
        assert_eq!(red(&game).position, start);
        assert!(red(&game).status.done);
        assert_eq!(game.reports.of_kind(ReportKind::Error).count(), 1);
    }

    #[test]
    fn test_jump_ignores_intermediate_terrain() {
        let mut game = testkit::duel();
        if let Some(u) = game.unit_mut(testkit::RED_MECH) {
            u.jump_mp = 4;
        }
        let start = red(&game).position.unwrap();
        game.board.set_hex(start.neighbor(Facing::N), Hex { water_depth: 2, ..Hex::clear(0) });
        walk(&mut game, vec![MoveStep::StartJump, MoveStep::Forward, MoveStep::Forward]);
        let unit = red(&game);
        assert_eq!(unit.position, Some(start.translated(Facing::N, 2)));
        assert_eq!(unit.movement.move_type, MoveType::Jump);
        assert_eq!(unit.heat_buildup, 3);
        assert!(game.reports.of_kind(ReportKind::Piloting).next().is_none());
    }

    #[test]
    fn test_charge_is_declared_for_physical_phase() {
        let mut game = testkit::duel();
        let charge = MoveStep::Charge { target: testkit::BLUE_MECH, to_hit: ToHit::Value(6) };
        walk(&mut game, vec![MoveStep::Forward, charge]);
        assert_eq!(game.pending_physicals.len(), 1);
        assert_eq!(game.pending_physicals[0].attacker, testkit::RED_MECH);
        assert!(!game.is_eligible(testkit::RED_MECH, Phase::Physical));
    }

    #[test]
    fn test_failed_stand_grants_another_turn() {
        let mut game = testkit::duel();
        if let Some(u) = game.unit_mut(testkit::RED_MECH) {
            u.status.prone = true;
            u.crew.piloting = 13;
        }
        let outcome = walk(&mut game, vec![MoveStep::GetUp, MoveStep::Forward]);
        assert!(outcome.legal);
        let unit = red(&game);
        assert!(unit.status.prone);
        assert_eq!(unit.movement.mp_used, cost::GET_UP_COST);
        // The fall may knock the pilot out, which ends the move.
        let awake = unit.crew.is_active();
        assert_eq!(outcome.continue_turn, awake);
        assert_eq!(unit.status.done, !awake);
    }

    #[test]
    fn test_resumed_move_keeps_phase_budget() {
        let mut game = testkit::duel();
        if let Some(u) = game.unit_mut(testkit::RED_MECH) {
            u.movement.mp_used = cost::GET_UP_COST;
            u.movement.move_type = MoveType::Walk;
            u.heat_buildup = 1;
        }
        let start = red(&game).position;
        let outcome = walk(&mut game, vec![MoveStep::Forward; 5]);
        assert!(!outcome.legal);
        assert_eq!(red(&game).position, start);
        assert_eq!(red(&game).movement.mp_used, cost::GET_UP_COST);

        if let Some(u) = game.unit_mut(testkit::RED_MECH) {
            u.status.done = false;
        }
        let outcome = walk(&mut game, vec![MoveStep::Forward; 3]);
        assert!(outcome.legal);
        let unit = red(&game);
        assert_eq!(unit.movement.move_type, MoveType::Run);
        assert_eq!(unit.movement.mp_used, 5);
        assert_eq!(unit.movement.hexes_moved, 3);
        assert_eq!(unit.heat_buildup, 2);
        let report = game.reports.of_kind(ReportKind::Movement).last().unwrap();
        assert!(report.text.contains("(5 MP, 3 of 3 steps)"));
    }

    #[test]
    fn test_report_shows_mp_actually_spent() {
        let mut game = testkit::duel();
        if let Some(u) = game.unit_mut(testkit::RED_MECH) {
            u.status.prone = true;
            u.crew.piloting = 13;
        }
        walk(&mut game, vec![MoveStep::GetUp, MoveStep::Forward]);
        let report = game.reports.of_kind(ReportKind::Movement).last().unwrap();
        assert!(report.text.contains("(2 MP, 1 of 2 steps)"), "{}", report.text);
    }

    #[test]
    fn test_building_entry_damages_building() {
        let mut game = testkit::duel();
        let ahead = red(&game).position.unwrap().neighbor(Facing::N);
        let id = game.board.add_building("Depot", crate::game::board::BuildingClass::Heavy, &[ahead], 1);
        walk(&mut game, vec![MoveStep::Forward]);
        let cf = game.board.buildings.get(&id).and_then(|b| b.hexes.get(&ahead)).map(|h| h.cf);
        assert_eq!(cf, Some(85));
    }

    #[test]
    fn test_load_and_unload() {
        let mut game = testkit::duel();
        let mut apc = Unit::vehicle(UnitId(5), "Packrat", testkit::RED, 20, 6, MotiveType::Wheeled, false, 10);
        apc.transport.capacity = 5;
        let position = red(&game).position;
        apc.position = position;
        apc.status.deployed = true;
        let mut squad = Unit::infantry(UnitId(6), "Rifles", testkit::RED, 28, 1);
        squad.position = position;
        squad.status.deployed = true;
        game.add_unit(apc);
        game.add_unit(squad);

        StandardMovement.resolve_move(&mut game, UnitId(5), &MovePath::new(vec![MoveStep::Load(UnitId(6))]));
        assert_eq!(game.unit(UnitId(6)).unwrap().transport.carried_by, Some(UnitId(5)));
        assert!(!game.unit(UnitId(6)).unwrap().is_on_board());

        if let Some(u) = game.unit_mut(UnitId(5)) {
            u.status.done = false;
        }
        StandardMovement.resolve_move(
            &mut game,
            UnitId(5),
            &MovePath::new(vec![MoveStep::Forward, MoveStep::Unload(UnitId(6))]),
        );
        let squad = game.unit(UnitId(6)).unwrap();
        assert!(squad.is_on_board());
        assert_eq!(squad.position, game.unit(UnitId(5)).unwrap().position);
    }

    #[test]
    fn test_unload_stranded() {
        let mut game = testkit::duel();
        let mut apc = Unit::vehicle(UnitId(5), "Packrat", testkit::RED, 20, 6, MotiveType::Wheeled, false, 10);
        apc.transport.capacity = 5;
        apc.transport.carrying.push(UnitId(6));
        apc.position = Some(HexCoord::from_offset(5, 5));
        apc.status.deployed = true;
        let mut squad = Unit::infantry(UnitId(6), "Rifles", testkit::RED, 28, 1);
        squad.transport.carried_by = Some(UnitId(5));
        squad.status.deployed = true;
        game.add_unit(apc);
        game.add_unit(squad);
        assert_eq!(unload_stranded(&mut game, &[UnitId(6)]), 1);
        assert_eq!(game.unit(UnitId(6)).unwrap().position, Some(HexCoord::from_offset(5, 5)));
    }
}
