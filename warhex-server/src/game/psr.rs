//! Piloting Skill Rolls
//!
//! Resolvers queue piloting rolls as they discover the need for them; the
//! queue is drained at fixed checkpoints (after each move, after the weapon
//! and physical passes). Rolls are resolved in queue order and a unit that
//! has already fallen in the current drain skips its remaining rolls.

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::combat::cascade::{self, DamageJob};
use crate::game::events::ReportKind;
use crate::game::state::Match;
use crate::game::unit::{mech_loc, proto_loc, Actuator, CanFall, Unit, UnitId, UnitKind};

/// Damage in one phase that forces a piloting roll.
pub const HEAVY_DAMAGE_THRESHOLD: u32 = 20;

/// A queued piloting roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsrRequest {
    /// Unit rolling
    pub unit: UnitId,
    /// Why the roll is needed
    pub reason: String,
    /// Added to the target number
    pub modifier: i32,
    /// Fails without rolling
    pub automatic_fail: bool,
}

impl PsrRequest {
    /// A roll at `modifier`.
    pub fn new(unit: UnitId, reason: &str, modifier: i32) -> Self {
        Self { unit, reason: reason.to_string(), modifier, automatic_fail: false }
    }
}

/// Outcome of one piloting roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PsrOutcome {
    /// Kept footing
    Passed,
    /// Fell (or failed the manoeuvre)
    Failed,
    /// Unit cannot fall, nothing rolled
    NotApplicable,
}

/// Damage modifiers to a unit's piloting target.
pub fn damage_modifiers(unit: &Unit) -> i32 {
    match &unit.kind {
        UnitKind::Mech(systems) => {
            let mut modifier = 3 * systems.gyro_hits as i32;
            for leg in [mech_loc::RL, mech_loc::LL] {
                if !unit.has_location(leg) {
                    modifier += 5;
                    continue;
                }
                modifier += 2 * unit.actuator_hits(leg, Actuator::Hip) as i32;
                modifier += unit.actuator_hits(leg, Actuator::UpperLeg) as i32;
                modifier += unit.actuator_hits(leg, Actuator::LowerLeg) as i32;
                modifier += unit.actuator_hits(leg, Actuator::Foot) as i32;
            }
            modifier
        }
        UnitKind::ProtoMech(systems) => systems.location_hits[proto_loc::LEGS] as i32,
        _ => 0,
    }
}

/// Target number for a roll, or `None` when it fails automatically.
pub fn psr_target(unit: &Unit, modifier: i32) -> Option<i32> {
    if !unit.crew.is_active() || unit.status.shutdown {
        return None;
    }
    if unit.mech_systems().map(|s| s.gyro_hits >= 2).unwrap_or(false) {
        return None;
    }
    Some(unit.crew.piloting + damage_modifiers(unit) + modifier)
}

/// Queue a roll.
pub fn queue_psr(game: &mut Match, unit: UnitId, reason: &str, modifier: i32) {
    game.pending_psrs.push(PsrRequest::new(unit, reason, modifier));
}

/// Queue a roll that fails without rolling.
pub fn queue_automatic_fall(game: &mut Match, unit: UnitId, reason: &str) {
    game.pending_psrs.push(PsrRequest { automatic_fail: true, ..PsrRequest::new(unit, reason, 0) });
}

/// Roll immediately and report.
pub fn roll_psr(game: &mut Match, unit: UnitId, reason: &str, modifier: i32) -> PsrOutcome {
    roll_request(game, &PsrRequest::new(unit, reason, modifier))
}

fn roll_request(game: &mut Match, request: &PsrRequest) -> PsrOutcome {
    let Some(unit) = game.unit(request.unit) else { return PsrOutcome::NotApplicable };
    if !unit.kind.can_fall() || !unit.is_alive() {
        return PsrOutcome::NotApplicable;
    }
    let name = unit.name.clone();
    let target = if request.automatic_fail { None } else { psr_target(unit, request.modifier) };
    match target {
        None => {
            game.report(
                ReportKind::Piloting,
                Some(request.unit),
                format!("{} must make a piloting roll ({}): automatic failure", name, request.reason),
            );
            PsrOutcome::Failed
        }
        Some(target) => {
            let roll = game.rng.roll_2d6();
            let passed = roll.total() >= target;
            debug!(unit = request.unit.0, target, roll = roll.total(), passed, "piloting roll");
            game.report(
                ReportKind::Piloting,
                Some(request.unit),
                format!(
                    "{} must make a piloting roll ({}), needs {}, rolls {}: {}",
                    name,
                    request.reason,
                    target,
                    roll,
                    if passed { "succeeds" } else { "fails" }
                ),
            );
            if passed {
                PsrOutcome::Passed
            } else {
                PsrOutcome::Failed
            }
        }
    }
}

/// Queue the heavy-damage roll for every unit that took 20+ this phase.
pub fn queue_damage_psrs(game: &mut Match) {
    let heavy: Vec<UnitId> = game
        .units
        .values()
        .filter(|u| u.is_alive() && u.kind.can_fall() && u.damage_this_phase >= HEAVY_DAMAGE_THRESHOLD)
        .map(|u| u.id)
        .collect();
    for id in heavy {
        queue_psr(game, id, "took 20+ damage", 1);
    }
}

/// Resolve queued rolls in order. With `only`, other units' rolls stay queued.
pub fn drain_psrs(game: &mut Match, only: Option<UnitId>) {
    let queued = std::mem::take(&mut game.pending_psrs);
    let (mine, rest): (Vec<_>, Vec<_>) = queued.into_iter().partition(|r| only.map(|u| u == r.unit).unwrap_or(true));
    game.pending_psrs = rest;

    let mut fallen: BTreeSet<UnitId> = BTreeSet::new();
    for request in mine {
        let skip = match game.unit(request.unit) {
            None => true,
            Some(unit) => !unit.is_alive() || unit.status.prone,
        };
        if skip || fallen.contains(&request.unit) {
            continue;
        }
        if roll_request(game, &request) == PsrOutcome::Failed {
            fallen.insert(request.unit);
            cascade::run(game, vec![DamageJob::Fall { unit: request.unit, height: 0 }]);
        }
    }
}

/// Consciousness roll after crew damage. Returns true if the crew stays awake.
pub fn consciousness_check(game: &mut Match, unit: UnitId) -> bool {
    let Some(u) = game.unit(unit) else { return false };
    if u.crew.dead {
        return false;
    }
    let Some(target) = u.crew.consciousness_target() else { return true };
    let name = u.name.clone();
    let roll = game.rng.roll_2d6();
    let awake = roll.total() >= target;
    if let Some(u) = game.unit_mut(unit) {
        u.crew.unconscious = !awake;
    }
    game.report(
        ReportKind::Crew,
        Some(unit),
        format!(
            "{} crew consciousness roll, needs {}, rolls {}: {}",
            name,
            target,
            roll,
            if awake { "stays conscious" } else { "knocked unconscious" }
        ),
    );
    awake
}

// =============================================================================
// TESTS
// =============================================================================
