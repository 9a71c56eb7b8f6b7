//! Terrain hazards checked when a unit enters a hex.

use tracing::debug;

use crate::core::hex::HexCoord;
use crate::game::board::Magma;
use crate::game::combat::cascade::DamageJob;
use crate::game::events::ReportKind;
use crate::game::psr;
use crate::game::state::Match;
use crate::game::unit::{CanFall, MotiveType, UnitId, UnitKind};

/// Heat a walker picks up wading into liquid magma.
pub const MAGMA_HEAT: u32 = 30;
/// Heat a walker picks up entering a burning hex.
pub const FIRE_HEAT: u32 = 2;
/// 2d6 needed to avoid bogging down in a swamp.
pub const SWAMP_TARGET: i32 = 8;
/// 2d6 infantry need to survive a burning hex.
pub const FIRE_SURVIVAL_TARGET: i32 = 8;

/// What entering a hex did to the unit.
#[derive(Debug, Default)]
pub struct HazardOutcome {
    /// Damage to resolve
    pub jobs: Vec<DamageJob>,
    /// The unit cannot continue its path
    pub stop: bool,
}

/// Apply the hazards of `coords` to `unit`, in the fixed order magma,
/// swamp, ice, water, rubble, fire.
///
/// Piloting rolls are queued, not rolled; they resolve when the move ends.
pub fn enter_hex(game: &mut Match, unit_id: UnitId, coords: HexCoord) -> HazardOutcome {
    let mut outcome = HazardOutcome::default();
    let Some(unit) = game.unit(unit_id) else { return outcome };
    let Some(hex) = game.board.hex(coords).cloned() else { return outcome };
    let walker = unit.kind.can_fall();
    let is_mech = matches!(unit.kind, UnitKind::Mech(_));
    let hover = matches!(&unit.kind, UnitKind::Vehicle(v) if v.motive == MotiveType::Hover);
    let infantry = unit.kind.is_infantry();
    let name = unit.name.clone();

    // Magma
    let mut magma = hex.magma;
    if magma == Some(Magma::Crust) && !hover {
        let roll = game.rng.d6();
        if roll == 6 {
            if let Some(h) = game.board.hex_mut(coords) {
                h.magma = Some(Magma::Liquid);
            }
            game.report(ReportKind::Terrain, Some(unit_id), format!("The magma crust at {} breaks under {}", coords, name));
            magma = Some(Magma::Liquid);
        }
    }
    if magma == Some(Magma::Liquid) && !hover {
        if is_mech {
            game.report(ReportKind::Terrain, Some(unit_id), format!("{} wades into liquid magma", name));
            outcome.jobs.push(DamageJob::Heat { target: unit_id, amount: MAGMA_HEAT });
            psr::queue_psr(game, unit_id, "entered liquid magma", 0);
        } else {
            outcome.jobs.push(DamageJob::Destroy { target: unit_id, reason: "consumed by magma".to_string() });
            outcome.stop = true;
            return outcome;
        }
    }

    // Swamp
    if hex.swamp && !hover {
        let roll = game.rng.roll_2d6();
        if roll.total() < SWAMP_TARGET {
            if let Some(u) = game.unit_mut(unit_id) {
                u.status.stuck = true;
            }
            game.report(
                ReportKind::Terrain,
                Some(unit_id),
                format!("{} bogs down in the swamp at {} ({})", name, coords, roll),
            );
            outcome.stop = true;
        }
    }

    // Ice
    let mut water = if hex.ice { 0 } else { hex.water_depth };
    if hex.ice && hex.water_depth > 0 && !hover {
        let roll = game.rng.d6();
        if roll == 6 {
            if let Some(h) = game.board.hex_mut(coords) {
                h.ice = false;
            }
            game.report(ReportKind::Terrain, Some(unit_id), format!("The ice at {} gives way under {}", coords, name));
            water = hex.water_depth;
            outcome.stop = true;
        }
    }

    // Water
    if water > 0 && walker && !hover {
        let modifier = match water {
            1 => -1,
            2 => 0,
            _ => 1,
        };
        psr::queue_psr(game, unit_id, "entered water", modifier);
    }

    // Rubble
    if hex.rubble && walker {
        psr::queue_psr(game, unit_id, "entered rubble", 0);
    }

    // Fire
    if hex.fire.is_some() {
        if is_mech {
            outcome.jobs.push(DamageJob::Heat { target: unit_id, amount: FIRE_HEAT });
        } else if infantry {
            let roll = game.rng.roll_2d6();
            let survives = roll.total() >= FIRE_SURVIVAL_TARGET;
            game.report(
                ReportKind::Fire,
                Some(unit_id),
                format!(
                    "{} moves through fire at {}, needs {}, rolls {}: {}",
                    name,
                    coords,
                    FIRE_SURVIVAL_TARGET,
                    roll,
                    if survives { "survives" } else { "burns" }
                ),
            );
            if !survives {
                outcome.jobs.push(DamageJob::Destroy { target: unit_id, reason: "burned to death".to_string() });
                outcome.stop = true;
            }
        }
    }

    debug!(unit = unit_id.0, %coords, stop = outcome.stop, jobs = outcome.jobs.len(), "hazards checked");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{Fire, Hex};
    use crate::game::unit::Unit;
    use crate::game::testkit;

    fn ahead(game: &Match) -> HexCoord {
        game.unit(testkit::RED_MECH).and_then(|u| u.position).unwrap().neighbor(crate::core::hex::Facing::N)
    }

    #[test]
    fn test_liquid_magma_heats_mech() {
        let mut game = testkit::duel();
        let coords = ahead(&game);
        game.board.set_hex(coords, Hex { magma: Some(Magma::Liquid), ..Hex::clear(0) });
        let outcome = enter_hex(&mut game, testkit::RED_MECH, coords);
        assert!(outcome.jobs.contains(&DamageJob::Heat { target: testkit::RED_MECH, amount: MAGMA_HEAT }));
        assert_eq!(game.pending_psrs.len(), 1);
    }

    #[test]
    fn test_liquid_magma_destroys_infantry() {
        let mut game = testkit::duel();
        let coords = ahead(&game);
        game.board.set_hex(coords, Hex { magma: Some(Magma::Liquid), ..Hex::clear(0) });
        game.add_unit(Unit::infantry(UnitId(9), "Rifles", testkit::RED, 28, 1));
        let outcome = enter_hex(&mut game, UnitId(9), coords);
        assert!(outcome.stop);
        assert!(matches!(outcome.jobs[0], DamageJob::Destroy { .. }));
    }

    #[test]
    fn test_water_queues_piloting_roll() {
        let mut game = testkit::duel();
        let coords = ahead(&game);
        game.board.set_hex(coords, Hex { water_depth: 1, ..Hex::clear(0) });
        let outcome = enter_hex(&mut game, testkit::RED_MECH, coords);
        assert!(!outcome.stop);
        assert_eq!(game.pending_psrs.len(), 1);
        assert_eq!(game.pending_psrs[0].modifier, -1);
    }

    #[test]
    fn test_fire_heats_mech() {
        let mut game = testkit::duel();
        let coords = ahead(&game);
        game.board.set_hex(coords, Hex { fire: Some(Fire { turns: 1 }), ..Hex::clear(0) });
        let outcome = enter_hex(&mut game, testkit::RED_MECH, coords);
        assert_eq!(outcome.jobs, vec![DamageJob::Heat { target: testkit::RED_MECH, amount: FIRE_HEAT }]);
    }

    #[test]
    fn test_clear_hex_is_harmless() {
        let mut game = testkit::duel();
        let coords = ahead(&game);
        let before = game.rng.state();
        let outcome = enter_hex(&mut game, testkit::RED_MECH, coords);
        assert!(outcome.jobs.is_empty() && !outcome.stop);
        assert_eq!(game.rng.state(), before);
    }
}
