//! End Phase
//!
//! Round bookkeeping, in order: heat, burning units, fire and smoke, crew
//! recovery, swarm and transport clean-up, removal of the dead, victory.

use std::collections::BTreeSet;

use tracing::info;

use crate::game::combat::cascade::{self, clustered_damage, DamageJob};
use crate::game::combat::damage::DamageSource;
use crate::game::combat::hitloc::{HitTable, Side};
use crate::game::combat::{physical, secondary, CombatResolver};
use crate::game::events::ReportKind;
use crate::game::state::{Match, TeamId, Victory};
use crate::game::unit::{HasHeat, UnitId, UnitKind};

/// Heat a walker picks up standing in a burning hex at the end of the round.
pub const FIRE_STANDING_HEAT: u32 = 5;

/// Run the whole End phase.
pub fn resolve_end_phase(game: &mut Match, combat: &dyn CombatResolver) {
    environmental_heat(game);
    combat.resolve_heat(game);
    burn_units(game);
    secondary::resolve_fires(game);
    wake_crews(game);
    recover_vehicle_crews(game);
    clean_up_swarms(game);
    clean_up_transports(game);
    let removed = game.remove_destroyed();
    if !removed.is_empty() {
        info!(round = game.round, removed = removed.len(), "destroyed units removed");
    }
    check_victory(game);
}

fn environmental_heat(game: &mut Match) {
    let burning: BTreeSet<_> = game.board.burning_hexes().into_iter().collect();
    for unit in game.units.values_mut() {
        if !unit.is_on_board() || !unit.kind.tracks_heat() {
            continue;
        }
        if unit.position.map(|p| burning.contains(&p)).unwrap_or(false) {
            unit.heat_buildup += FIRE_STANDING_HEAT;
        }
    }
}

/// Units covered in burning gel take a d6 each round until it burns out.
fn burn_units(game: &mut Match) {
    let burning: Vec<UnitId> = game
        .units
        .values()
        .filter(|u| u.is_alive() && u.status.burning > 0)
        .map(|u| u.id)
        .collect();
    for id in burning {
        let Some(unit) = game.unit_mut(id) else { continue };
        unit.status.burning -= 1;
        let name = unit.name.clone();
        let heat = unit.kind.tracks_heat();
        let roll = game.rng.d6() as u32;
        let jobs = if heat {
            vec![DamageJob::Heat { target: id, amount: roll }]
        } else {
            game.report(ReportKind::Fire, Some(id), format!("{} burns for {} damage", name, roll));
            clustered_damage(game, id, roll, roll, Side::Front, HitTable::Standard, DamageSource::Fire)
        };
        cascade::run(game, jobs);
    }
}

fn wake_crews(game: &mut Match) {
    let sleepers: Vec<UnitId> = game
        .units
        .values()
        .filter(|u| u.is_alive() && u.crew.unconscious && !u.crew.dead)
        .map(|u| u.id)
        .collect();
    for id in sleepers {
        let Some(unit) = game.unit(id) else { continue };
        let name = unit.name.clone();
        let (awake, text) = match unit.crew.consciousness_target() {
            None => (true, format!("{} crew regains consciousness", name)),
            Some(target) => {
                let roll = game.rng.roll_2d6();
                let awake = roll.total() >= target;
                let verdict = if awake { "wakes up" } else { "stays unconscious" };
                (awake, format!("{} crew recovery roll, needs {}, rolls {}: {}", name, target, roll, verdict))
            }
        };
        if let Some(unit) = game.unit_mut(id) {
            unit.crew.unconscious = !awake;
        }
        game.report(ReportKind::Crew, Some(id), text);
    }
}

fn recover_vehicle_crews(game: &mut Match) {
    for unit in game.units.values_mut() {
        if let UnitKind::Vehicle(systems) = &mut unit.kind {
            systems.crew_stunned = systems.crew_stunned.saturating_sub(1);
        }
    }
}

/// Drop swarm links whose ends are dead or no longer together.
fn clean_up_swarms(game: &mut Match) {
    let pairs: Vec<(UnitId, UnitId)> = game
        .units
        .values()
        .filter_map(|u| u.swarming.map(|target| (u.id, target)))
        .collect();
    for (swarmer, target) in pairs {
        let held = match (game.unit(swarmer), game.unit(target)) {
            (Some(s), Some(t)) => s.is_alive() && t.is_alive() && s.position == t.position,
            _ => false,
        };
        if !held {
            physical::detach_swarmer(game, swarmer);
        }
    }
}

/// Passengers of carriers destroyed this round either climb out or die with it.
pub fn clean_up_transports(game: &mut Match) {
    let wrecks: Vec<UnitId> = game
        .units
        .values()
        .filter(|u| u.status.destroyed && !u.transport.carrying.is_empty())
        .map(|u| u.id)
        .collect();
    let survive = game.options.passengers_survive_carrier_destruction;
    for carrier in wrecks {
        let Some(wreck) = game.unit_mut(carrier) else { continue };
        let passengers = std::mem::take(&mut wreck.transport.carrying);
        let position = wreck.position;
        for id in passengers {
            let Some(passenger) = game.unit(id) else { continue };
            if !passenger.is_alive() {
                continue;
            }
            let name = passenger.name.clone();
            let room = match position {
                Some(coords) => game.can_stack(passenger, coords),
                None => false,
            };
            if let Some(p) = game.unit_mut(id) {
                p.transport.carried_by = None;
            }
            match position {
                Some(coords) if survive && room => {
                    if let Some(p) = game.unit_mut(id) {
                        p.position = Some(coords);
                        p.status.deployed = true;
                    }
                    game.report(
                        ReportKind::Movement,
                        Some(id),
                        format!("{} escapes the wreck at {}", name, coords),
                    );
                }
                _ => {
                    game.destroy_unit(id, "carrier destroyed");
                }
            }
        }
    }
}

// =============================================================================
// VICTORY
// =============================================================================

/// Teams that still have a living unit, deployed or waiting to deploy.
pub fn surviving_teams(game: &Match) -> BTreeSet<TeamId> {
    game.units
        .values()
        .filter(|u| u.is_alive())
        .filter_map(|u| game.team_of(u.owner))
        .collect()
}

/// Declare a winner when one team is left or the round limit is reached.
pub fn check_victory(game: &mut Match) -> bool {
    if game.victory.is_some() {
        return true;
    }
    let teams = surviving_teams(game);
    let victory = if teams.len() <= 1 {
        let winner = teams.into_iter().next();
        let reason = match winner {
            Some(team) => format!("team {} is the last one standing", team.0),
            None => "no units survive".to_string(),
        };
        Some(Victory { winner, round: game.round, reason })
    } else if game.options.max_rounds.map(|limit| game.round >= limit).unwrap_or(false) {
        Some(Victory { winner: None, round: game.round, reason: "round limit reached".to_string() })
    } else {
        None
    };
    let Some(victory) = victory else { return false };
    info!(round = victory.round, winner = ?victory.winner, reason = %victory.reason, "match decided");
    game.report(ReportKind::Victory, None, format!("Game over: {}", victory.reason));
    game.victory = Some(victory);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hex::HexCoord;
    use crate::game::board::Fire;
    use crate::game::combat::StandardCombat;
    use crate::game::testkit;
    use crate::game::unit::{MotiveType, Unit};

    fn apc_with_squad(game: &mut Match) -> (UnitId, UnitId) {
        let coords = HexCoord::from_offset(5, 5);
        let mut apc = Unit::vehicle(UnitId(5), "Packrat", testkit::RED, 20, 6, MotiveType::Wheeled, false, 10);
        apc.transport.capacity = 5;
        apc.position = Some(coords);
        apc.status.deployed = true;
        apc.transport.carrying = vec![UnitId(6)];
        let mut squad = Unit::infantry(UnitId(6), "Rifles", testkit::RED, 28, 1);
        squad.position = Some(coords);
        squad.status.deployed = true;
        squad.transport.carried_by = Some(UnitId(5));
        game.add_unit(apc);
        game.add_unit(squad);
        (UnitId(5), UnitId(6))
    }

    #[test]
    fn test_passengers_escape_destroyed_carrier() {
        let mut game = testkit::duel();
        let (apc, squad) = apc_with_squad(&mut game);
        game.destroy_unit(apc, "test");
        clean_up_transports(&mut game);
        let squad = game.unit(squad).unwrap();
        assert!(squad.is_on_board());
        assert_eq!(squad.position, Some(HexCoord::from_offset(5, 5)));
    }

    #[test]
    fn test_passengers_die_with_carrier_when_configured() {
        let mut game = testkit::duel();
        game.options.passengers_survive_carrier_destruction = false;
        let (apc, squad) = apc_with_squad(&mut game);
        game.destroy_unit(apc, "test");
        clean_up_transports(&mut game);
        assert!(!game.unit(squad).unwrap().is_alive());
    }

    #[test]
    fn test_last_team_standing_wins() {
        let mut game = testkit::duel();
        assert!(!check_victory(&mut game));
        game.destroy_unit(testkit::BLUE_MECH, "test");
        assert!(check_victory(&mut game));
        assert_eq!(game.victory.as_ref().and_then(|v| v.winner), Some(testkit::RED_TEAM));
    }

    #[test]
    fn test_round_limit_is_a_draw() {
        let mut game = testkit::duel();
        game.options.max_rounds = Some(3);
        game.round = 3;
        assert!(check_victory(&mut game));
        assert_eq!(game.victory.as_ref().map(|v| v.winner), Some(None));
    }

    #[test]
    fn test_end_phase_removes_dead_and_heats_fire() {
        let mut game = testkit::duel();
        let pos = game.unit(testkit::RED_MECH).unwrap().position.unwrap();
        if let Some(hex) = game.board.hex_mut(pos) {
            hex.fire = Some(Fire { turns: 0 });
        }
        game.destroy_unit(testkit::BLUE_MECH, "test");
        resolve_end_phase(&mut game, &StandardCombat);
        assert!(game.unit(testkit::BLUE_MECH).is_none());
        assert!(game.graveyard.contains_key(&testkit::BLUE_MECH));
        // Five heat from the fire against ten sinks leaves nothing.
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().heat, 0);
        assert!(game.reports.of_kind(ReportKind::Heat).any(|r| r.text.contains("gains 5 heat")));
        assert!(game.victory.is_some());
    }

    #[test]
    fn test_unconscious_crew_with_no_hits_wakes() {
        let mut game = testkit::duel();
        if let Some(u) = game.unit_mut(testkit::RED_MECH) {
            u.crew.unconscious = true;
        }
        wake_crews(&mut game);
        assert!(game.unit(testkit::RED_MECH).unwrap().crew.is_active());
    }
}
