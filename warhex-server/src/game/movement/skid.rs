//! Skids.
//!
//! A unit that fails to keep its footing while turning at a run slides on in
//! the direction it was travelling. The slide stops early at the board edge,
//! at higher ground, against a building or against the first unit in its
//! way, which takes charge-like damage and may be shoved aside.

use tracing::debug;

use crate::core::hex::Facing;
use crate::game::combat::cascade::{clustered_damage, DamageJob};
use crate::game::combat::damage::DamageSource;
use crate::game::combat::hitloc::{side_of, HitTable, Side};
use crate::game::combat::physical::{charge_damage, charge_self_damage, displace};
use crate::game::combat::secondary;
use crate::game::events::ReportKind;
use crate::game::state::Match;
use crate::game::unit::{CanFall, UnitId};

/// Slide `unit` up to `distance` hexes along `direction`.
pub fn resolve_skid(game: &mut Match, unit_id: UnitId, direction: Facing, distance: u32) -> Vec<DamageJob> {
    let Some(unit) = game.unit(unit_id) else { return Vec::new() };
    let Some(start) = unit.position else { return Vec::new() };
    let name = unit.name.clone();
    let weight = unit.weight;
    let can_fall = unit.kind.can_fall();
    game.report(
        ReportKind::Movement,
        Some(unit_id),
        format!("{} skids {} hex(es) toward {:?}", name, distance, direction),
    );

    let mut jobs = Vec::new();
    let mut position = start;
    let mut slid = 0;
    while slid < distance {
        let next = position.neighbor(direction);
        let (Some(here), Some(there)) = (game.board.hex(position), game.board.hex(next)) else {
            break;
        };
        if there.level > here.level {
            break;
        }
        if game.board.building_at(next).is_some() {
            game.report(ReportKind::Movement, Some(unit_id), format!("{} slams into the building at {}", name, next));
            jobs.extend(secondary::damage_building(game, next, weight.div_ceil(10)));
            break;
        }
        let victim = game.units_at(next).into_iter().find(|id| *id != unit_id);
        if let Some(victim) = victim {
            let victim_weight = game.unit(victim).map(|u| u.weight).unwrap_or(0);
            let side = game.unit(victim).map(|u| side_of(u, position)).unwrap_or(Side::Front);
            game.report(ReportKind::Movement, Some(unit_id), format!("{} skids into {}", name, victim));
            let damage = charge_damage(weight, slid + 2);
            jobs.extend(clustered_damage(game, victim, damage, 5, side, HitTable::Standard, DamageSource::Collision));
            jobs.extend(clustered_damage(
                game,
                unit_id,
                charge_self_damage(victim_weight),
                5,
                Side::Front,
                HitTable::Standard,
                DamageSource::Collision,
            ));
            jobs.extend(displace(game, victim, direction));
            let cleared = game.unit(victim).and_then(|u| u.position) != Some(next);
            let fits = game.unit(unit_id).map(|u| game.can_stack(u, next)).unwrap_or(false);
            if cleared && fits {
                position = next;
                slid += 1;
            }
            break;
        }
        position = next;
        slid += 1;
        if let Some(u) = game.unit_mut(unit_id) {
            u.position = Some(position);
        }
        jobs.extend(secondary::enter_minefields(game, unit_id, position));
    }

    if let Some(u) = game.unit_mut(unit_id) {
        u.position = Some(position);
        u.elevation = 0;
        u.movement.hexes_moved += slid;
    }
    debug!(unit = unit_id.0, slid, %position, "skid finished");
    if can_fall {
        jobs.push(DamageJob::Fall { unit: unit_id, height: 0 });
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testkit;

    #[test]
    fn test_skid_slides_and_falls() {
        let mut game = testkit::duel();
        let start = game.unit(testkit::RED_MECH).and_then(|u| u.position).unwrap();
        let jobs = resolve_skid(&mut game, testkit::RED_MECH, Facing::N, 2);
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().position, Some(start.translated(Facing::N, 2)));
        assert_eq!(jobs.last(), Some(&DamageJob::Fall { unit: testkit::RED_MECH, height: 0 }));
    }

    #[test]
    fn test_skid_stops_at_board_edge() {
        let mut game = testkit::duel();
        let edge = crate::core::hex::HexCoord::from_offset(3, 0);
        if let Some(u) = game.unit_mut(testkit::RED_MECH) {
            u.position = Some(edge);
        }
        resolve_skid(&mut game, testkit::RED_MECH, Facing::N, 3);
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().position, Some(edge));
    }

    #[test]
    fn test_skid_into_unit_damages_both() {
        let mut game = testkit::duel();
        let red = game.unit(testkit::RED_MECH).and_then(|u| u.position).unwrap();
        if let Some(u) = game.unit_mut(testkit::BLUE_MECH) {
            u.position = Some(red.translated(Facing::N, 2));
        }
        let jobs = resolve_skid(&mut game, testkit::RED_MECH, Facing::N, 3);
        crate::game::combat::cascade::run(&mut game, jobs);
        let blue = game.unit(testkit::BLUE_MECH).unwrap();
        assert!(blue.damage_this_phase > 0);
        assert_eq!(blue.position, Some(red.translated(Facing::N, 3)));
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().position, Some(red.translated(Facing::N, 2)));
    }
}
