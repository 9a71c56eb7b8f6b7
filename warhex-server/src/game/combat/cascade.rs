//! Damage Cascade
//!
//! Every consequence of damage (critical rolls, ammunition explosions, crew
//! hits, falls, fires, building damage) is a [`DamageJob`]. `run` drains a
//! work queue until nothing is left. Follow-up jobs are pushed to the front
//! of the queue in the order they were produced, so a cascade resolves
//! depth-first and in a fixed order without recursion.

use std::collections::VecDeque;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hex::HexCoord;
use crate::game::combat::critical;
use crate::game::combat::damage::{allocate_damage, DamagePacket, DamageSource};
use crate::game::combat::hitloc::{roll_location, side_of, HitTable, Side};
use crate::game::combat::cluster::group_damage;
use crate::game::combat::secondary;
use crate::game::events::ReportKind;
use crate::game::movement::fall;
use crate::game::psr;
use crate::game::state::Match;
use crate::game::unit::{mech_loc, EquipmentId, UnitId, UnitKind};

/// One unit of cascading work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageJob {
    /// Allocate a damage packet
    Damage {
        /// Unit hit
        target: UnitId,
        /// Damage
        packet: DamagePacket,
    },
    /// Roll on the critical table for a location
    CriticalRoll {
        /// Unit hit
        target: UnitId,
        /// Location index
        location: usize,
    },
    /// Vehicle motive system damage roll
    MotiveDamage {
        /// Vehicle hit
        target: UnitId,
    },
    /// Damage to the crew
    CrewHits {
        /// Unit whose crew is hurt
        target: UnitId,
        /// Hits
        hits: u8,
    },
    /// An ammunition bin explodes
    AmmoExplosion {
        /// Unit carrying the bin
        target: UnitId,
        /// Equipment index of the bin
        equipment: EquipmentId,
    },
    /// Roll for a destroyed engine blowing up
    EngineExplosionCheck {
        /// Unit whose engine failed
        target: UnitId,
    },
    /// Blast damage by distance from a hex (`rings[n]` at distance n)
    AreaDamage {
        /// Centre of the blast
        center: HexCoord,
        /// Damage per ring
        rings: Vec<u32>,
        /// Unit spared (the source of the blast)
        exclude: Option<UnitId>,
        /// Cause
        source: DamageSource,
    },
    /// Heat added to a walker for the End phase
    Heat {
        /// Unit heated
        target: UnitId,
        /// Heat points
        amount: u32,
    },
    /// Try to set a hex alight
    Ignite {
        /// Hex
        coords: HexCoord,
        /// Added to the ignition roll
        modifier: i32,
        /// Ignites without rolling
        automatic: bool,
    },
    /// Reduce a building hex's CF
    BuildingDamage {
        /// Building hex
        coords: HexCoord,
        /// CF lost
        amount: u32,
    },
    /// A unit falls `height` levels
    Fall {
        /// Unit falling
        unit: UnitId,
        /// Levels dropped
        height: i32,
    },
    /// A unit is destroyed outright
    Destroy {
        /// Unit destroyed
        target: UnitId,
        /// Why
        reason: String,
    },
}

/// Drain `jobs` and everything they cause.
pub fn run(game: &mut Match, jobs: Vec<DamageJob>) {
    let mut queue: VecDeque<DamageJob> = jobs.into();
    let mut steps = 0usize;
    while let Some(job) = queue.pop_front() {
        steps += 1;
        let follow_ups = step(game, job);
        for job in follow_ups.into_iter().rev() {
            queue.push_front(job);
        }
    }
    if steps > 1 {
        debug!(steps, "damage cascade drained");
    }
}

fn step(game: &mut Match, job: DamageJob) -> Vec<DamageJob> {
    match job {
        DamageJob::Damage { target, packet } => apply_damage(game, target, packet),
        DamageJob::CriticalRoll { target, location } => critical::roll_criticals(game, target, location),
        DamageJob::MotiveDamage { target } => critical::motive_damage(game, target),
        DamageJob::CrewHits { target, hits } => crew_hits(game, target, hits),
        DamageJob::AmmoExplosion { target, equipment } => critical::explode_ammo(game, target, equipment),
        DamageJob::EngineExplosionCheck { target } => critical::engine_explosion_check(game, target),
        DamageJob::AreaDamage { center, rings, exclude, source } => area_damage(game, center, &rings, exclude, source),
        DamageJob::Heat { target, amount } => {
            if let Some(unit) = game.unit_mut(target) {
                unit.heat_buildup += amount;
            }
            Vec::new()
        }
        DamageJob::Ignite { coords, modifier, automatic } => {
            secondary::try_ignite(game, coords, modifier, automatic);
            Vec::new()
        }
        DamageJob::BuildingDamage { coords, amount } => secondary::damage_building(game, coords, amount),
        DamageJob::Fall { unit, height } => fall::resolve_fall(game, unit, height),
        DamageJob::Destroy { target, reason } => {
            game.destroy_unit(target, &reason);
            Vec::new()
        }
    }
}

fn apply_damage(game: &mut Match, target: UnitId, packet: DamagePacket) -> Vec<DamageJob> {
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    let outcome = allocate_damage(unit, &packet);
    let is_vehicle = matches!(unit.kind, UnitKind::Vehicle(_));
    let is_mech = matches!(unit.kind, UnitKind::Mech(_));
    let name = unit.name.clone();
    let location_name = |i: usize| unit.locations.get(i).map(|l| l.name.clone()).unwrap_or_default();
    let hit_name = location_name(packet.hit.location);
    let destroyed_names: Vec<String> = outcome.destroyed_locations.iter().map(|i| location_name(*i)).collect();

    debug!(unit = target.0, amount = packet.amount, location = packet.hit.location, "damage allocated");
    game.report(
        ReportKind::Damage,
        Some(target),
        format!(
            "{} takes {} damage to {}{}",
            name,
            packet.amount,
            hit_name,
            if packet.hit.rear { " (rear)" } else { "" }
        ),
    );
    for location in destroyed_names {
        game.report(ReportKind::Damage, Some(target), format!("{} {} destroyed", name, location));
    }

    let mut jobs = Vec::new();
    for location in &outcome.crit_checks {
        jobs.push(DamageJob::CriticalRoll { target, location: *location });
    }
    if packet.hit.motive && is_vehicle {
        jobs.push(DamageJob::MotiveDamage { target });
    }
    if outcome.crew_hits > 0 {
        jobs.push(DamageJob::CrewHits { target, hits: outcome.crew_hits });
    }
    if is_mech && outcome.destroyed_locations.iter().any(|l| *l == mech_loc::RL || *l == mech_loc::LL) {
        psr::queue_automatic_fall(game, target, "leg destroyed");
    }
    if let Some(reason) = outcome.unit_destroyed {
        jobs.push(DamageJob::Destroy { target, reason });
    }
    jobs
}

fn crew_hits(game: &mut Match, target: UnitId, hits: u8) -> Vec<DamageJob> {
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    if unit.kind.is_infantry() || unit.crew.dead {
        return Vec::new();
    }
    let killed = unit.crew.apply_hits(hits);
    let total = unit.crew.hits;
    let name = unit.name.clone();
    game.report(ReportKind::Crew, Some(target), format!("{} crew takes {} hit(s), {} total", name, hits, total));
    if killed {
        return vec![DamageJob::Destroy { target, reason: "crew killed".to_string() }];
    }
    psr::consciousness_check(game, target);
    Vec::new()
}

fn area_damage(
    game: &mut Match,
    center: HexCoord,
    rings: &[u32],
    exclude: Option<UnitId>,
    source: DamageSource,
) -> Vec<DamageJob> {
    let mut jobs = Vec::new();
    for (distance, amount) in rings.iter().enumerate() {
        if *amount == 0 {
            continue;
        }
        for coords in center.ring(distance as u32) {
            if game.board.building_at(coords).is_some() {
                jobs.push(DamageJob::BuildingDamage { coords, amount: *amount });
            }
            for id in game.units_at(coords) {
                if Some(id) == exclude {
                    continue;
                }
                let side = game.unit(id).map(|u| side_of(u, center)).unwrap_or(Side::Front);
                jobs.extend(clustered_damage(game, id, *amount, 5, side, HitTable::Standard, source));
            }
        }
    }
    jobs
}

/// Roll locations for `total` damage grouped into clusters of `group`.
///
/// Infantry in the open take the damage as one block.
pub fn clustered_damage(
    game: &mut Match,
    target: UnitId,
    total: u32,
    group: u32,
    side: Side,
    table: HitTable,
    source: DamageSource,
) -> Vec<DamageJob> {
    let Some(unit) = game.units.get(&target) else { return Vec::new() };
    let group = if matches!(unit.kind, UnitKind::Infantry) { total.max(1) } else { group };
    let mut jobs = Vec::new();
    for amount in group_damage(total, group) {
        let Some(unit) = game.units.get(&target) else { break };
        let Some(hit) = roll_location(&mut game.rng, unit, side, table) else {
            continue;
        };
        jobs.push(DamageJob::Damage { target, packet: DamagePacket::new(amount, hit, source) });
    }
    jobs
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::hitloc::HitData;
    use crate::game::testkit;
    use crate::game::unit::{AmmoBin, AmmoType, EquipmentKind, Mounted, Munition};

    #[test]
    fn test_destroying_center_torso_destroys_unit() {
        let mut game = testkit::duel();
        run(
            &mut game,
            vec![DamageJob::Damage {
                target: testkit::BLUE_MECH,
                packet: DamagePacket::new(200, HitData::new(mech_loc::CT), DamageSource::Weapon),
            }],
        );
        let unit = game.unit(testkit::BLUE_MECH).unwrap();
        assert!(unit.status.destroyed);
        assert_eq!(game.reports.of_kind(ReportKind::Destroyed).count(), 1);
    }

    #[test]
    fn test_ammo_explosion_cascade() {
        let mut game = testkit::duel();
        let bin = game.unit_mut(testkit::BLUE_MECH).map(|u| {
            u.add_equipment(Mounted::new(
                "SRM Ammo",
                mech_loc::LT,
                EquipmentKind::Ammo(AmmoBin {
                    ammo_type: AmmoType::Srm,
                    munition: Munition::Standard,
                    shots: 15,
                    damage_per_shot: 2,
                }),
            ))
        });
        run(&mut game, vec![DamageJob::AmmoExplosion { target: testkit::BLUE_MECH, equipment: bin.unwrap() }]);
        let unit = game.unit(testkit::BLUE_MECH).unwrap();
        // 30 points straight into structure: the left torso (12) goes with
        // its arm and the remaining 18 gut the centre torso (16).
        assert!(unit.locations[mech_loc::LT].destroyed);
        assert!(unit.locations[mech_loc::LA].destroyed);
        assert!(unit.status.destroyed);
        assert_eq!(unit.equipment(bin.unwrap()).and_then(|m| m.ammo()).map(|a| a.shots), Some(0));
        assert!(unit.crew.hits >= 2);
    }

    #[test]
    fn test_crew_killed_destroys_unit() {
        let mut game = testkit::duel();
        run(&mut game, vec![DamageJob::CrewHits { target: testkit::RED_MECH, hits: 6 }]);
        assert!(game.unit(testkit::RED_MECH).unwrap().status.destroyed);
    }

    #[test]
    fn test_corpse_keeps_taking_clusters() {
        let mut game = testkit::duel();
        let jobs = vec![
            DamageJob::Damage {
                target: testkit::BLUE_MECH,
                packet: DamagePacket::new(200, HitData::new(mech_loc::CT), DamageSource::Weapon),
            },
            DamageJob::Damage {
                target: testkit::BLUE_MECH,
                packet: DamagePacket::new(5, HitData::new(mech_loc::LA), DamageSource::Weapon),
            },
        ];
        let la_before = game.unit(testkit::BLUE_MECH).unwrap().locations[mech_loc::LA].armor;
        run(&mut game, jobs);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().locations[mech_loc::LA].armor, la_before - 5);
    }

    #[test]
    fn test_area_damage_spares_source() {
        let mut game = testkit::duel();
        let center = game.unit(testkit::BLUE_MECH).and_then(|u| u.position).unwrap();
        let before = game.unit(testkit::BLUE_MECH).unwrap().total_armor();
        run(
            &mut game,
            vec![DamageJob::AreaDamage {
                center,
                rings: vec![10],
                exclude: Some(testkit::BLUE_MECH),
                source: DamageSource::Explosion,
            }],
        );
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().total_armor(), before);
        run(
            &mut game,
            vec![DamageJob::AreaDamage { center, rings: vec![10], exclude: None, source: DamageSource::Explosion }],
        );
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().total_armor(), before - 10);
    }
}
