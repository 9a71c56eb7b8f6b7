//! Critical Hits
//!
//! Critical tables per unit kind and the effects of each result. Effects
//! that cause further damage (ammunition, engines) return cascade jobs
//! instead of applying the damage themselves.

use tracing::debug;

use crate::game::combat::cascade::DamageJob;
use crate::game::combat::damage::{destroy_location, AllocationOutcome, DamagePacket, DamageSource};
use crate::game::combat::hitloc::HitData;
use crate::game::events::ReportKind;
use crate::game::psr;
use crate::game::state::Match;
use crate::game::unit::{
    mech_loc, proto_loc, vehicle_loc, EquipmentId, EquipmentKind, MotiveType, SlotKind, Unit, UnitId,
    UnitKind,
};

/// Number of critical hits for a walker or protomech roll.
pub fn critical_count(roll: i32) -> u8 {
    match roll {
        ..=7 => 0,
        8 | 9 => 1,
        10 | 11 => 2,
        _ => 3,
    }
}

/// Vehicle critical results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VehicleCritical {
    /// No effect
    None,
    /// Driver injured
    DriverHit,
    /// Weapon jams
    WeaponMalfunction,
    /// Stabilizer damaged
    Stabilizer,
    /// Sensors damaged
    Sensors,
    /// Commander injured
    CommanderHit,
    /// Weapon destroyed
    WeaponDestroyed,
    /// Crew killed
    CrewKilled,
    /// Crew stunned
    CrewStunned,
    /// Engine hit
    EngineHit,
    /// Fuel tank explodes
    FuelTank,
    /// Ammunition hit
    AmmoHit,
    /// Turret jammed
    TurretJam,
    /// Turret locked
    TurretLock,
    /// Turret blown off
    TurretBlownOff,
}

/// Vehicle table for a roll against `location`.
pub fn vehicle_critical(location: usize, roll: i32) -> VehicleCritical {
    use VehicleCritical::*;
    if roll <= 5 {
        return None;
    }
    match location {
        vehicle_loc::FRONT => match roll {
            6 => DriverHit,
            7 => WeaponMalfunction,
            8 => Stabilizer,
            9 => Sensors,
            10 => CommanderHit,
            11 => WeaponDestroyed,
            _ => CrewKilled,
        },
        vehicle_loc::REAR => match roll {
            6 => WeaponMalfunction,
            7 => None,
            8 => Stabilizer,
            9 => WeaponDestroyed,
            10 => EngineHit,
            11 => AmmoHit,
            _ => FuelTank,
        },
        vehicle_loc::TURRET => match roll {
            6 => Stabilizer,
            7 => TurretJam,
            8 => WeaponMalfunction,
            9 => TurretLock,
            10 => WeaponDestroyed,
            11 => AmmoHit,
            _ => TurretBlownOff,
        },
        _ => match roll {
            6 => None,
            7 => WeaponMalfunction,
            8 => CrewStunned,
            9 => Stabilizer,
            10 => WeaponDestroyed,
            11 => EngineHit,
            _ => FuelTank,
        },
    }
}

/// Roll on the critical table for `location` and apply the results.
pub fn roll_criticals(game: &mut Match, target: UnitId, location: usize) -> Vec<DamageJob> {
    let Some(unit) = game.unit(target) else { return Vec::new() };
    if unit.locations.get(location).is_none() {
        return Vec::new();
    }
    let name = unit.name.clone();
    let location_name = unit.locations[location].name.clone();
    let kind = unit.kind.clone();
    let roll = game.rng.roll_2d6();
    debug!(unit = target.0, location, roll = roll.total(), "critical roll");

    match kind {
        UnitKind::Mech(_) => {
            let count = critical_count(roll.total());
            game.report(
                ReportKind::Critical,
                Some(target),
                format!("{} critical roll on {}: {}, {} critical hit(s)", name, location_name, roll, count),
            );
            let is_limb = !matches!(location, mech_loc::CT | mech_loc::RT | mech_loc::LT);
            if count == 3 && is_limb {
                return blow_off(game, target, location);
            }
            let mut jobs = Vec::new();
            for _ in 0..count {
                jobs.extend(hit_mech_slot(game, target, location));
            }
            jobs
        }
        UnitKind::Vehicle(_) => {
            let result = vehicle_critical(location, roll.total());
            game.report(
                ReportKind::Critical,
                Some(target),
                format!("{} critical roll on {}: {}, {:?}", name, location_name, roll, result),
            );
            apply_vehicle_critical(game, target, location, result)
        }
        UnitKind::BattleArmor => {
            game.report(ReportKind::Critical, Some(target), format!("{} critical roll: {}", name, roll));
            match roll.total() {
                10 | 11 => {
                    destroy_weapon(game, target, None, "squad weapon destroyed");
                    Vec::new()
                }
                12 => {
                    let mut outcome = AllocationOutcome::default();
                    if let Some(unit) = game.unit_mut(target) {
                        destroy_location(unit, location, &mut outcome);
                    }
                    game.report(ReportKind::Critical, Some(target), format!("{} loses {}", name, location_name));
                    outcome
                        .unit_destroyed
                        .map(|reason| vec![DamageJob::Destroy { target, reason }])
                        .unwrap_or_default()
                }
                _ => Vec::new(),
            }
        }
        UnitKind::ProtoMech(_) => {
            let count = critical_count(roll.total());
            game.report(
                ReportKind::Critical,
                Some(target),
                format!("{} critical roll on {}: {}, {} critical hit(s)", name, location_name, roll, count),
            );
            let mut jobs = Vec::new();
            for _ in 0..count {
                jobs.extend(hit_proto_location(game, target, location));
            }
            jobs
        }
        UnitKind::Aero(_) => {
            game.report(ReportKind::Critical, Some(target), format!("{} critical roll: {}", name, roll));
            aero_critical(game, target, roll.total())
        }
        UnitKind::Infantry => Vec::new(),
    }
}

fn blow_off(game: &mut Match, target: UnitId, location: usize) -> Vec<DamageJob> {
    let mut outcome = AllocationOutcome::default();
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    let name = unit.name.clone();
    let location_name = unit.locations[location].name.clone();
    destroy_location(unit, location, &mut outcome);
    game.report(ReportKind::Critical, Some(target), format!("{}'s {} is blown off", name, location_name));
    if location == mech_loc::RL || location == mech_loc::LL {
        psr::queue_automatic_fall(game, target, "leg blown off");
    }
    outcome
        .unit_destroyed
        .map(|reason| vec![DamageJob::Destroy { target, reason }])
        .unwrap_or_default()
}

fn hit_mech_slot(game: &mut Match, target: UnitId, location: usize) -> Vec<DamageJob> {
    let Some(unit) = game.units.get(&target) else { return Vec::new() };
    let candidates = unit.locations[location].hittable_slots();
    let Some(index) = game.rng.choose(&candidates).copied() else {
        let name = unit.name.clone();
        game.report(ReportKind::Critical, Some(target), format!("{} has no critical slots left to hit", name));
        return Vec::new();
    };
    let engine_explosions = game.options.engine_explosions;
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    unit.locations[location].slots[index].hit = true;
    let slot = unit.locations[location].slots[index].kind;
    let name = unit.name.clone();
    let mut jobs = Vec::new();
    let mut fall: Option<&str> = None;
    let mut roll: Option<&str> = None;

    let text = match slot {
        SlotKind::Engine => {
            let hits = match &mut unit.kind {
                UnitKind::Mech(systems) => {
                    systems.engine_hits += 1;
                    systems.engine_hits
                }
                _ => 0,
            };
            if hits >= 3 {
                jobs.push(DamageJob::Destroy { target, reason: "engine destroyed".to_string() });
                if engine_explosions {
                    jobs.push(DamageJob::EngineExplosionCheck { target });
                }
            }
            format!("engine hit ({} total)", hits)
        }
        SlotKind::Gyro => {
            let hits = match &mut unit.kind {
                UnitKind::Mech(systems) => {
                    systems.gyro_hits += 1;
                    systems.gyro_hits
                }
                _ => 0,
            };
            if hits >= 2 {
                fall = Some("gyro destroyed");
            } else {
                roll = Some("gyro hit");
            }
            "gyro hit".to_string()
        }
        SlotKind::Cockpit => {
            unit.crew.dead = true;
            jobs.push(DamageJob::Destroy { target, reason: "cockpit destroyed".to_string() });
            "cockpit destroyed".to_string()
        }
        SlotKind::Sensors => {
            if let UnitKind::Mech(systems) = &mut unit.kind {
                systems.sensor_hits += 1;
            }
            "sensors hit".to_string()
        }
        SlotKind::LifeSupport => {
            if let UnitKind::Mech(systems) = &mut unit.kind {
                systems.life_support_hits += 1;
            }
            "life support hit".to_string()
        }
        SlotKind::Actuator(actuator) => {
            if actuator.is_leg() {
                roll = Some("leg actuator hit");
            }
            format!("{:?} actuator hit", actuator)
        }
        SlotKind::Equipment(id) => equipment_hit(unit, id, target, &mut jobs),
    };

    game.report(ReportKind::Critical, Some(target), format!("{}: {}", name, text));
    if let Some(reason) = fall {
        psr::queue_automatic_fall(game, target, reason);
    }
    if let Some(reason) = roll {
        psr::queue_psr(game, target, reason, 0);
    }
    jobs
}

fn equipment_hit(unit: &mut Unit, id: EquipmentId, target: UnitId, jobs: &mut Vec<DamageJob>) -> String {
    let Some(mounted) = unit.equipment_mut(id) else { return "empty slot".to_string() };
    let name = mounted.name.clone();
    let already = mounted.destroyed;
    mounted.destroyed = true;
    match &mounted.kind {
        EquipmentKind::Ammo(bin) if bin.shots > 0 => {
            jobs.push(DamageJob::AmmoExplosion { target, equipment: id });
            format!("{} hit, ammunition explodes", name)
        }
        EquipmentKind::HeatSink if !already => {
            unit.heat_sinks = unit.heat_sinks.saturating_sub(1);
            format!("{} destroyed", name)
        }
        _ => format!("{} destroyed", name),
    }
}

/// Explode an ammunition bin.
///
/// Remaining shots times damage per shot go to the bin's location ignoring
/// armor, every component in the location is destroyed and the crew takes
/// the configured number of hits.
pub fn explode_ammo(game: &mut Match, target: UnitId, equipment: EquipmentId) -> Vec<DamageJob> {
    let crew_hits = game.options.ammo_explosion_crew_hits;
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    let Some(mounted) = unit.equipment_mut(equipment) else { return Vec::new() };
    let EquipmentKind::Ammo(bin) = &mut mounted.kind else { return Vec::new() };
    let amount = bin.shots * bin.damage_per_shot;
    bin.shots = 0;
    mounted.destroyed = true;
    let location = mounted.location;
    let bin_name = mounted.name.clone();
    if amount == 0 {
        return Vec::new();
    }

    for (index, mounted) in unit.equipment.iter_mut().enumerate() {
        if mounted.location != location {
            continue;
        }
        mounted.destroyed = true;
        if let EquipmentKind::Ammo(bin) = &mut mounted.kind {
            bin.shots = 0;
        }
        if let Some(slot) = unit.locations[location]
            .slots
            .iter_mut()
            .find(|s| s.kind == SlotKind::Equipment(EquipmentId(index as u16)))
        {
            slot.hit = true;
        }
    }
    let name = unit.name.clone();
    game.report(
        ReportKind::Critical,
        Some(target),
        format!("{}: {} explodes for {} damage", name, bin_name, amount),
    );

    let mut packet = DamagePacket::new(amount, HitData::new(location), DamageSource::Explosion);
    packet.ignore_armor = true;
    let mut jobs = vec![DamageJob::Damage { target, packet }];
    if crew_hits > 0 {
        jobs.push(DamageJob::CrewHits { target, hits: crew_hits });
    }
    jobs
}

/// Roll for a destroyed engine blowing up (2d6 = 12).
pub fn engine_explosion_check(game: &mut Match, target: UnitId) -> Vec<DamageJob> {
    let Some(unit) = game.unit(target) else { return Vec::new() };
    let Some(center) = unit.position else { return Vec::new() };
    let rating = unit.engine_rating;
    let name = unit.name.clone();
    let roll = game.rng.roll_2d6();
    if roll.total() < 12 {
        game.report(ReportKind::Critical, Some(target), format!("{} engine explosion check: {}, no explosion", name, roll));
        return Vec::new();
    }
    game.report(ReportKind::Critical, Some(target), format!("{} engine explodes ({})", name, roll));
    let mut jobs: Vec<DamageJob> = game
        .units_at(center)
        .into_iter()
        .filter(|id| *id != target)
        .map(|id| DamageJob::Destroy { target: id, reason: "engine explosion".to_string() })
        .collect();
    jobs.push(DamageJob::AreaDamage {
        center,
        rings: vec![0, rating / 10, rating / 20, rating / 40],
        exclude: Some(target),
        source: DamageSource::Explosion,
    });
    jobs
}

/// Vehicle motive system damage roll.
pub fn motive_damage(game: &mut Match, target: UnitId) -> Vec<DamageJob> {
    let Some(unit) = game.unit(target) else { return Vec::new() };
    let UnitKind::Vehicle(systems) = &unit.kind else { return Vec::new() };
    let modifier = match systems.motive {
        MotiveType::Hover => 3,
        MotiveType::Wheeled => 2,
        MotiveType::Tracked => 0,
    };
    let name = unit.name.clone();
    let roll = game.rng.roll_2d6();
    let total = roll.total() + modifier;
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    let cruise = unit.walk_mp;
    let UnitKind::Vehicle(systems) = &mut unit.kind else { return Vec::new() };
    let effect = match total {
        ..=5 => "no effect".to_string(),
        6 | 7 => {
            systems.motive_penalty += 1;
            "minor damage, -1 cruise MP".to_string()
        }
        8 | 9 => {
            systems.motive_penalty += 2;
            "moderate damage, -2 cruise MP".to_string()
        }
        10 | 11 => {
            let remaining = cruise.saturating_sub(systems.motive_penalty);
            systems.motive_penalty += remaining - remaining / 2;
            "heavy damage, cruise MP halved".to_string()
        }
        _ => {
            systems.immobilized = true;
            "immobilized".to_string()
        }
    };
    game.report(
        ReportKind::Critical,
        Some(target),
        format!("{} motive damage roll {} (+{}): {}", name, roll, modifier, effect),
    );
    Vec::new()
}

fn apply_vehicle_critical(game: &mut Match, target: UnitId, location: usize, result: VehicleCritical) -> Vec<DamageJob> {
    use VehicleCritical::*;
    match result {
        WeaponMalfunction => {
            jam_weapon(game, target, Some(location));
            return Vec::new();
        }
        WeaponDestroyed => {
            destroy_weapon(game, target, Some(location), "weapon destroyed");
            return Vec::new();
        }
        _ => {}
    }
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    let mut jobs = Vec::new();
    match result {
        None => {}
        CrewKilled => {
            unit.crew.dead = true;
            jobs.push(DamageJob::Destroy { target, reason: "crew killed".to_string() });
        }
        FuelTank => jobs.push(DamageJob::Destroy { target, reason: "fuel tank destroyed".to_string() }),
        AmmoHit => {
            let bin = unit
                .equipment
                .iter()
                .position(|m| !m.destroyed && m.ammo().map(|a| a.shots > 0).unwrap_or(false));
            if let Some(index) = bin {
                jobs.push(DamageJob::AmmoExplosion { target, equipment: EquipmentId(index as u16) });
            }
        }
        TurretBlownOff => {
            let mut outcome = AllocationOutcome::default();
            destroy_location(unit, vehicle_loc::TURRET, &mut outcome);
        }
        _ => {
            if let UnitKind::Vehicle(systems) = &mut unit.kind {
                match result {
                    DriverHit => systems.driver_hit = true,
                    CommanderHit => systems.commander_hit = true,
                    Stabilizer => systems.stabilizer_hits += 1,
                    Sensors => systems.sensor_hits += 1,
                    CrewStunned => systems.crew_stunned = 2,
                    EngineHit => systems.engine_hit = true,
                    TurretJam | TurretLock => systems.turret_locked = true,
                    _ => {}
                }
            }
        }
    }
    jobs
}

fn hit_proto_location(game: &mut Match, target: UnitId, location: usize) -> Vec<DamageJob> {
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    let hits = match &mut unit.kind {
        UnitKind::ProtoMech(systems) => {
            systems.location_hits[location] = systems.location_hits[location].saturating_add(1);
            systems.location_hits[location]
        }
        _ => return Vec::new(),
    };
    let name = unit.name.clone();
    let location_name = unit.locations[location].name.clone();
    game.report(ReportKind::Critical, Some(target), format!("{}: {} critical hit ({} total)", name, location_name, hits));
    match location {
        proto_loc::TORSO if hits >= 3 => vec![DamageJob::Destroy { target, reason: "torso systems destroyed".to_string() }],
        proto_loc::HEAD => vec![DamageJob::CrewHits { target, hits: 1 }],
        proto_loc::RIGHT_ARM | proto_loc::LEFT_ARM | proto_loc::MAIN_GUN => {
            destroy_weapon(game, target, Some(location), "weapon destroyed");
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn aero_critical(game: &mut Match, target: UnitId, roll: i32) -> Vec<DamageJob> {
    if roll == 10 {
        destroy_weapon(game, target, None, "weapon destroyed");
        return Vec::new();
    }
    let Some(unit) = game.unit_mut(target) else { return Vec::new() };
    let UnitKind::Aero(systems) = &mut unit.kind else { return Vec::new() };
    match roll {
        8 => vec![DamageJob::CrewHits { target, hits: 1 }],
        9 => {
            systems.fcs_hits += 1;
            Vec::new()
        }
        11 => vec![DamageJob::Destroy { target, reason: "fuel tank destroyed".to_string() }],
        12 => {
            systems.engine_hits += 1;
            if systems.engine_hits >= 3 {
                vec![DamageJob::Destroy { target, reason: "engine destroyed".to_string() }]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// First usable weapon, preferring `location`.
fn pick_weapon(unit: &Unit, location: Option<usize>) -> Option<EquipmentId> {
    let weapons = unit.usable_weapons();
    location
        .and_then(|loc| weapons.iter().copied().find(|w| unit.equipment(*w).map(|m| m.location == loc).unwrap_or(false)))
        .or_else(|| weapons.first().copied())
}

fn destroy_weapon(game: &mut Match, target: UnitId, location: Option<usize>, text: &str) {
    let Some(unit) = game.unit_mut(target) else { return };
    let Some(id) = pick_weapon(unit, location) else { return };
    let name = unit.name.clone();
    let mut weapon = String::new();
    if let Some(mounted) = unit.equipment_mut(id) {
        mounted.destroyed = true;
        weapon = mounted.name.clone();
    }
    game.report(ReportKind::Critical, Some(target), format!("{}: {} ({})", name, text, weapon));
}

fn jam_weapon(game: &mut Match, target: UnitId, location: Option<usize>) {
    let Some(unit) = game.unit_mut(target) else { return };
    let Some(id) = pick_weapon(unit, location) else { return };
    let name = unit.name.clone();
    let mut weapon = String::new();
    if let Some(mounted) = unit.equipment_mut(id) {
        mounted.jammed = true;
        weapon = mounted.name.clone();
    }
    game.report(ReportKind::Critical, Some(target), format!("{}: {} jams", name, weapon));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::cascade;
    use crate::game::testkit;
    use crate::game::unit::{Actuator, AmmoBin, AmmoType, Mounted, Munition};

    #[test]
    fn test_critical_counts() {
        assert_eq!(critical_count(7), 0);
        assert_eq!(critical_count(8), 1);
        assert_eq!(critical_count(11), 2);
        assert_eq!(critical_count(12), 3);
    }

    #[test]
    fn test_vehicle_tables() {
        assert_eq!(vehicle_critical(vehicle_loc::FRONT, 12), VehicleCritical::CrewKilled);
        assert_eq!(vehicle_critical(vehicle_loc::LEFT, 8), VehicleCritical::CrewStunned);
        assert_eq!(vehicle_critical(vehicle_loc::REAR, 11), VehicleCritical::AmmoHit);
        assert_eq!(vehicle_critical(vehicle_loc::TURRET, 12), VehicleCritical::TurretBlownOff);
        assert_eq!(vehicle_critical(vehicle_loc::FRONT, 5), VehicleCritical::None);
    }

    #[test]
    fn test_third_engine_hit_destroys() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::BLUE_MECH) {
            if let UnitKind::Mech(systems) = &mut unit.kind {
                systems.engine_hits = 2;
            }
            // Only one engine slot left to hit.
            for slot in unit.locations[mech_loc::CT].slots.iter_mut().skip(1) {
                slot.hit = true;
            }
        }
        let jobs = hit_mech_slot(&mut game, testkit::BLUE_MECH, mech_loc::CT);
        assert!(jobs.iter().any(|j| matches!(j, DamageJob::Destroy { reason, .. } if reason == "engine destroyed")));
    }

    #[test]
    fn test_leg_actuator_queues_roll() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            for slot in unit.locations[mech_loc::RL].slots.iter_mut().skip(1) {
                slot.hit = true;
            }
        }
        hit_mech_slot(&mut game, testkit::RED_MECH, mech_loc::RL);
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().actuator_hits(mech_loc::RL, Actuator::Hip), 1);
        assert_eq!(game.pending_psrs.len(), 1);
    }

    #[test]
    fn test_ammo_hit_explodes_and_empties_location() {
        let mut game = testkit::duel();
        let bin = game
            .unit_mut(testkit::BLUE_MECH)
            .map(|u| {
                u.add_equipment(Mounted::new(
                    "AC/5 Ammo",
                    mech_loc::RA,
                    EquipmentKind::Ammo(AmmoBin {
                        ammo_type: AmmoType::Autocannon,
                        munition: Munition::Standard,
                        shots: 2,
                        damage_per_shot: 5,
                    }),
                ))
            })
            .unwrap();
        let jobs = explode_ammo(&mut game, testkit::BLUE_MECH, bin);
        assert!(matches!(&jobs[0], DamageJob::Damage { packet, .. } if packet.amount == 10 && packet.ignore_armor));
        cascade::run(&mut game, jobs);
        let unit = game.unit(testkit::BLUE_MECH).unwrap();
        // 10 into an 8-point arm: destroyed, 2 carry into the right torso.
        assert!(unit.locations[mech_loc::RA].destroyed);
        assert_eq!(unit.crew.hits, 2);
    }

    #[test]
    fn test_empty_bin_does_not_explode() {
        let mut game = testkit::duel();
        let bin = game
            .unit_mut(testkit::BLUE_MECH)
            .map(|u| {
                u.add_equipment(Mounted::new(
                    "AC/5 Ammo",
                    mech_loc::RA,
                    EquipmentKind::Ammo(AmmoBin {
                        ammo_type: AmmoType::Autocannon,
                        munition: Munition::Standard,
                        shots: 0,
                        damage_per_shot: 5,
                    }),
                ))
            })
            .unwrap();
        assert!(explode_ammo(&mut game, testkit::BLUE_MECH, bin).is_empty());
    }

    #[test]
    fn test_vehicle_turret_blown_off() {
        let mut game = testkit::duel();
        let tank = Unit::vehicle(UnitId(20), "Tank", testkit::BLUE, 50, 4, MotiveType::Tracked, true, 20);
        game.add_unit(tank);
        apply_vehicle_critical(&mut game, UnitId(20), vehicle_loc::TURRET, VehicleCritical::TurretBlownOff);
        let tank = game.unit(UnitId(20)).unwrap();
        assert!(tank.locations[vehicle_loc::TURRET].destroyed);
        assert!(tank.is_alive());
    }

    #[test]
    fn test_battle_armor_trooper_killed() {
        let mut game = testkit::duel();
        let mut squad = Unit::battle_armor(UnitId(21), "Elementals", testkit::BLUE, 1, 10, 1, 3);
        squad.status.deployed = true;
        game.add_unit(squad);
        let mut outcome = AllocationOutcome::default();
        if let Some(unit) = game.unit_mut(UnitId(21)) {
            destroy_location(unit, 1, &mut outcome);
        }
        assert_eq!(outcome.unit_destroyed.as_deref(), Some("squad eliminated"));
    }
}
