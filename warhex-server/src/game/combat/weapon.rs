//! Weapon Attacks
//!
//! A weapon attack is pre-treated (ammunition, heat, jams), rolled, turned
//! into clusters by rack type and munition, and every cluster is located and
//! handed to the damage cascade.

use tracing::debug;

use crate::core::hex::HexCoord;
use crate::core::rng::Roll;
use crate::game::board::MinefieldKind;
use crate::game::combat::artillery;
use crate::game::combat::attack::{AttackAction, AttackKind, AttackTarget, ToHit};
use crate::game::combat::cascade::{self, DamageJob};
use crate::game::combat::cluster::{group_damage, roll_cluster};
use crate::game::combat::damage::{DamagePacket, DamageSource};
use crate::game::combat::hitloc::{elevation_table, roll_location, side_of, Side};
use crate::game::combat::secondary::{self, BURN_ROUNDS};
use crate::game::combat::{describe_roll, roll_attack};
use crate::game::events::ReportKind;
use crate::game::state::Match;
use crate::game::unit::{
    AmmoType, EquipmentId, EquipmentKind, HasHeat, Munition, RackKind, Unit, UnitId, UnitKind, WeaponSpec,
};

/// Heat an inferno missile adds to a walker.
pub const INFERNO_HEAT_PER_MISSILE: u32 = 2;
/// Cluster roll bonus for missiles homing on a friendly Narc pod.
pub const NARC_CLUSTER_BONUS: i32 = 2;

/// One weapon discharge after ammunition and heat are paid.
#[derive(Clone, Debug)]
struct Volley {
    attacker: UnitId,
    attacker_name: String,
    weapon: EquipmentId,
    weapon_name: String,
    spec: WeaponSpec,
    munition: Munition,
    shots: u32,
}

/// Projectiles that found the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolleyHits {
    /// Missiles, pellets or shots that hit
    pub projectiles: u32,
    /// Total damage
    pub damage: u32,
    /// Damage per location roll
    pub group: u32,
}

/// True when this roll jams the weapon.
pub fn jams_on(rack: RackKind, roll: &Roll) -> bool {
    matches!(rack, RackKind::Ultra | RackKind::Rotary { .. }) && roll.is_snake_eyes()
}

/// Resolve one declared weapon attack.
pub fn resolve_weapon_attack(game: &mut Match, action: &AttackAction) {
    let AttackKind::Weapon { weapon, ammo, shots } = action.kind else { return };

    if let AttackTarget::Unit(target) = action.target {
        let gone = game.unit(target).map(|u| u.status.destroyed).unwrap_or(true);
        if gone {
            let attacker = game.unit(action.attacker).map(|u| u.name.clone()).unwrap_or_default();
            game.report(
                ReportKind::Attack,
                Some(action.attacker),
                format!("{} holds fire: target {} is already destroyed", attacker, target),
            );
            return;
        }
    }

    let Some(volley) = prepare(game, action.attacker, weapon, ammo, shots) else { return };
    debug!(attacker = action.attacker.0, weapon = weapon.0, shots = volley.shots, "weapon attack");

    match action.target {
        AttackTarget::Unit(target) => fire_at_unit(game, &volley, target, action.to_hit),
        AttackTarget::Hex(coords) => fire_at_hex(game, &volley, coords, action.to_hit),
        AttackTarget::Building(_, coords) => fire_at_building(game, &volley, coords, action.to_hit),
    }
}

fn invalid(game: &mut Match, attacker: UnitId, text: String) {
    game.report(ReportKind::Error, Some(attacker), text);
}

/// Pay ammunition and heat for a shot. `None` when the weapon cannot fire.
fn prepare(
    game: &mut Match,
    attacker: UnitId,
    weapon: EquipmentId,
    ammo: Option<EquipmentId>,
    requested: u32,
) -> Option<Volley> {
    let unit = game.unit(attacker)?;
    let attacker_name = unit.name.clone();
    let Some(mounted) = unit.equipment(weapon) else {
        invalid(game, attacker, format!("{} has no equipment #{}", attacker_name, weapon.0));
        return None;
    };
    let weapon_name = mounted.name.clone();
    let Some(spec) = mounted.weapon().cloned() else {
        invalid(game, attacker, format!("{} cannot fire {}", attacker_name, weapon_name));
        return None;
    };
    if !mounted.is_usable() || !unit.has_location(mounted.location) {
        game.report(
            ReportKind::Attack,
            Some(attacker),
            format!("{} cannot fire {}: weapon is out of action", attacker_name, weapon_name),
        );
        return None;
    }

    let wanted = match spec.rack {
        RackKind::Ultra => requested.clamp(1, 2),
        RackKind::Rotary { max_shots } => requested.clamp(1, max_shots.max(1)),
        _ => 1,
    };
    let (bin, munition, shots) = match spec.ammo_type {
        None => (None, Munition::Standard, wanted),
        Some(kind) => {
            let bin = ammo.filter(|id| feeds(unit, *id, kind)).or_else(|| first_bin(unit, kind));
            let Some(bin) = bin else {
                game.report(
                    ReportKind::Attack,
                    Some(attacker),
                    format!("{} cannot fire {}: out of ammunition", attacker_name, weapon_name),
                );
                return None;
            };
            let loaded = unit.equipment(bin).and_then(|m| m.ammo()).map(|a| (a.munition, a.shots));
            let (munition, available) = loaded.unwrap_or((Munition::Standard, 0));
            (Some(bin), munition, wanted.min(available))
        }
    };

    let unit = game.unit_mut(attacker)?;
    if let Some(bin) = bin {
        if let Some(EquipmentKind::Ammo(a)) = unit.equipment_mut(bin).map(|m| &mut m.kind) {
            a.shots = a.shots.saturating_sub(shots);
        }
    }
    if unit.kind.tracks_heat() {
        unit.heat_buildup += spec.heat * shots;
    }
    if let Some(m) = unit.equipment_mut(weapon) {
        m.fired = true;
    }
    Some(Volley { attacker, attacker_name, weapon, weapon_name, spec, munition, shots })
}

fn feeds(unit: &Unit, bin: EquipmentId, kind: AmmoType) -> bool {
    unit.equipment(bin)
        .filter(|m| !m.destroyed)
        .and_then(|m| m.ammo())
        .map(|a| a.ammo_type == kind && a.shots > 0)
        .unwrap_or(false)
}

fn first_bin(unit: &Unit, kind: AmmoType) -> Option<EquipmentId> {
    (0..unit.equipment.len()).map(|i| EquipmentId(i as u16)).find(|id| feeds(unit, *id, kind))
}

/// Roll the hit count for a volley that hit.
pub fn volley_hits(game: &mut Match, spec: &WeaponSpec, munition: Munition, shots: u32, bonus: i32) -> VolleyHits {
    match spec.rack {
        RackKind::Single if spec.ammo_type == Some(AmmoType::Lbx) && munition == Munition::Cluster => {
            let (pellets, _) = roll_cluster(&mut game.rng, spec.damage, spec.cluster_bonus + bonus);
            VolleyHits { projectiles: pellets, damage: pellets, group: 1 }
        }
        RackKind::Single => VolleyHits { projectiles: 1, damage: spec.damage, group: spec.damage },
        RackKind::Cluster { size, group } => {
            let (missiles, _) = roll_cluster(&mut game.rng, size, spec.cluster_bonus + bonus);
            VolleyHits { projectiles: missiles, damage: missiles * spec.damage, group }
        }
        RackKind::Streak { size } => VolleyHits { projectiles: size, damage: size * spec.damage, group: spec.damage },
        RackKind::Ultra | RackKind::Rotary { .. } => {
            let landed = if shots > 1 { roll_cluster(&mut game.rng, shots, 0).0 } else { 1 };
            VolleyHits { projectiles: landed, damage: landed * spec.damage, group: spec.damage }
        }
    }
}

fn rack_size(spec: &WeaponSpec) -> u32 {
    match spec.rack {
        RackKind::Cluster { size, .. } | RackKind::Streak { size } => size,
        _ => 1,
    }
}

// =============================================================================
// UNIT TARGETS
// =============================================================================

fn fire_at_unit(game: &mut Match, volley: &Volley, target: UnitId, declared: ToHit) {
    let Some(target_unit) = game.unit(target) else { return };
    let target_name = target_unit.name.clone();
    let tagged = target_unit.status.tagged;

    let to_hit = if volley.munition == Munition::Homing {
        if tagged {
            ToHit::Automatic
        } else {
            ToHit::Impossible
        }
    } else {
        declared
    };
    let (hit, roll) = roll_attack(game, to_hit);
    game.report(
        ReportKind::Attack,
        Some(target),
        format!(
            "{} fires {} at {}, {}",
            volley.attacker_name,
            volley.weapon_name,
            target_name,
            describe_roll(to_hit, roll, hit)
        ),
    );

    if roll.map(|r| jams_on(volley.spec.rack, &r)).unwrap_or(false) {
        if let Some(m) = game.unit_mut(volley.attacker).and_then(|u| u.equipment_mut(volley.weapon)) {
            m.jammed = true;
        }
        game.report(ReportKind::Attack, Some(volley.attacker), format!("{} jams", volley.weapon_name));
    }

    if volley.spec.tag {
        if hit {
            if let Some(unit) = game.unit_mut(target) {
                unit.status.tagged = true;
            }
            game.report(ReportKind::Attack, Some(target), format!("{} is painted by TAG", target_name));
        }
        return;
    }

    if !hit {
        if volley.munition == Munition::Swarm {
            swarm_retarget(game, volley, target, rack_size(&volley.spec));
        }
        return;
    }

    let bonus = match (game.unit(target), game.unit_team(volley.attacker)) {
        (Some(t), Some(team))
            if t.narc_pods.contains(&team)
                && matches!(volley.spec.ammo_type, Some(AmmoType::Lrm | AmmoType::Srm)) =>
        {
            NARC_CLUSTER_BONUS
        }
        _ => 0,
    };
    let hits = volley_hits(game, &volley.spec, volley.munition, volley.shots, bonus);
    if rack_size(&volley.spec) > 1 {
        game.report(
            ReportKind::Attack,
            Some(target),
            format!("{} of {} missiles hit", hits.projectiles, rack_size(&volley.spec)),
        );
    }

    deliver(game, volley, target, hits);

    if volley.munition == Munition::Swarm {
        let missed = rack_size(&volley.spec).saturating_sub(hits.projectiles);
        if missed > 0 {
            swarm_retarget(game, volley, target, missed);
        }
    }
}

/// Apply a volley's effect to a unit.
fn deliver(game: &mut Match, volley: &Volley, target: UnitId, hits: VolleyHits) {
    let Some(unit) = game.unit(target) else { return };
    let target_name = unit.name.clone();
    let is_mech = matches!(unit.kind, UnitKind::Mech(_));
    let conventional_infantry = matches!(unit.kind, UnitKind::Infantry);

    match volley.munition {
        Munition::Narc | Munition::INarc => {
            if let Some(team) = game.unit_team(volley.attacker) {
                if let Some(unit) = game.unit_mut(target) {
                    unit.narc_pods.insert(team);
                }
            }
            game.report(ReportKind::Attack, Some(target), format!("A Narc pod attaches to {}", target_name));
            return;
        }
        Munition::Inferno => {
            let mut jobs = Vec::new();
            if is_mech {
                jobs.push(DamageJob::Heat { target, amount: hits.projectiles * INFERNO_HEAT_PER_MISSILE });
            } else if let Some(unit) = game.unit_mut(target) {
                unit.status.burning = BURN_ROUNDS;
            }
            if let Some(pos) = game.unit(target).and_then(|u| u.position) {
                jobs.push(DamageJob::Ignite { coords: pos, modifier: 0, automatic: true });
            }
            game.report(ReportKind::Attack, Some(target), format!("{} is engulfed in inferno gel", target_name));
            cascade::run(game, jobs);
            return;
        }
        _ => {}
    }

    let damage = match volley.munition {
        Munition::Fragmentation if conventional_infantry => hits.damage * 2,
        Munition::Fragmentation => 0,
        Munition::Flechette if conventional_infantry => hits.damage * 2,
        Munition::Flechette => hits.damage / 2,
        _ => hits.damage,
    };
    if damage == 0 {
        game.report(ReportKind::Attack, Some(target), format!("The rounds have no effect on {}", target_name));
        return;
    }

    let jobs = locate_clusters(game, volley, target, damage, hits.group);
    cascade::run(game, jobs);
}

/// Roll a location for each cluster, letting a building soak its share.
fn locate_clusters(game: &mut Match, volley: &Volley, target: UnitId, damage: u32, group: u32) -> Vec<DamageJob> {
    let attacker = game.unit(volley.attacker);
    let from = attacker.and_then(|u| u.position);
    let attacker_elevation = attacker.map(|u| u.elevation).unwrap_or(0);
    let Some(unit) = game.unit(target) else { return Vec::new() };
    let side = from.map(|p| side_of(unit, p)).unwrap_or(Side::Front);
    let table = elevation_table(attacker_elevation, unit.elevation);
    let group = if matches!(unit.kind, UnitKind::Infantry) { damage } else { group };
    let shelter = unit.position.and_then(|pos| {
        let building = game.board.building_at(pos)?;
        let floors = building.hexes.get(&pos).map(|h| h.floors as i32).unwrap_or(0);
        (unit.elevation < floors.max(1)).then(|| (pos, building.absorption(pos)))
    });
    let acid = volley.munition == Munition::AcidHead;
    let per_missile = volley.spec.damage.max(1);

    let mut jobs = Vec::new();
    for amount in group_damage(damage, group) {
        let mut amount = amount;
        if let Some((coords, absorb)) = shelter {
            let soaked = absorb.min(amount);
            if soaked > 0 {
                jobs.push(DamageJob::BuildingDamage { coords, amount: soaked });
                amount -= soaked;
            }
        }
        if amount == 0 {
            continue;
        }
        let Some(unit) = game.units.get(&target) else { break };
        let Some(hit) = roll_location(&mut game.rng, unit, side, table) else {
            continue;
        };
        let mut packet = DamagePacket::new(amount, hit, DamageSource::Weapon);
        if acid {
            packet.armor_bonus = amount.div_ceil(per_missile);
            packet.ignore_hardened = true;
        }
        jobs.push(DamageJob::Damage { target, packet });
    }
    jobs
}

/// Missed swarm missiles look for another enemy in or next to the target hex.
fn swarm_retarget(game: &mut Match, volley: &Volley, original: UnitId, missiles: u32) {
    let Some(center) = game.unit(original).and_then(|u| u.position) else { return };
    let mut candidates: Vec<UnitId> = Vec::new();
    for coords in std::iter::once(center).chain(center.neighbors()) {
        for id in game.units_at(coords) {
            if id != original && game.are_enemies(volley.attacker, id) && !candidates.contains(&id) {
                candidates.push(id);
            }
        }
    }
    candidates.sort();
    let Some(next) = candidates.first().copied() else { return };
    let name = game.unit(next).map(|u| u.name.clone()).unwrap_or_default();
    let (landed, _) = roll_cluster(&mut game.rng, missiles, 0);
    game.report(
        ReportKind::Attack,
        Some(next),
        format!("{} stray swarm missiles find {}, {} hit", missiles, name, landed),
    );
    let group = match volley.spec.rack {
        RackKind::Cluster { group, .. } => group,
        _ => volley.spec.damage,
    };
    let hits = VolleyHits { projectiles: landed, damage: landed * volley.spec.damage, group };
    let strays = Volley { munition: Munition::Standard, ..volley.clone() };
    deliver(game, &strays, next, hits);
}

// =============================================================================
// HEX AND BUILDING TARGETS
// =============================================================================

fn fire_at_hex(game: &mut Match, volley: &Volley, coords: HexCoord, to_hit: ToHit) {
    if volley.spec.artillery {
        artillery::declare_strike(game, volley.attacker, volley.weapon, coords, to_hit, volley.munition);
        return;
    }
    let (hit, roll) = roll_attack(game, to_hit);
    game.report(
        ReportKind::Attack,
        None,
        format!(
            "{} fires {} at hex {}, {}",
            volley.attacker_name,
            volley.weapon_name,
            coords,
            describe_roll(to_hit, roll, hit)
        ),
    );
    if !hit || !game.board.contains(coords) {
        return;
    }
    match volley.munition {
        Munition::Thunder => {
            let owner = game.unit(volley.attacker).map(|u| u.owner).unwrap_or_default();
            let team = game.team_of(owner).unwrap_or_default();
            let density = (rack_size(&volley.spec) / 5 * 5).clamp(5, 30);
            game.board.add_minefield(coords, MinefieldKind::Conventional, density, owner, team);
            game.report(ReportKind::Minefield, None, format!("Thunder munitions mine hex {}", coords));
        }
        Munition::Flare => secondary::drop_flare(game, coords),
        Munition::Smoke => secondary::drop_smoke(game, coords),
        Munition::Inferno => cascade::run(game, vec![DamageJob::Ignite { coords, modifier: 0, automatic: true }]),
        _ if volley.spec.incendiary => {
            cascade::run(game, vec![DamageJob::Ignite { coords, modifier: 0, automatic: false }]);
        }
        _ => {}
    }
}

fn fire_at_building(game: &mut Match, volley: &Volley, coords: HexCoord, to_hit: ToHit) {
    let (hit, roll) = roll_attack(game, to_hit);
    game.report(
        ReportKind::Attack,
        None,
        format!(
            "{} fires {} at the building in {}, {}",
            volley.attacker_name,
            volley.weapon_name,
            coords,
            describe_roll(to_hit, roll, hit)
        ),
    );
    if !hit {
        return;
    }
    let hits = volley_hits(game, &volley.spec, volley.munition, volley.shots, 0);
    let mut jobs = vec![DamageJob::BuildingDamage { coords, amount: hits.damage }];
    if volley.munition == Munition::Inferno {
        jobs.push(DamageJob::Ignite { coords, modifier: 0, automatic: true });
    }
    cascade::run(game, jobs);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::BuildingClass;
    use crate::game::testkit;
    use crate::game::unit::{mech_loc, AmmoBin, Mounted};

    fn mount(game: &mut Match, name: &str, kind: EquipmentKind) -> EquipmentId {
        game.unit_mut(testkit::RED_MECH)
            .map(|u| u.add_equipment(Mounted::new(name, mech_loc::RT, kind)))
            .unwrap()
    }

    fn bin(ammo_type: AmmoType, munition: Munition, shots: u32) -> EquipmentKind {
        EquipmentKind::Ammo(AmmoBin { ammo_type, munition, shots, damage_per_shot: 2 })
    }

    fn fire(game: &mut Match, weapon: EquipmentId) {
        resolve_weapon_attack(
            game,
            &AttackAction::weapon(testkit::RED_MECH, testkit::BLUE_MECH, weapon, ToHit::Automatic),
        );
    }

    #[test]
    fn test_laser_hit_adds_heat() {
        let mut game = testkit::duel();
        fire(&mut game, testkit::MEDIUM_LASER);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 5);
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().heat_buildup, 3);
    }

    #[test]
    fn test_dead_target_is_a_reported_noop() {
        let mut game = testkit::duel();
        game.destroy_unit(testkit::BLUE_MECH, "test");
        fire(&mut game, testkit::MEDIUM_LASER);
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().heat_buildup, 0);
        assert!(game.reports.entries().iter().any(|r| r.text.contains("already destroyed")));
    }

    #[test]
    fn test_ammunition_runs_out() {
        let mut game = testkit::duel();
        let ac = mount(
            &mut game,
            "AC/10",
            EquipmentKind::Weapon(WeaponSpec::ballistic(10, 3, AmmoType::Autocannon, RackKind::Single)),
        );
        let ammo = mount(&mut game, "AC/10 Ammo", bin(AmmoType::Autocannon, Munition::Standard, 1));
        fire(&mut game, ac);
        fire(&mut game, ac);
        let red = game.unit(testkit::RED_MECH).unwrap();
        assert_eq!(red.equipment(ammo).and_then(|m| m.ammo()).map(|a| a.shots), Some(0));
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 10);
        assert!(game.reports.entries().iter().any(|r| r.text.contains("out of ammunition")));
    }

    #[test]
    fn test_ultra_jams_only_on_snake_eyes() {
        let snake = Roll { first: 1, second: 1 };
        let three = Roll { first: 1, second: 2 };
        assert!(jams_on(RackKind::Ultra, &snake));
        assert!(jams_on(RackKind::Rotary { max_shots: 6 }, &snake));
        assert!(!jams_on(RackKind::Ultra, &three));
        assert!(!jams_on(RackKind::Single, &snake));
    }

    #[test]
    fn test_streak_hits_with_every_missile() {
        let mut game = testkit::duel();
        let streak = mount(
            &mut game,
            "Streak SRM 4",
            EquipmentKind::Weapon(WeaponSpec::ballistic(2, 3, AmmoType::Streak, RackKind::Streak { size: 4 })),
        );
        mount(&mut game, "Streak Ammo", bin(AmmoType::Streak, Munition::Standard, 25));
        fire(&mut game, streak);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 8);
    }

    #[test]
    fn test_homing_needs_tag() {
        let mut game = testkit::duel();
        let lrm = mount(
            &mut game,
            "LRM 5",
            EquipmentKind::Weapon(WeaponSpec::ballistic(1, 2, AmmoType::Lrm, RackKind::Cluster { size: 5, group: 5 })),
        );
        mount(&mut game, "LRM Homing", bin(AmmoType::Lrm, Munition::Homing, 24));
        fire(&mut game, lrm);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 0);

        let mut tag = WeaponSpec::energy(0, 0);
        tag.tag = true;
        let tag = mount(&mut game, "TAG", EquipmentKind::Weapon(tag));
        fire(&mut game, tag);
        assert!(game.unit(testkit::BLUE_MECH).unwrap().status.tagged);
        fire(&mut game, lrm);
        assert!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase > 0);
    }

    #[test]
    fn test_fragmentation_ignores_walkers() {
        let mut game = testkit::duel();
        let srm = mount(
            &mut game,
            "SRM 6",
            EquipmentKind::Weapon(WeaponSpec::ballistic(2, 4, AmmoType::Srm, RackKind::Cluster { size: 6, group: 2 })),
        );
        mount(&mut game, "SRM Frag", bin(AmmoType::Srm, Munition::Fragmentation, 15));
        fire(&mut game, srm);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 0);
    }

    #[test]
    fn test_inferno_heats_walker() {
        let mut game = testkit::duel();
        let srm = mount(
            &mut game,
            "SRM 2",
            EquipmentKind::Weapon(WeaponSpec::ballistic(2, 2, AmmoType::Srm, RackKind::Cluster { size: 2, group: 2 })),
        );
        mount(&mut game, "SRM Inferno", bin(AmmoType::Srm, Munition::Inferno, 50));
        fire(&mut game, srm);
        let blue = game.unit(testkit::BLUE_MECH).unwrap();
        assert_eq!(blue.damage_this_phase, 0);
        assert!(blue.heat_buildup >= INFERNO_HEAT_PER_MISSILE);
    }

    #[test]
    fn test_narc_pod_attaches() {
        let mut game = testkit::duel();
        let narc = mount(
            &mut game,
            "Narc Beacon",
            EquipmentKind::Weapon(WeaponSpec::ballistic(0, 0, AmmoType::Narc, RackKind::Single)),
        );
        mount(&mut game, "Narc Pods", bin(AmmoType::Narc, Munition::Narc, 6));
        fire(&mut game, narc);
        assert!(game.unit(testkit::BLUE_MECH).unwrap().narc_pods.contains(&testkit::RED_TEAM));
    }

    #[test]
    fn test_building_soaks_part_of_each_cluster() {
        let mut game = testkit::duel();
        let pos = game.unit(testkit::BLUE_MECH).and_then(|u| u.position).unwrap();
        game.board.add_building("Depot", BuildingClass::Medium, &[pos], 2);
        fire(&mut game, testkit::MEDIUM_LASER);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 1);
        let cf = game.board.building_at(pos).and_then(|b| b.hexes.get(&pos)).map(|h| h.cf);
        assert_eq!(cf, Some(36));
    }
}
