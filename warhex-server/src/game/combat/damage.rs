//! Damage allocation.
//!
//! `allocate_damage` applies one damage packet to one unit: armor first,
//! then internal structure, then transfer inward as locations are destroyed.
//! It never rolls dice; everything that needs a roll (critical checks, crew
//! consciousness) is returned in the outcome for the cascade to resolve.

use serde::{Serialize, Deserialize};

use crate::game::combat::hitloc::HitData;
use crate::game::unit::{mech_loc, Unit, UnitKind};

/// What caused the damage (used for reports).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    /// Weapon fire
    Weapon,
    /// Physical attack
    Physical,
    /// Falling
    Fall,
    /// Skid or displacement collision
    Collision,
    /// Minefield
    Minefield,
    /// Artillery
    Artillery,
    /// Ammunition or engine explosion
    Explosion,
    /// Fire
    Fire,
    /// Building collapse
    Collapse,
}

/// One cluster of damage aimed at a location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePacket {
    /// Damage points
    pub amount: u32,
    /// Location struck
    pub hit: HitData,
    /// Skips armor entirely (internal explosions)
    pub ignore_armor: bool,
    /// Hardened armor gives no protection
    pub ignore_hardened: bool,
    /// Extra points that only affect armor
    pub armor_bonus: u32,
    /// Cause
    pub source: DamageSource,
}

impl DamagePacket {
    /// Plain damage to a location.
    pub fn new(amount: u32, hit: HitData, source: DamageSource) -> Self {
        Self {
            amount,
            hit,
            ignore_armor: false,
            ignore_hardened: false,
            armor_bonus: 0,
            source,
        }
    }
}

/// Result of allocating one packet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Armor points removed
    pub armor_damage: u32,
    /// Structure points removed
    pub internal_damage: u32,
    /// Locations destroyed by this packet, in order
    pub destroyed_locations: Vec<usize>,
    /// One critical roll per entry, at that location
    pub crit_checks: Vec<usize>,
    /// Crew hits caused directly
    pub crew_hits: u8,
    /// Set when the unit no longer functions
    pub unit_destroyed: Option<String>,
    /// Damage with nowhere left to go
    pub lost: u32,
}

/// Apply `packet` to `unit`.
pub fn allocate_damage(unit: &mut Unit, packet: &DamagePacket) -> AllocationOutcome {
    let mut out = AllocationOutcome::default();
    let mut location = packet.hit.location;
    let rear = packet.hit.rear;
    let mut remaining = packet.amount;
    let mut bonus = packet.armor_bonus;

    if location >= unit.locations.len() {
        out.lost = remaining;
        return out;
    }
    unit.damage_this_phase += packet.amount;

    if matches!(unit.kind, UnitKind::Mech(_)) && location == mech_loc::HEAD && remaining > 0 {
        out.crew_hits += 1;
    }
    if packet.hit.floating_crit && !unit.locations[location].destroyed {
        out.crit_checks.push(location);
    }

    while remaining > 0 {
        if unit.locations[location].destroyed {
            match unit.kind.transfer_location(location) {
                Some(next) => {
                    location = next;
                    continue;
                }
                None => {
                    out.lost += remaining;
                    break;
                }
            }
        }

        if !packet.ignore_armor {
            let hardened = unit.hardened_armor && !packet.ignore_hardened;
            let loc = &mut unit.locations[location];
            let armor = match (rear, loc.rear_armor.as_mut()) {
                (true, Some(rear_armor)) => rear_armor,
                _ => &mut loc.armor,
            };
            if *armor > 0 {
                let per_point = if hardened { 2 } else { 1 };
                let incoming = remaining + bonus;
                bonus = 0;
                let to_strip = *armor * per_point;
                if incoming < to_strip {
                    let loss = if hardened { incoming.div_ceil(2) } else { incoming };
                    *armor -= loss;
                    out.armor_damage += loss;
                    remaining = 0;
                    break;
                }
                out.armor_damage += *armor;
                *armor = 0;
                remaining = (incoming - to_strip).min(remaining);
                if remaining == 0 {
                    break;
                }
            }
        }

        if let UnitKind::Aero(systems) = &mut unit.kind {
            let taken = remaining.min(systems.structural_integrity);
            systems.structural_integrity -= taken;
            out.internal_damage += taken;
            out.lost += remaining - taken;
            out.crit_checks.push(location);
            if systems.structural_integrity == 0 {
                out.unit_destroyed = Some("structural integrity collapsed".to_string());
            }
            break;
        }

        let internal = unit.locations[location].internal;
        if remaining < internal {
            unit.locations[location].internal -= remaining;
            out.internal_damage += remaining;
            if !unit.kind.is_infantry() || matches!(unit.kind, UnitKind::BattleArmor) {
                out.crit_checks.push(location);
            }
            break;
        }

        out.internal_damage += internal;
        remaining -= internal;
        destroy_location(unit, location, &mut out);
        if matches!(unit.kind, UnitKind::BattleArmor) && location > 0 {
            out.crit_checks.push(location);
        }
        match unit.kind.transfer_location(location) {
            Some(next) if remaining > 0 => location = next,
            _ => {
                out.lost += remaining;
                break;
            }
        }
    }
    out
}

/// Destroy a location, its equipment and its dependent locations.
pub fn destroy_location(unit: &mut Unit, location: usize, out: &mut AllocationOutcome) {
    let mut queue = vec![location];
    while let Some(index) = queue.pop() {
        let Some(loc) = unit.locations.get_mut(index) else { continue };
        if loc.destroyed {
            continue;
        }
        loc.destroyed = true;
        loc.internal = 0;
        loc.armor = 0;
        if let Some(rear) = loc.rear_armor.as_mut() {
            *rear = 0;
        }
        out.destroyed_locations.push(index);
        for mounted in unit.equipment.iter_mut().filter(|m| m.location == index) {
            mounted.destroyed = true;
        }
        queue.extend_from_slice(unit.kind.dependent_locations(index));

        if unit.kind.is_vital(index) && out.unit_destroyed.is_none() {
            let reason = match unit.kind {
                UnitKind::Mech(_) if index == mech_loc::HEAD => {
                    unit.crew.dead = true;
                    "head destroyed".to_string()
                }
                UnitKind::Infantry => "platoon wiped out".to_string(),
                _ => format!("{} destroyed", unit.locations[index].name.to_lowercase()),
            };
            out.unit_destroyed = Some(reason);
        }
    }
    if matches!(unit.kind, UnitKind::BattleArmor) && unit.troopers() == 0 && out.unit_destroyed.is_none() {
        out.unit_destroyed = Some("squad eliminated".to_string());
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerId;
    use crate::game::unit::{EquipmentKind, Mounted, UnitId, WeaponSpec};
    use proptest::prelude::*;

    fn hunchback() -> Unit {
        Unit::mech(UnitId(1), "Hunchback", PlayerId(1), 50, 4, 0)
    }

    fn packet(amount: u32, location: usize) -> DamagePacket {
        DamagePacket::new(amount, HitData::new(location), DamageSource::Weapon)
    }

    #[test]
    fn test_twelve_damage_to_front_torso() {
        let mut unit = hunchback();
        unit.locations[mech_loc::CT].armor = 10;
        unit.locations[mech_loc::CT].internal = 5;
        let out = allocate_damage(&mut unit, &packet(12, mech_loc::CT));
        assert_eq!(unit.locations[mech_loc::CT].armor, 0);
        assert_eq!(unit.locations[mech_loc::CT].internal, 3);
        assert_eq!(out.crit_checks, vec![mech_loc::CT]);
        assert!(out.unit_destroyed.is_none());
    }

    #[test]
    fn test_armor_only_hit_rolls_no_crit() {
        let mut unit = hunchback();
        let out = allocate_damage(&mut unit, &packet(5, mech_loc::LT));
        assert_eq!(out.armor_damage, 5);
        assert!(out.crit_checks.is_empty());
    }

    #[test]
    fn test_rear_armor_used() {
        let mut unit = hunchback();
        let front = unit.locations[mech_loc::CT].armor;
        let mut hit = HitData::new(mech_loc::CT);
        hit.rear = true;
        allocate_damage(&mut unit, &DamagePacket::new(2, hit, DamageSource::Weapon));
        assert_eq!(unit.locations[mech_loc::CT].armor, front);
        assert_eq!(unit.locations[mech_loc::CT].rear_armor, Some(8 - 2));
    }

    #[test]
    fn test_transfer_and_dependents() {
        let mut unit = hunchback();
        let laser = unit.add_equipment(Mounted::new("Laser", mech_loc::RA, EquipmentKind::Weapon(WeaponSpec::energy(5, 3))));
        for loc in [mech_loc::RT, mech_loc::RA] {
            unit.locations[loc].armor = 0;
        }
        unit.locations[mech_loc::RT].internal = 2;
        let ct_armor = unit.locations[mech_loc::CT].armor;
        let out = allocate_damage(&mut unit, &packet(5, mech_loc::RT));
        assert!(unit.locations[mech_loc::RT].destroyed);
        assert!(unit.locations[mech_loc::RA].destroyed);
        assert!(unit.equipment(laser).map(|m| m.destroyed).unwrap_or(false));
        assert_eq!(out.destroyed_locations, vec![mech_loc::RT, mech_loc::RA]);
        assert_eq!(unit.locations[mech_loc::CT].armor, ct_armor - 3);
        assert!(out.unit_destroyed.is_none());
    }

    #[test]
    fn test_head_destruction_kills_crew() {
        let mut unit = hunchback();
        let out = allocate_damage(&mut unit, &packet(30, mech_loc::HEAD));
        assert!(unit.crew.dead);
        assert_eq!(out.unit_destroyed.as_deref(), Some("head destroyed"));
        assert_eq!(out.crew_hits, 1);
        assert!(out.lost > 0);
    }

    #[test]
    fn test_hardened_armor_halves() {
        let mut unit = hunchback();
        unit.hardened_armor = true;
        unit.locations[mech_loc::LA].armor = 10;
        allocate_damage(&mut unit, &packet(5, mech_loc::LA));
        assert_eq!(unit.locations[mech_loc::LA].armor, 7);
        let mut acid = packet(5, mech_loc::LA);
        acid.ignore_hardened = true;
        allocate_damage(&mut unit, &acid);
        assert_eq!(unit.locations[mech_loc::LA].armor, 2);
    }

    #[test]
    fn test_corpse_keeps_taking_damage() {
        let mut unit = hunchback();
        allocate_damage(&mut unit, &packet(100, mech_loc::CT));
        let armor_before = unit.total_armor();
        let out = allocate_damage(&mut unit, &packet(10, mech_loc::LA));
        assert!(unit.total_armor() <= armor_before);
        assert_eq!(out.armor_damage, 10.min(armor_before));
    }

    #[test]
    fn test_infantry_platoon() {
        let mut unit = Unit::infantry(UnitId(3), "Rifles", PlayerId(1), 28, 1);
        let out = allocate_damage(&mut unit, &packet(10, 0));
        assert_eq!(unit.troopers(), 18);
        assert!(out.crit_checks.is_empty());
        let out = allocate_damage(&mut unit, &packet(20, 0));
        assert_eq!(out.unit_destroyed.as_deref(), Some("platoon wiped out"));
    }

    #[test]
    fn test_aero_structural_integrity() {
        let mut unit = Unit::aero(UnitId(4), "Sparrowhawk", PlayerId(1), 30, 6, 4, 5);
        let out = allocate_damage(&mut unit, &packet(10, 0));
        assert_eq!(out.armor_damage, 4);
        assert_eq!(out.internal_damage, 5);
        assert!(out.unit_destroyed.is_some());
    }

    proptest! {
        #[test]
        fn prop_damage_is_monotonic(hits in prop::collection::vec((0usize..8, 0u32..40, any::<bool>()), 1..12)) {
            let mut unit = hunchback();
            for (location, amount, rear) in hits {
                let before: Vec<(u32, Option<u32>, u32)> = unit
                    .locations
                    .iter()
                    .map(|l| (l.armor, l.rear_armor, l.internal))
                    .collect();
                let mut hit = HitData::new(location);
                hit.rear = rear;
                allocate_damage(&mut unit, &DamagePacket::new(amount, hit, DamageSource::Weapon));
                for (loc, (armor, rear_armor, internal)) in unit.locations.iter().zip(before) {
                    prop_assert!(loc.armor <= armor);
                    prop_assert!(loc.rear_armor.unwrap_or(0) <= rear_armor.unwrap_or(0));
                    prop_assert!(loc.internal <= internal);
                }
            }
        }
    }
}
