//! Physical Attacks
//!
//! Punches, kicks, clubs, pushes, charges, death from above, thrashing,
//! brushing off swarmers, and exo-armor swarm attacks. Every attack is
//! validated first; an invalid declaration is reported and dropped but the
//! attacker's turn stays consumed.

use tracing::{debug, warn};

use crate::core::hex::{Facing, HexCoord};
use crate::game::combat::attack::{AttackAction, AttackKind, Limb, PhysicalKind};
use crate::game::combat::cascade::{self, clustered_damage, DamageJob};
use crate::game::combat::damage::{DamagePacket, DamageSource};
use crate::game::combat::hitloc::{side_of, HitData, HitTable, Side};
use crate::game::combat::secondary;
use crate::game::combat::{describe_roll, roll_attack};
use crate::game::events::ReportKind;
use crate::game::psr;
use crate::game::state::Match;
use crate::game::unit::{mech_loc, Actuator, CanFall, CanSwarm, MoveType, Unit, UnitId, UnitKind};

/// Swarm damage per living trooper each Firing phase.
pub const SWARM_DAMAGE_PER_TROOPER: u32 = 3;

// =============================================================================
// DAMAGE FORMULAS
// =============================================================================

fn arm_location(limb: Limb) -> usize {
    match limb {
        Limb::Left => mech_loc::LA,
        Limb::Right => mech_loc::RA,
    }
}

fn leg_location(limb: Limb) -> usize {
    match limb {
        Limb::Left => mech_loc::LL,
        Limb::Right => mech_loc::RL,
    }
}

/// Punch damage for one arm: a tenth of the weight, halved for each damaged
/// upper or lower arm actuator.
pub fn punch_damage(unit: &Unit, limb: Limb) -> u32 {
    let arm = arm_location(limb);
    let mut damage = unit.weight.div_ceil(10);
    for actuator in [Actuator::UpperArm, Actuator::LowerArm] {
        if unit.actuator_hits(arm, actuator) > 0 {
            damage = damage.div_ceil(2);
        }
    }
    damage
}

/// Kick damage.
pub fn kick_damage(weight: u32) -> u32 {
    weight / 5
}

/// Club damage.
pub fn club_damage(weight: u32) -> u32 {
    weight / 5
}

/// Charge damage to the target after moving `hexes` (the hex charged into included).
pub fn charge_damage(weight: u32, hexes: u32) -> u32 {
    weight.div_ceil(10) * hexes.saturating_sub(1)
}

/// Charge damage the attacker takes from a target of `target_weight`.
pub fn charge_self_damage(target_weight: u32) -> u32 {
    target_weight.div_ceil(10)
}

/// Death-from-above damage to the target.
pub fn dfa_damage(weight: u32) -> u32 {
    weight.div_ceil(10) * 3
}

/// Death-from-above damage to the attacker's legs.
pub fn dfa_self_damage(weight: u32) -> u32 {
    weight.div_ceil(5)
}

/// Thrash damage to infantry in the hex.
pub fn thrash_damage(weight: u32) -> u32 {
    weight.div_ceil(3)
}

fn verb(kind: PhysicalKind) -> &'static str {
    match kind {
        PhysicalKind::Punch(_) => "punches",
        PhysicalKind::Kick(_) => "kicks",
        PhysicalKind::Club => "clubs",
        PhysicalKind::Push => "pushes",
        PhysicalKind::Charge => "charges",
        PhysicalKind::Dfa => "jumps onto",
        PhysicalKind::Thrash => "thrashes at",
        PhysicalKind::BrushOff(_) => "tries to brush off",
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Why a declared physical attack cannot happen.
pub fn validate(game: &Match, attacker: UnitId, target: UnitId, kind: PhysicalKind) -> Result<(), String> {
    let unit = game.unit(attacker).ok_or("attacker is gone")?;
    let other = game.unit(target).ok_or("target is gone")?;
    let (Some(from), Some(to)) = (unit.position, other.position) else {
        return Err("not on the board".to_string());
    };
    let distance = from.distance(&to);
    let is_mech = matches!(unit.kind, UnitKind::Mech(_));

    match kind {
        PhysicalKind::Punch(limb) => {
            let arm = arm_location(limb);
            if !is_mech || !unit.has_location(arm) || unit.actuator_hits(arm, Actuator::Shoulder) > 0 {
                return Err("the arm cannot punch".to_string());
            }
            adjacent(distance)
        }
        PhysicalKind::Kick(limb) => {
            if !is_mech || !unit.has_location(leg_location(limb)) || unit.status.prone {
                return Err("the leg cannot kick".to_string());
            }
            adjacent(distance)
        }
        PhysicalKind::Club => {
            if !is_mech || !unit.has_location(mech_loc::RA) || !unit.has_location(mech_loc::LA) {
                return Err("clubbing needs both arms".to_string());
            }
            adjacent(distance)
        }
        PhysicalKind::Push => {
            if !is_mech || !matches!(other.kind, UnitKind::Mech(_)) {
                return Err("only walkers push walkers".to_string());
            }
            if !unit.has_location(mech_loc::RA) || !unit.has_location(mech_loc::LA) {
                return Err("pushing needs both arms".to_string());
            }
            adjacent(distance)
        }
        PhysicalKind::Charge => {
            if unit.kind.is_infantry() || other.kind.is_infantry() {
                return Err("infantry cannot be charged".to_string());
            }
            adjacent(distance)
        }
        PhysicalKind::Dfa => {
            if unit.movement.move_type != MoveType::Jump {
                return Err("death from above needs a jump".to_string());
            }
            adjacent(distance)
        }
        PhysicalKind::Thrash => {
            if !is_mech || !other.kind.is_infantry() || distance != 0 {
                return Err("thrashing only reaches infantry in the same hex".to_string());
            }
            Ok(())
        }
        PhysicalKind::BrushOff(limb) => {
            if !is_mech || !unit.has_location(arm_location(limb)) {
                return Err("the arm cannot reach".to_string());
            }
            let swarmer = unit.swarmed_by == Some(target);
            let pod = target == attacker && !unit.narc_pods.is_empty();
            if swarmer || pod {
                Ok(())
            } else {
                Err("nothing to brush off".to_string())
            }
        }
    }
}

fn adjacent(distance: u32) -> Result<(), String> {
    if distance == 1 {
        Ok(())
    } else {
        Err("target is not adjacent".to_string())
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve one declared physical attack.
pub fn resolve_physical_attack(game: &mut Match, action: &AttackAction) {
    let AttackKind::Physical(kind) = action.kind else { return };
    let attacker = action.attacker;
    let Some(target) = action.target.unit() else {
        warn!(attacker = attacker.0, "physical attack without a unit target");
        return;
    };
    let Some(attacker_name) = game.unit(attacker).map(|u| u.name.clone()) else { return };
    let Some(target_unit) = game.unit(target) else { return };
    let target_name = target_unit.name.clone();
    if target_unit.status.destroyed {
        game.report(
            ReportKind::Attack,
            Some(attacker),
            format!("{} {} {}, but it is already destroyed", attacker_name, verb(kind), target_name),
        );
        return;
    }
    if let Err(reason) = validate(game, attacker, target, kind) {
        game.report(
            ReportKind::Error,
            Some(attacker),
            format!("{} cannot attack {}: {}", attacker_name, target_name, reason),
        );
        return;
    }

    let (hit, roll) = roll_attack(game, action.to_hit);
    debug!(attacker = attacker.0, target = target.0, ?kind, hit, "physical attack");
    game.report(
        ReportKind::Attack,
        Some(target),
        format!("{} {} {}, {}", attacker_name, verb(kind), target_name, describe_roll(action.to_hit, roll, hit)),
    );

    let jobs = match kind {
        PhysicalKind::Punch(limb) => punch(game, attacker, target, limb, hit),
        PhysicalKind::Kick(limb) => kick(game, attacker, target, limb, hit),
        PhysicalKind::Club => club(game, attacker, target, hit),
        PhysicalKind::Push => push(game, attacker, target, hit),
        PhysicalKind::Charge => charge(game, attacker, target, hit),
        PhysicalKind::Dfa => death_from_above(game, attacker, target, hit),
        PhysicalKind::Thrash => thrash(game, attacker, target, hit),
        PhysicalKind::BrushOff(limb) => brush_off(game, attacker, target, limb, hit),
    };
    cascade::run(game, jobs);
}

fn attack_side(game: &Match, attacker: UnitId, target: UnitId) -> Side {
    match (game.unit(attacker).and_then(|u| u.position), game.unit(target)) {
        (Some(from), Some(unit)) => side_of(unit, from),
        _ => Side::Front,
    }
}

fn weight_of(game: &Match, id: UnitId) -> u32 {
    game.unit(id).map(|u| u.weight).unwrap_or(0)
}

fn punch(game: &mut Match, attacker: UnitId, target: UnitId, limb: Limb, hit: bool) -> Vec<DamageJob> {
    if !hit {
        return Vec::new();
    }
    let damage = game.unit(attacker).map(|u| punch_damage(u, limb)).unwrap_or(0);
    let side = attack_side(game, attacker, target);
    clustered_damage(game, target, damage, damage, side, HitTable::Punch, DamageSource::Physical)
}

fn kick(game: &mut Match, attacker: UnitId, target: UnitId, _limb: Limb, hit: bool) -> Vec<DamageJob> {
    if !hit {
        psr::queue_psr(game, attacker, "missed a kick", 0);
        return Vec::new();
    }
    let damage = kick_damage(weight_of(game, attacker));
    let side = attack_side(game, attacker, target);
    psr::queue_psr(game, target, "was kicked", 0);
    clustered_damage(game, target, damage, damage, side, HitTable::Kick, DamageSource::Physical)
}

fn club(game: &mut Match, attacker: UnitId, target: UnitId, hit: bool) -> Vec<DamageJob> {
    if !hit {
        return Vec::new();
    }
    let damage = club_damage(weight_of(game, attacker));
    let side = attack_side(game, attacker, target);
    clustered_damage(game, target, damage, damage, side, HitTable::Standard, DamageSource::Physical)
}

fn attack_direction(game: &Match, attacker: UnitId, target: UnitId) -> Option<Facing> {
    let from = game.unit(attacker)?.position?;
    let to = game.unit(target)?.position?;
    from.direction_to(&to)
}

/// Step the attacker into the hex its target was driven out of.
fn follow_into(game: &mut Match, attacker: UnitId, vacated: Option<HexCoord>) -> Vec<DamageJob> {
    let Some(coords) = vacated else { return Vec::new() };
    let Some(unit) = game.unit_mut(attacker) else { return Vec::new() };
    if !unit.is_alive() {
        return Vec::new();
    }
    unit.position = Some(coords);
    secondary::enter_minefields(game, attacker, coords)
}

fn push(game: &mut Match, attacker: UnitId, target: UnitId, hit: bool) -> Vec<DamageJob> {
    if !hit {
        return Vec::new();
    }
    let Some(direction) = attack_direction(game, attacker, target) else { return Vec::new() };
    let vacated = game.unit(target).and_then(|u| u.position);
    let mut jobs = displace(game, target, direction);
    psr::queue_psr(game, target, "was pushed", 0);
    if game.unit(target).and_then(|u| u.position) != vacated {
        jobs.extend(follow_into(game, attacker, vacated));
    }
    jobs
}

fn charge(game: &mut Match, attacker: UnitId, target: UnitId, hit: bool) -> Vec<DamageJob> {
    if !hit {
        return Vec::new();
    }
    let hexes = game.unit(attacker).map(|u| u.movement.hexes_moved + 1).unwrap_or(1);
    let damage = charge_damage(weight_of(game, attacker), hexes);
    let recoil = charge_self_damage(weight_of(game, target));
    let direction = attack_direction(game, attacker, target);
    let side = attack_side(game, attacker, target);

    let mut jobs = clustered_damage(game, target, damage, 5, side, HitTable::Standard, DamageSource::Physical);
    jobs.extend(clustered_damage(game, attacker, recoil, 5, Side::Front, HitTable::Standard, DamageSource::Physical));
    psr::queue_psr(game, target, "was charged", 2);
    psr::queue_psr(game, attacker, "charged", 2);
    if let Some(direction) = direction {
        let vacated = game.unit(target).and_then(|u| u.position);
        jobs.extend(displace(game, target, direction));
        jobs.extend(follow_into(game, attacker, vacated));
    }
    jobs
}

fn death_from_above(game: &mut Match, attacker: UnitId, target: UnitId, hit: bool) -> Vec<DamageJob> {
    if !hit {
        game.report(ReportKind::Attack, Some(attacker), "The jump goes wide and the attacker crashes down");
        return vec![DamageJob::Fall { unit: attacker, height: 2 }];
    }
    let weight = weight_of(game, attacker);
    let direction = attack_direction(game, attacker, target);
    let side = attack_side(game, attacker, target);

    let mut jobs = clustered_damage(game, target, dfa_damage(weight), 5, side, HitTable::Punch, DamageSource::Physical);
    jobs.extend(clustered_damage(
        game,
        attacker,
        dfa_self_damage(weight),
        5,
        Side::Front,
        HitTable::Kick,
        DamageSource::Physical,
    ));
    psr::queue_psr(game, target, "hit by death from above", 2);
    psr::queue_psr(game, attacker, "landed a death from above", 4);
    if let Some(direction) = direction {
        let vacated = game.unit(target).and_then(|u| u.position);
        jobs.extend(displace(game, target, direction));
        jobs.extend(follow_into(game, attacker, vacated));
    }
    jobs
}

fn thrash(game: &mut Match, attacker: UnitId, target: UnitId, hit: bool) -> Vec<DamageJob> {
    psr::queue_psr(game, attacker, "thrashing", 0);
    if !hit {
        return Vec::new();
    }
    let damage = thrash_damage(weight_of(game, attacker));
    clustered_damage(game, target, damage, damage, Side::Front, HitTable::Standard, DamageSource::Physical)
}

fn brush_off(game: &mut Match, attacker: UnitId, target: UnitId, limb: Limb, hit: bool) -> Vec<DamageJob> {
    let damage = game.unit(attacker).map(|u| punch_damage(u, limb)).unwrap_or(0);
    if !hit {
        let packet = DamagePacket::new(damage, HitData::new(arm_location(limb)), DamageSource::Physical);
        return vec![DamageJob::Damage { target: attacker, packet }];
    }
    if target == attacker {
        if let Some(unit) = game.unit_mut(attacker) {
            if let Some(team) = unit.narc_pods.iter().next().copied() {
                unit.narc_pods.remove(&team);
            }
        }
        game.report(ReportKind::Attack, Some(attacker), "A Narc pod is knocked loose");
        return Vec::new();
    }
    detach_swarmer(game, target);
    clustered_damage(game, target, damage, damage, Side::Front, HitTable::Standard, DamageSource::Physical)
}

/// Break a swarm link from the swarming side.
pub fn detach_swarmer(game: &mut Match, swarmer: UnitId) {
    let Some(host) = game.unit_mut(swarmer).and_then(|u| u.swarming.take()) else { return };
    if let Some(unit) = game.unit_mut(host) {
        unit.swarmed_by = None;
    }
    let name = game.unit(swarmer).map(|u| u.name.clone()).unwrap_or_default();
    game.report(ReportKind::Attack, Some(swarmer), format!("{} drops off", name));
}

// =============================================================================
// DISPLACEMENT
// =============================================================================

/// Push `unit` one hex along `direction`.
///
/// A unit with nowhere to go (off the board, a cliff more than one level
/// up, or a full hex) is destroyed. Dropping two or more levels is a fall.
pub fn displace(game: &mut Match, unit_id: UnitId, direction: Facing) -> Vec<DamageJob> {
    let Some(unit) = game.unit(unit_id) else { return Vec::new() };
    let Some(from) = unit.position else { return Vec::new() };
    let dest = from.neighbor(direction);
    let from_level = game.board.hex(from).map(|h| h.level).unwrap_or(0);
    let dest_level = game.board.hex(dest).map(|h| h.level);
    let fits = match dest_level {
        Some(level) => level - from_level <= 1 && game.can_stack(unit, dest),
        None => false,
    };
    let name = unit.name.clone();
    let can_fall = unit.kind.can_fall();
    if !fits {
        game.report(ReportKind::Movement, Some(unit_id), format!("{} has nowhere to be pushed", name));
        return vec![DamageJob::Destroy { target: unit_id, reason: "displaced with nowhere to go".to_string() }];
    }

    if let Some(unit) = game.unit_mut(unit_id) {
        unit.position = Some(dest);
        unit.elevation = 0;
    }
    game.report(ReportKind::Movement, Some(unit_id), format!("{} is displaced into {}", name, dest));

    let mut jobs = secondary::enter_minefields(game, unit_id, dest);
    let drop = from_level - dest_level.unwrap_or(from_level);
    if drop >= 2 && can_fall {
        jobs.push(DamageJob::Fall { unit: unit_id, height: drop });
    }
    jobs
}

// =============================================================================
// SWARM ATTACKS
// =============================================================================

/// Exo-armor swarm: the first success climbs aboard, later attacks damage the host.
pub fn resolve_swarm(game: &mut Match, action: &AttackAction) {
    let attacker = action.attacker;
    let Some(target) = action.target.unit() else { return };
    let Some(unit) = game.unit(attacker) else { return };
    let attacker_name = unit.name.clone();
    let already_on = unit.swarming;
    let troopers = unit.troopers();
    let Some(host) = game.unit(target) else { return };
    let host_name = host.name.clone();
    if host.status.destroyed {
        game.report(
            ReportKind::Attack,
            Some(attacker),
            format!("{} swarms {}, but it is already destroyed", attacker_name, host_name),
        );
        return;
    }

    if already_on == Some(target) {
        let damage = troopers * SWARM_DAMAGE_PER_TROOPER;
        game.report(
            ReportKind::Attack,
            Some(target),
            format!("{} tears at {} for {} damage", attacker_name, host_name, damage),
        );
        let jobs = clustered_damage(game, target, damage, 5, Side::Rear, HitTable::Standard, DamageSource::Physical);
        cascade::run(game, jobs);
        return;
    }

    let close = match (unit.position, host.position) {
        (Some(a), Some(b)) => a.distance(&b) <= 1,
        _ => false,
    };
    let legal = unit.kind.can_swarm() && host.kind.can_be_swarmed() && already_on.is_none() && host.swarmed_by.is_none();
    if !legal || !close {
        game.report(
            ReportKind::Error,
            Some(attacker),
            format!("{} cannot swarm {}", attacker_name, host_name),
        );
        return;
    }

    let (hit, roll) = roll_attack(game, action.to_hit);
    game.report(
        ReportKind::Attack,
        Some(target),
        format!("{} swarms {}, {}", attacker_name, host_name, describe_roll(action.to_hit, roll, hit)),
    );
    if !hit {
        return;
    }
    let host_position = game.unit(target).and_then(|u| u.position);
    if let Some(unit) = game.unit_mut(attacker) {
        unit.swarming = Some(target);
        unit.position = host_position;
    }
    if let Some(host) = game.unit_mut(target) {
        host.swarmed_by = Some(attacker);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::attack::ToHit;
    use crate::game::testkit;

    /// Put the blue walker right in front of red.
    fn close_in(game: &mut Match) -> HexCoord {
        let red = game.unit(testkit::RED_MECH).and_then(|u| u.position).unwrap();
        let front = red.neighbor(Facing::SE);
        if let Some(unit) = game.unit_mut(testkit::BLUE_MECH) {
            unit.position = Some(front);
        }
        front
    }

    fn physical(game: &mut Match, kind: PhysicalKind) {
        resolve_physical_attack(
            game,
            &AttackAction::physical(testkit::RED_MECH, testkit::BLUE_MECH, kind, ToHit::Automatic),
        );
    }

    #[test]
    fn test_damage_formulas() {
        let unit = Unit::mech(UnitId(9), "Hunchback", testkit::RED, 50, 4, 0);
        assert_eq!(punch_damage(&unit, Limb::Left), 5);
        assert_eq!(kick_damage(50), 10);
        assert_eq!(charge_damage(50, 5), 20);
        assert_eq!(charge_self_damage(65), 7);
        assert_eq!(dfa_damage(50), 15);
        assert_eq!(dfa_self_damage(50), 10);
        assert_eq!(thrash_damage(50), 17);
    }

    #[test]
    fn test_damaged_actuator_halves_punch() {
        let mut unit = Unit::mech(UnitId(9), "Hunchback", testkit::RED, 50, 4, 0);
        if let Some(slot) = unit.locations[mech_loc::RA].slots.get_mut(1) {
            slot.hit = true;
        }
        assert_eq!(punch_damage(&unit, Limb::Right), 3);
        assert_eq!(punch_damage(&unit, Limb::Left), 5);
    }

    #[test]
    fn test_punch_out_of_reach_is_reported() {
        let mut game = testkit::duel();
        physical(&mut game, PhysicalKind::Punch(Limb::Right));
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 0);
        assert_eq!(game.reports.of_kind(ReportKind::Error).count(), 1);
    }

    #[test]
    fn test_kick_queues_target_roll() {
        let mut game = testkit::duel();
        close_in(&mut game);
        physical(&mut game, PhysicalKind::Kick(Limb::Left));
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 10);
        assert!(game.pending_psrs.iter().any(|r| r.unit == testkit::BLUE_MECH));
    }

    #[test]
    fn test_push_moves_both_units() {
        let mut game = testkit::duel();
        let front = close_in(&mut game);
        physical(&mut game, PhysicalKind::Push);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().position, Some(front.neighbor(Facing::SE)));
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().position, Some(front));
    }

    #[test]
    fn test_displaced_off_the_board_is_destroyed() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::BLUE_MECH) {
            unit.position = Some(HexCoord::from_offset(0, 0));
        }
        let jobs = displace(&mut game, testkit::BLUE_MECH, Facing::N);
        cascade::run(&mut game, jobs);
        assert!(game.unit(testkit::BLUE_MECH).unwrap().status.destroyed);
    }

    #[test]
    fn test_charge_damages_both_and_displaces() {
        let mut game = testkit::duel();
        let front = close_in(&mut game);
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.movement.hexes_moved = 3;
        }
        physical(&mut game, PhysicalKind::Charge);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 15);
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().damage_this_phase, 5);
        assert_eq!(game.unit(testkit::RED_MECH).unwrap().position, Some(front));
    }

    #[test]
    fn test_swarm_then_damage() {
        let mut game = testkit::duel();
        let host = game.unit(testkit::BLUE_MECH).and_then(|u| u.position).unwrap();
        let mut squad = Unit::battle_armor(UnitId(50), "Elementals", testkit::RED, 5, 10, 1, 3);
        squad.position = Some(host.neighbor(Facing::N));
        squad.status.deployed = true;
        game.add_unit(squad);
        let action = AttackAction {
            attacker: UnitId(50),
            target: crate::game::combat::attack::AttackTarget::Unit(testkit::BLUE_MECH),
            kind: AttackKind::Swarm,
            to_hit: ToHit::Automatic,
        };
        resolve_swarm(&mut game, &action);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().swarmed_by, Some(UnitId(50)));
        resolve_swarm(&mut game, &action);
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 5 * SWARM_DAMAGE_PER_TROOPER);

        detach_swarmer(&mut game, UnitId(50));
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().swarmed_by, None);
    }
}
