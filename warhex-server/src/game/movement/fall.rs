//! Falling.
//!
//! A fall is a cascade job: it can be caused by a failed piloting roll, a
//! collapsing floor, a failed death-from-above or a skid, and always resolves
//! the same way.

use tracing::debug;

use crate::game::combat::cascade::{clustered_damage, DamageJob};
use crate::game::combat::damage::DamageSource;
use crate::game::combat::hitloc::{HitTable, Side};
use crate::game::events::ReportKind;
use crate::game::psr::psr_target;
use crate::game::state::Match;
use crate::game::unit::{CanFall, UnitId};

/// Damage for a `weight`-ton unit falling `height` levels.
pub fn fall_damage(weight: u32, height: i32, in_water: bool) -> u32 {
    let damage = weight.div_ceil(10) * (height.max(0) as u32 + 1);
    if in_water {
        damage.div_ceil(2)
    } else {
        damage
    }
}

/// Knock `unit` down from `height` levels and return the damage it takes.
pub fn resolve_fall(game: &mut Match, unit: UnitId, height: i32) -> Vec<DamageJob> {
    let Some(u) = game.unit(unit) else { return Vec::new() };
    if !u.is_alive() {
        return Vec::new();
    }
    let Some(position) = u.position else { return Vec::new() };
    if !u.kind.can_fall() && height <= 0 {
        return Vec::new();
    }
    let in_water = game.board.hex(position).map(|h| h.water_depth > 0 && !h.ice).unwrap_or(false);
    let damage = fall_damage(u.weight, height, in_water);
    let walker = u.kind.can_fall();
    let name = u.name.clone();

    let roll = game.rng.d6();
    let side = Side::from_fall_roll(roll);
    if let Some(u) = game.unit_mut(unit) {
        if walker {
            u.status.prone = true;
            u.facing = u.facing.rotated(roll as i32 - 1);
        }
        u.movement.fell_during_movement = true;
        u.elevation = 0;
    }
    debug!(unit = unit.0, height, damage, roll, "fall");
    game.report(
        ReportKind::Piloting,
        Some(unit),
        format!("{} falls {} level(s) and lands on its {} side, taking {} damage", name, height.max(0), side, damage),
    );

    let mut jobs = clustered_damage(game, unit, damage, 5, side, HitTable::Standard, DamageSource::Fall);

    if walker {
        let target = game.unit(unit).and_then(|u| psr_target(u, height.max(0)));
        let hurt = match target {
            None => true,
            Some(target) => {
                let roll = game.rng.roll_2d6();
                let hurt = roll.total() < target;
                game.report(
                    ReportKind::Crew,
                    Some(unit),
                    format!(
                        "{} pilot rolls to avoid injury, needs {}, rolls {}: {}",
                        name,
                        target,
                        roll,
                        if hurt { "injured" } else { "unhurt" }
                    ),
                );
                hurt
            }
        };
        if hurt {
            jobs.push(DamageJob::CrewHits { target: unit, hits: 1 });
        }
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::cascade;
    use crate::game::testkit;

    #[test]
    fn test_fall_damage() {
        assert_eq!(fall_damage(50, 0, false), 5);
        assert_eq!(fall_damage(55, 2, false), 18);
        assert_eq!(fall_damage(55, 0, true), 3);
    }

    #[test]
    fn test_fall_knocks_prone() {
        let mut game = testkit::duel();
        cascade::run(&mut game, vec![DamageJob::Fall { unit: testkit::RED_MECH, height: 0 }]);
        let unit = game.unit(testkit::RED_MECH).unwrap();
        assert!(unit.status.prone);
        assert!(unit.movement.fell_during_movement);
        assert_eq!(unit.damage_this_phase, 5);
    }

    #[test]
    fn test_infantry_only_hurt_by_real_drops() {
        let mut game = testkit::duel();
        let squad = crate::game::unit::Unit::infantry(UnitId(9), "Rifles", testkit::RED, 28, 1);
        let position = game.unit(testkit::RED_MECH).and_then(|u| u.position);
        game.add_unit(squad);
        if let Some(u) = game.unit_mut(UnitId(9)) {
            u.position = position;
            u.status.deployed = true;
        }
        assert!(resolve_fall(&mut game, UnitId(9), 0).is_empty());
        assert!(!resolve_fall(&mut game, UnitId(9), 2).is_empty());
        assert!(!game.unit(UnitId(9)).unwrap().status.prone);
    }
}
