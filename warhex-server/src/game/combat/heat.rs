//! Heat
//!
//! Heat is settled once per round in the End phase: movement, weapon fire,
//! engine damage and outside sources accumulate in `heat_buildup` during the
//! round, sinks dissipate, and the new level is checked against the scale.

use tracing::debug;

use crate::game::combat::cascade::{self, DamageJob};
use crate::game::events::ReportKind;
use crate::game::options::HeatScale;
use crate::game::state::Match;
use crate::game::unit::{EquipmentId, HasHeat, UnitId, UnitKind};

/// Heat added per engine critical each round.
pub const ENGINE_HIT_HEAT: u32 = 5;

/// Threshold tables for one heat scale.
#[derive(Clone, Copy, Debug)]
pub struct HeatTable {
    /// (heat, avoid number) for shutdown, ascending
    pub shutdown: &'static [(u32, i32)],
    /// Automatic shutdown at or above
    pub auto_shutdown: u32,
    /// (heat, avoid number) for ammunition explosion, ascending
    pub ammo: &'static [(u32, i32)],
    /// Automatic ammunition explosion at or above
    pub auto_ammo: Option<u32>,
    /// (heat, avoid number) for pilot damage, ascending
    pub pilot: &'static [(u32, i32)],
}

const STANDARD: HeatTable = HeatTable {
    shutdown: &[(14, 4), (18, 6), (22, 8), (26, 10)],
    auto_shutdown: 30,
    ammo: &[(19, 4), (23, 6), (28, 8)],
    auto_ammo: None,
    pilot: &[],
};

const EXTENDED: HeatTable = HeatTable {
    shutdown: &[(14, 4), (18, 6), (22, 8), (26, 10), (30, 12)],
    auto_shutdown: 34,
    ammo: &[(19, 4), (23, 6), (28, 8), (33, 10), (37, 12)],
    auto_ammo: Some(45),
    pilot: &[(32, 8), (39, 10), (47, 12)],
};

impl HeatTable {
    /// Table for a scale.
    pub fn for_scale(scale: HeatScale) -> &'static HeatTable {
        match scale {
            HeatScale::Standard => &STANDARD,
            HeatScale::Extended => &EXTENDED,
        }
    }

    fn lookup(thresholds: &[(u32, i32)], heat: u32) -> Option<i32> {
        thresholds.iter().rev().find(|(level, _)| heat >= *level).map(|(_, avoid)| *avoid)
    }

    /// Avoid number for shutdown, `None` below the first threshold.
    pub fn shutdown_avoid(&self, heat: u32) -> Option<i32> {
        Self::lookup(self.shutdown, heat)
    }

    /// Avoid number for an ammunition explosion.
    pub fn ammo_avoid(&self, heat: u32) -> Option<i32> {
        Self::lookup(self.ammo, heat)
    }

    /// Avoid number for pilot damage.
    pub fn pilot_avoid(&self, heat: u32) -> Option<i32> {
        Self::lookup(self.pilot, heat)
    }
}

/// Heat after dissipation.
pub fn settle_heat(heat: u32, buildup: u32, engine_hits: u8, sinks: u32) -> u32 {
    (heat + buildup + engine_hits as u32 * ENGINE_HIT_HEAT).saturating_sub(sinks)
}

/// Life support crew damage at `heat` when life support is damaged.
pub fn life_support_hits(heat: u32) -> u8 {
    match heat {
        25.. => 2,
        15.. => 1,
        _ => 0,
    }
}

/// Settle heat for every unit and apply its effects.
pub fn resolve_heat(game: &mut Match) {
    let table = HeatTable::for_scale(game.options.heat_scale);
    let ids: Vec<UnitId> = game
        .units
        .values()
        .filter(|u| u.is_alive() && u.kind.tracks_heat())
        .map(|u| u.id)
        .collect();
    for id in ids {
        resolve_unit_heat(game, table, id);
    }
}

fn resolve_unit_heat(game: &mut Match, table: &HeatTable, id: UnitId) {
    let Some(unit) = game.unit_mut(id) else { return };
    let (engine_hits, life_support) = match &unit.kind {
        UnitKind::Mech(s) => (s.engine_hits, s.life_support_hits > 0),
        _ => (0, false),
    };
    let heat = settle_heat(unit.heat, unit.heat_buildup, engine_hits, unit.heat_sinks);
    let gained = unit.heat_buildup;
    unit.heat = heat;
    unit.heat_buildup = 0;
    let was_shutdown = unit.status.shutdown;
    let name = unit.name.clone();
    debug!(unit = id.0, heat, gained, "heat settled");
    game.report(ReportKind::Heat, Some(id), format!("{} gains {} heat, now at {}", name, gained, heat));

    let mut jobs = Vec::new();

    if was_shutdown {
        restart(game, table, id, heat);
    } else if heat >= table.auto_shutdown {
        shut_down(game, id, "automatic shutdown");
    } else if let Some(avoid) = table.shutdown_avoid(heat) {
        let roll = game.rng.roll_2d6();
        let avoided = roll.total() >= avoid;
        game.report(
            ReportKind::Heat,
            Some(id),
            format!("{} shutdown avoid roll, needs {}, rolls {}", name, avoid, roll),
        );
        if !avoided {
            shut_down(game, id, "shuts down");
        }
    }

    if table.auto_ammo.map(|level| heat >= level).unwrap_or(false) {
        jobs.extend(ammo_explosion(game, id));
    } else if let Some(avoid) = table.ammo_avoid(heat) {
        let roll = game.rng.roll_2d6();
        game.report(
            ReportKind::Heat,
            Some(id),
            format!("{} ammunition explosion avoid roll, needs {}, rolls {}", name, avoid, roll),
        );
        if roll.total() < avoid {
            jobs.extend(ammo_explosion(game, id));
        }
    }

    if let Some(avoid) = table.pilot_avoid(heat) {
        let roll = game.rng.roll_2d6();
        game.report(
            ReportKind::Heat,
            Some(id),
            format!("{} pilot heat damage avoid roll, needs {}, rolls {}", name, avoid, roll),
        );
        if roll.total() < avoid {
            jobs.push(DamageJob::CrewHits { target: id, hits: 1 });
        }
    }

    if life_support {
        let hits = life_support_hits(heat);
        if hits > 0 {
            game.report(ReportKind::Heat, Some(id), format!("{} damaged life support fails to cope", name));
            jobs.push(DamageJob::CrewHits { target: id, hits });
        }
    }

    cascade::run(game, jobs);
}

fn shut_down(game: &mut Match, id: UnitId, text: &str) {
    let Some(unit) = game.unit_mut(id) else { return };
    unit.status.shutdown = true;
    let name = unit.name.clone();
    game.report(ReportKind::Heat, Some(id), format!("{} {}", name, text));
}

fn restart(game: &mut Match, table: &HeatTable, id: UnitId, heat: u32) {
    let name = game.unit(id).map(|u| u.name.clone()).unwrap_or_default();
    let started = if heat >= table.auto_shutdown {
        false
    } else {
        match table.shutdown_avoid(heat) {
            None => true,
            Some(avoid) => {
                let roll = game.rng.roll_2d6();
                game.report(
                    ReportKind::Heat,
                    Some(id),
                    format!("{} startup roll, needs {}, rolls {}", name, avoid, roll),
                );
                roll.total() >= avoid
            }
        }
    };
    if started {
        if let Some(unit) = game.unit_mut(id) {
            unit.status.shutdown = false;
        }
        game.report(ReportKind::Heat, Some(id), format!("{} restarts", name));
    }
}

/// The fullest loaded bin explodes.
fn ammo_explosion(game: &mut Match, id: UnitId) -> Vec<DamageJob> {
    let Some(unit) = game.unit(id) else { return Vec::new() };
    let bin = unit
        .equipment
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.destroyed)
        .filter_map(|(i, m)| m.ammo().map(|a| (i, a.shots * a.damage_per_shot)))
        .filter(|(_, damage)| *damage > 0)
        .max_by_key(|(i, damage)| (*damage, std::cmp::Reverse(*i)));
    match bin {
        Some((index, _)) => vec![DamageJob::AmmoExplosion { target: id, equipment: EquipmentId(index as u16) }],
        None => Vec::new(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testkit;

    #[test]
    fn test_threshold_lookup() {
        let table = HeatTable::for_scale(HeatScale::Standard);
        assert_eq!(table.shutdown_avoid(13), None);
        assert_eq!(table.shutdown_avoid(14), Some(4));
        assert_eq!(table.shutdown_avoid(29), Some(10));
        assert_eq!(table.ammo_avoid(23), Some(6));
        assert_eq!(table.pilot_avoid(40), None);
        let extended = HeatTable::for_scale(HeatScale::Extended);
        assert_eq!(extended.shutdown_avoid(31), Some(12));
        assert_eq!(extended.pilot_avoid(40), Some(10));
    }

    #[test]
    fn test_settle_heat() {
        assert_eq!(settle_heat(5, 12, 0, 10), 7);
        assert_eq!(settle_heat(0, 3, 1, 10), 0);
        assert_eq!(settle_heat(0, 10, 2, 10), 10);
    }

    #[test]
    fn test_life_support() {
        assert_eq!(life_support_hits(14), 0);
        assert_eq!(life_support_hits(15), 1);
        assert_eq!(life_support_hits(30), 2);
    }

    #[test]
    fn test_automatic_shutdown() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.heat_buildup = 40;
        }
        resolve_heat(&mut game);
        let unit = game.unit(testkit::RED_MECH).unwrap();
        assert_eq!(unit.heat, 30);
        assert!(unit.status.shutdown);
    }

    #[test]
    fn test_cool_unit_restarts() {
        let mut game = testkit::duel();
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.status.shutdown = true;
            unit.heat = 5;
        }
        resolve_heat(&mut game);
        assert!(!game.unit(testkit::RED_MECH).unwrap().status.shutdown);
    }
}
