//! Secondary Effects
//!
//! Terrain consequences shared by movement and combat: fire and smoke,
//! building damage and collapse, and minefields. Functions that damage
//! units return cascade jobs rather than running the cascade.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::hex::HexCoord;
use crate::game::board::{Fire, MinefieldKind, Woods};
use crate::game::combat::cascade::{clustered_damage, DamageJob};
use crate::game::combat::damage::DamageSource;
use crate::game::combat::hitloc::{HitTable, Side};
use crate::game::events::ReportKind;
use crate::game::psr;
use crate::game::state::{Match, PlayerId};
use crate::game::unit::{MotiveType, UnitId, UnitKind};

/// Rounds smoke lingers.
pub const SMOKE_ROUNDS: u8 = 3;
/// Rounds a flare lights its hex.
pub const FLARE_ROUNDS: u8 = 3;
/// Rounds an inferno or burning hex keeps a unit alight.
pub const BURN_ROUNDS: u8 = 3;
/// Heat an inferno minefield adds to a walker.
pub const INFERNO_MINE_HEAT: u32 = 6;
/// CF a burning building loses each End phase.
pub const BUILDING_FIRE_DAMAGE: u32 = 2;

// =============================================================================
// FIRE
// =============================================================================

/// Try to set `coords` alight. `modifier` is added to the 2d6 roll.
pub fn try_ignite(game: &mut Match, coords: HexCoord, modifier: i32, automatic: bool) -> bool {
    let class = game.board.building_class_at(coords);
    let Some(hex) = game.board.hex(coords) else { return false };
    if hex.fire.is_some() {
        return false;
    }
    let Some(target) = hex.ignition_target(class) else { return false };
    let lit = if automatic {
        true
    } else {
        let roll = game.rng.roll_2d6();
        let total = roll.total() + modifier;
        debug!(%coords, target, roll = total, "ignition roll");
        total >= target
    };
    if lit {
        if let Some(hex) = game.board.hex_mut(coords) {
            hex.fire = Some(Fire { turns: 0 });
        }
        game.report(ReportKind::Fire, None, format!("Hex {} catches fire", coords));
    }
    lit
}

/// End-of-round fire bookkeeping: smoke, spread, building damage, burn-down,
/// then smoke and flare countdowns.
pub fn resolve_fires(game: &mut Match) {
    for hex in game.board.hexes.values_mut() {
        hex.smoke = hex.smoke.saturating_sub(1);
    }
    game.flares.retain(|_, rounds| {
        *rounds = rounds.saturating_sub(1);
        *rounds > 0
    });

    let burning = game.board.burning_hexes();
    let mut jobs = Vec::new();
    let mut spread_to = Vec::new();
    for coords in &burning {
        if let Some(hex) = game.board.hex_mut(*coords) {
            hex.smoke = hex.smoke.max(SMOKE_ROUNDS);
        }
        if game.options.fire_spread {
            for neighbor in coords.neighbors() {
                let flammable = game
                    .board
                    .hex(neighbor)
                    .map(|h| h.fire.is_none() && h.is_flammable())
                    .unwrap_or(false);
                if !flammable || spread_to.contains(&neighbor) {
                    continue;
                }
                if game.rng.roll_2d6().total() >= 9 {
                    spread_to.push(neighbor);
                }
            }
        }
        if game.board.building_at(*coords).is_some() {
            jobs.push(DamageJob::BuildingDamage { coords: *coords, amount: BUILDING_FIRE_DAMAGE });
        }
        burn_down(game, *coords);
    }
    for coords in spread_to {
        if let Some(hex) = game.board.hex_mut(coords) {
            hex.fire = Some(Fire { turns: 0 });
        }
        game.report(ReportKind::Fire, None, format!("Fire spreads to {}", coords));
    }
    crate::game::combat::cascade::run(game, jobs);
}

fn burn_down(game: &mut Match, coords: HexCoord) {
    let roll = game.rng.roll_2d6();
    let Some(hex) = game.board.hex_mut(coords) else { return };
    if let Some(fire) = hex.fire.as_mut() {
        fire.turns = fire.turns.saturating_add(1);
    }
    if roll.total() < 10 || hex.building.is_some() {
        return;
    }
    let text = match hex.woods {
        Some(Woods::Heavy) => {
            hex.woods = Some(Woods::Light);
            "heavy woods burn down to light woods"
        }
        Some(Woods::Light) => {
            hex.woods = None;
            hex.rough = true;
            hex.fire = None;
            "light woods burn down, the fire goes out"
        }
        None => {
            hex.fire = None;
            "the fire burns out"
        }
    };
    game.report(ReportKind::Fire, None, format!("{}: {}", coords, text));
}

/// Light a flare over `coords`.
pub fn drop_flare(game: &mut Match, coords: HexCoord) {
    game.flares.insert(coords, FLARE_ROUNDS);
    game.report(ReportKind::Fire, None, format!("A flare lights up {}", coords));
}

/// Fill `coords` with smoke.
pub fn drop_smoke(game: &mut Match, coords: HexCoord) {
    if let Some(hex) = game.board.hex_mut(coords) {
        hex.smoke = hex.smoke.max(SMOKE_ROUNDS);
        game.report(ReportKind::Fire, None, format!("Smoke fills {}", coords));
    }
}

// =============================================================================
// BUILDINGS
// =============================================================================

/// Reduce the CF of the building hex at `coords`, collapsing it at zero.
pub fn damage_building(game: &mut Match, coords: HexCoord, amount: u32) -> Vec<DamageJob> {
    let Some(id) = game.board.building_at(coords).map(|b| b.id) else { return Vec::new() };
    let Some(building) = game.board.buildings.get_mut(&id) else { return Vec::new() };
    let Some(hex) = building.hexes.get_mut(&coords) else { return Vec::new() };
    hex.cf = hex.cf.saturating_sub(amount);
    let cf = hex.cf;
    let name = building.name.clone();
    game.report(
        ReportKind::Building,
        None,
        format!("{} at {} takes {} damage, CF now {}", name, coords, amount, cf),
    );
    if cf == 0 {
        collapse(game, coords)
    } else {
        Vec::new()
    }
}

/// Collapse the building hex at `coords`.
///
/// The hex turns to rubble. Conventional infantry inside die; other units
/// take damage for every floor above them and fall to the ground.
pub fn collapse(game: &mut Match, coords: HexCoord) -> Vec<DamageJob> {
    let Some(id) = game.board.building_at(coords).map(|b| b.id) else { return Vec::new() };
    let mut phase_cf = 0;
    let mut floors = 0;
    let mut name = String::new();
    if let Some(building) = game.board.buildings.get_mut(&id) {
        name = building.name.clone();
        if let Some(hex) = building.hexes.get_mut(&coords) {
            hex.collapsed = true;
            hex.cf = 0;
            phase_cf = hex.phase_cf.max(building.class.base_cf() / 4);
            floors = hex.floors as i32;
        }
    }
    if let Some(hex) = game.board.hex_mut(coords) {
        hex.rubble = true;
    }
    game.report(ReportKind::Building, None, format!("{} at {} collapses", name, coords));

    let mut jobs = Vec::new();
    for unit_id in game.units_at(coords) {
        let Some(unit) = game.unit(unit_id) else { continue };
        if matches!(unit.kind, UnitKind::Infantry) {
            jobs.push(DamageJob::Destroy { target: unit_id, reason: "buried in a collapsing building".to_string() });
            continue;
        }
        let elevation = unit.elevation;
        let above = (floors - elevation).max(1) as u32;
        let damage = phase_cf.div_ceil(10) * above;
        jobs.extend(clustered_damage(game, unit_id, damage, 5, Side::Front, HitTable::Standard, DamageSource::Collapse));
        if elevation > 0 {
            if let Some(unit) = game.unit_mut(unit_id) {
                unit.elevation = 0;
            }
            jobs.push(DamageJob::Fall { unit: unit_id, height: elevation });
        }
    }
    jobs
}

/// Collapse every building hex whose load on some floor exceeds its CF.
pub fn check_building_loads(game: &mut Match) -> Vec<DamageJob> {
    let mut loads: BTreeMap<(HexCoord, i32), u32> = BTreeMap::new();
    for unit in game.units.values() {
        let Some(pos) = unit.position else { continue };
        if !unit.is_on_board() || game.board.building_at(pos).is_none() {
            continue;
        }
        *loads.entry((pos, unit.elevation)).or_default() += unit.weight;
    }
    let mut overloaded: Vec<HexCoord> = Vec::new();
    for ((coords, _), load) in loads {
        let cf = game
            .board
            .building_at(coords)
            .and_then(|b| b.hexes.get(&coords))
            .map(|h| h.cf)
            .unwrap_or(0);
        if load > cf && !overloaded.contains(&coords) {
            overloaded.push(coords);
        }
    }
    let mut jobs = Vec::new();
    for coords in overloaded {
        game.report(ReportKind::Building, None, format!("The building at {} buckles under the load", coords));
        jobs.extend(collapse(game, coords));
    }
    jobs
}

// =============================================================================
// MINEFIELDS
// =============================================================================

/// Resolve minefields for `unit` entering `coords`.
pub fn enter_minefields(game: &mut Match, unit_id: UnitId, coords: HexCoord) -> Vec<DamageJob> {
    let Some(fields) = game.board.minefields.get(&coords).cloned() else { return Vec::new() };
    let Some(unit) = game.unit(unit_id) else { return Vec::new() };
    let weight = unit.weight;
    let hover = matches!(&unit.kind, UnitKind::Vehicle(v) if v.motive == MotiveType::Hover);
    let is_mech = matches!(unit.kind, UnitKind::Mech(_));
    let name = unit.name.clone();
    let team = game.unit_team(unit_id);

    let mut jobs = Vec::new();
    for field in fields {
        let armed = match field.kind {
            MinefieldKind::Command => false,
            MinefieldKind::Vibrabomb { setting } => weight >= setting,
            MinefieldKind::Active => true,
            MinefieldKind::Conventional | MinefieldKind::Inferno => !hover,
        };
        if !armed {
            continue;
        }
        let roll = game.rng.roll_2d6();
        if roll.total() < 7 {
            continue;
        }
        if let (Some(team), Some(list)) = (team, game.board.minefields.get_mut(&coords)) {
            if let Some(f) = list.iter_mut().find(|f| f.id == field.id) {
                f.known_to.insert(team);
            }
        }
        game.report(
            ReportKind::Minefield,
            Some(unit_id),
            format!("{} sets off a minefield at {} ({})", name, coords, roll),
        );
        jobs.extend(detonate(game, unit_id, field.kind, field.density, is_mech));
        thin_field(game, coords, field.id);
    }
    jobs
}

/// Detonate a command minefield under every unit in `coords`.
pub fn detonate_command(game: &mut Match, player: PlayerId, coords: HexCoord) -> Vec<DamageJob> {
    let Some(field) = game
        .board
        .minefields
        .get(&coords)
        .and_then(|list| list.iter().find(|f| f.owner == player && f.kind == MinefieldKind::Command))
        .cloned()
    else {
        return Vec::new();
    };
    game.report(ReportKind::Minefield, None, format!("A command minefield at {} is detonated", coords));
    let mut jobs = Vec::new();
    for unit_id in game.units_at(coords) {
        let is_mech = game.unit(unit_id).map(|u| matches!(u.kind, UnitKind::Mech(_))).unwrap_or(false);
        jobs.extend(detonate(game, unit_id, field.kind, field.density, is_mech));
    }
    game.board.remove_minefield(coords, field.id);
    jobs
}

fn detonate(game: &mut Match, unit_id: UnitId, kind: MinefieldKind, density: u32, is_mech: bool) -> Vec<DamageJob> {
    if kind == MinefieldKind::Inferno {
        if is_mech {
            return vec![DamageJob::Heat { target: unit_id, amount: INFERNO_MINE_HEAT }];
        }
        if let Some(unit) = game.unit_mut(unit_id) {
            unit.status.burning = BURN_ROUNDS;
        }
        return Vec::new();
    }
    let table = if is_mech { HitTable::Kick } else { HitTable::Standard };
    if is_mech {
        psr::queue_psr(game, unit_id, "minefield damage", 0);
    }
    clustered_damage(game, unit_id, density, 5, Side::Front, table, DamageSource::Minefield)
}

fn thin_field(game: &mut Match, coords: HexCoord, id: u32) {
    if game.rng.roll_2d6().total() < 10 {
        return;
    }
    let mut cleared = false;
    if let Some(field) = game.board.minefields.get_mut(&coords).and_then(|l| l.iter_mut().find(|f| f.id == id)) {
        field.density = field.density.saturating_sub(5);
        cleared = field.density < 5;
    }
    if cleared {
        game.board.remove_minefield(coords, id);
        game.report(ReportKind::Minefield, None, format!("The minefield at {} is cleared", coords));
    } else {
        game.report(ReportKind::Minefield, None, format!("The minefield at {} thins out", coords));
    }
}

// =============================================================================
// TESTS
// =============================================================================
