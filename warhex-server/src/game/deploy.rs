//! Deployment
//!
//! Setup actions: units entering the board, minefields and artillery
//! pre-designation. These are validated up front; a rejected placement
//! changes nothing so the player can try again.

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::hex::{Facing, HexCoord};
use crate::game::combat::cascade::{self, DamageJob};
use crate::game::combat::secondary;
use crate::game::events::ReportKind;
use crate::game::input::MinefieldPlacement;
use crate::game::movement::cost::terrain_cost;
use crate::game::psr::{self, PsrOutcome};
use crate::game::state::{Match, PlayerId};
use crate::game::unit::{CanFall, UnitId};

/// Smallest minefield density.
pub const MIN_DENSITY: u32 = 5;
/// Largest minefield density.
pub const MAX_DENSITY: u32 = 30;

/// Place `unit` (and the units it carries) on the board.
#[allow(clippy::too_many_arguments)]
pub fn deploy_unit(
    game: &mut Match,
    player: PlayerId,
    unit_id: UnitId,
    coords: HexCoord,
    facing: Facing,
    loaded: &[UnitId],
    assault_drop: bool,
) -> Result<(), String> {
    let unit = game.unit(unit_id).ok_or("no such unit")?;
    if unit.owner != player {
        return Err("not your unit".into());
    }
    if unit.status.deployed {
        return Err("already deployed".into());
    }
    let hex = game.board.hex(coords).ok_or("outside the board")?;
    if terrain_cost(hex, unit).is_none() {
        return Err("cannot enter that terrain".into());
    }
    if !game.can_stack(unit, coords) {
        return Err("hex is full".into());
    }
    let mut cargo: BTreeSet<UnitId> = BTreeSet::new();
    let mut weight = 0;
    for id in loaded {
        let passenger = game.unit(*id).ok_or("no such passenger")?;
        if passenger.owner != player || passenger.status.deployed || *id == unit_id {
            return Err(format!("{} cannot be loaded", id));
        }
        weight += passenger.weight;
        cargo.insert(*id);
    }
    if weight > unit.transport.capacity {
        return Err("not enough room for the passengers".into());
    }
    let name = unit.name.clone();
    let walker = unit.kind.can_fall();

    if let Some(u) = game.unit_mut(unit_id) {
        u.position = Some(coords);
        u.facing = facing;
        u.elevation = 0;
        u.status.deployed = true;
        u.status.done = true;
        u.transport.carrying.extend(cargo.iter().copied());
    }
    for id in &cargo {
        if let Some(p) = game.unit_mut(*id) {
            p.transport.carried_by = Some(unit_id);
            p.position = Some(coords);
            p.status.deployed = true;
            p.status.done = true;
        }
    }
    debug!(unit = unit_id.0, %coords, passengers = cargo.len(), assault_drop, "deployed");
    let how = if assault_drop { "drops in at" } else { "deploys at" };
    game.report(ReportKind::Deployment, Some(unit_id), format!("{} {} {} facing {:?}", name, how, coords, facing));

    let mut jobs = secondary::enter_minefields(game, unit_id, coords);
    if assault_drop && walker && psr::roll_psr(game, unit_id, "assault drop landing", 0) == PsrOutcome::Failed {
        jobs.push(DamageJob::Fall { unit: unit_id, height: 0 });
    }
    cascade::run(game, jobs);
    Ok(())
}

/// Lay minefields from the player's allotment. All or nothing.
pub fn deploy_minefields(game: &mut Match, player: PlayerId, fields: &[MinefieldPlacement]) -> Result<(), String> {
    let owner = game.players.get(&player).ok_or("unknown player")?;
    let team = owner.team;
    let mut allotment = owner.minefields.clone();
    for field in fields {
        if !game.board.contains(field.coords) {
            return Err(format!("{} is outside the board", field.coords));
        }
        if field.density < MIN_DENSITY || field.density > MAX_DENSITY || field.density % 5 != 0 {
            return Err(format!("density {} is not allowed", field.density));
        }
        if !allotment.take(field.kind) {
            return Err("no minefields of that kind left".into());
        }
    }
    if let Some(p) = game.players.get_mut(&player) {
        p.minefields = allotment;
    }
    for field in fields {
        game.board.add_minefield(field.coords, field.kind, field.density, player, team);
        game.report_to_team(
            ReportKind::Minefield,
            team,
            format!("Minefield ({:?}, density {}) laid at {}", field.kind, field.density, field.coords),
        );
    }
    Ok(())
}

/// Record the hexes a player's artillery will hit without rolling.
pub fn set_artillery_autohit(game: &mut Match, player: PlayerId, hexes: &[HexCoord]) -> Result<(), String> {
    let limit = game.options.artillery_autohit_limit;
    if hexes.len() > limit {
        return Err(format!("at most {} hexes may be designated", limit));
    }
    if let Some(bad) = hexes.iter().find(|h| !game.board.contains(**h)) {
        return Err(format!("{} is outside the board", bad));
    }
    let team = game.team_of(player).ok_or("unknown player")?;
    if let Some(p) = game.players.get_mut(&player) {
        p.artillery_autohit = hexes.to_vec();
    }
    game.report_to_team(
        ReportKind::Artillery,
        team,
        format!("{} hex(es) designated for artillery", hexes.len()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{Hex, MinefieldKind};
    use crate::game::testkit;
    use crate::game::unit::{MotiveType, Unit};

    fn reserve(game: &mut Match) -> UnitId {
        let mut unit = Unit::mech(UnitId(7), "Reserve", testkit::RED, 45, 4, 0);
        unit.deploy_round = 1;
        game.add_unit(unit);
        UnitId(7)
    }

    #[test]
    fn test_deploy_places_unit() {
        let mut game = testkit::duel();
        let id = reserve(&mut game);
        let coords = HexCoord::from_offset(1, 1);
        deploy_unit(&mut game, testkit::RED, id, coords, Facing::S, &[], false).unwrap();
        let unit = game.unit(id).unwrap();
        assert_eq!(unit.position, Some(coords));
        assert_eq!(unit.facing, Facing::S);
        assert!(unit.status.deployed && unit.is_on_board());
    }

    #[test]
    fn test_deploy_rejects_foreign_or_bad_hex() {
        let mut game = testkit::duel();
        let id = reserve(&mut game);
        assert!(deploy_unit(&mut game, testkit::BLUE, id, HexCoord::from_offset(1, 1), Facing::N, &[], false).is_err());
        assert!(deploy_unit(&mut game, testkit::RED, id, HexCoord::from_offset(40, 1), Facing::N, &[], false).is_err());
        assert!(!game.unit(id).unwrap().status.deployed);
    }

    #[test]
    fn test_deploy_with_passengers() {
        let mut game = testkit::duel();
        let mut apc = Unit::vehicle(UnitId(8), "Packrat", testkit::RED, 20, 6, MotiveType::Wheeled, false, 10);
        apc.transport.capacity = 5;
        game.add_unit(apc);
        game.add_unit(Unit::infantry(UnitId(9), "Rifles", testkit::RED, 28, 1));
        let coords = HexCoord::from_offset(2, 2);
        deploy_unit(&mut game, testkit::RED, UnitId(8), coords, Facing::N, &[UnitId(9)], false).unwrap();
        let squad = game.unit(UnitId(9)).unwrap();
        assert_eq!(squad.transport.carried_by, Some(UnitId(8)));
        assert!(squad.status.deployed && !squad.is_on_board());
    }

    #[test]
    fn test_tracked_vehicle_cannot_deploy_into_water() {
        let mut game = testkit::duel();
        let coords = HexCoord::from_offset(2, 2);
        game.board.set_hex(coords, Hex { water_depth: 1, ..Hex::clear(0) });
        game.add_unit(Unit::vehicle(UnitId(8), "Bulldog", testkit::RED, 60, 4, MotiveType::Tracked, true, 20));
        assert!(deploy_unit(&mut game, testkit::RED, UnitId(8), coords, Facing::N, &[], false).is_err());
    }

    #[test]
    fn test_minefields_use_allotment() {
        let mut game = testkit::duel();
        if let Some(p) = game.players.get_mut(&testkit::RED) {
            p.minefields.conventional = 1;
        }
        let field = MinefieldPlacement { coords: HexCoord::from_offset(5, 5), kind: MinefieldKind::Conventional, density: 20 };
        assert!(deploy_minefields(&mut game, testkit::RED, &[field, field]).is_err());
        assert!(game.board.minefields.is_empty());
        deploy_minefields(&mut game, testkit::RED, &[field]).unwrap();
        assert_eq!(game.board.minefields.get(&field.coords).map(|f| f.len()), Some(1));
        assert!(!game.players[&testkit::RED].minefields.any());
        let bad = MinefieldPlacement { density: 7, ..field };
        assert!(deploy_minefields(&mut game, testkit::RED, &[bad]).is_err());
    }

    #[test]
    fn test_artillery_autohit_limit() {
        let mut game = testkit::duel();
        game.options.artillery_autohit_limit = 1;
        let hexes = [HexCoord::from_offset(1, 1), HexCoord::from_offset(2, 2)];
        assert!(set_artillery_autohit(&mut game, testkit::RED, &hexes).is_err());
        set_artillery_autohit(&mut game, testkit::RED, &hexes[..1]).unwrap();
        assert_eq!(game.players[&testkit::RED].artillery_autohit, vec![hexes[0]]);
    }
}
