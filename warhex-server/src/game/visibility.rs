//! Visibility
//!
//! Answers "who can currently observe unit X" for the transport layer and
//! filters the report stream per viewer. With double blind off everyone
//! sees everything.

use std::collections::BTreeSet;

use crate::core::hex::HexCoord;
use crate::game::events::Report;
use crate::game::state::{Match, PlayerId, TeamId};
use crate::game::unit::{Unit, UnitId};

/// Lit by a flare or a fire.
fn illuminated(game: &Match, coords: HexCoord) -> bool {
    game.flares.contains_key(&coords) || game.board.hex(coords).map(|h| h.fire.is_some()).unwrap_or(false)
}

/// True when `viewer` can currently observe `unit`.
pub fn can_see(game: &Match, viewer: PlayerId, unit: UnitId) -> bool {
    let Some(player) = game.players.get(&viewer) else { return false };
    // Gone from the board: the wreck is public knowledge.
    let Some(target) = game.unit(unit) else { return true };
    if !game.options.double_blind || player.observer {
        return true;
    }
    if game.team_of(target.owner) == Some(player.team) {
        return true;
    }
    spotted_by_team(game, player.team, target)
}

fn spotted_by_team(game: &Match, team: TeamId, target: &Unit) -> bool {
    let Some(at) = target.position else { return false };
    if !target.is_alive() {
        return true;
    }
    let mut range = game.options.visual_range;
    if illuminated(game, at) {
        range *= 2;
    }
    game.units.values().any(|spotter| {
        spotter.is_on_board()
            && game.team_of(spotter.owner) == Some(team)
            && spotter.position.map(|p| p.distance(&at) <= range).unwrap_or(false)
    })
}

/// Every player who can currently observe `unit`.
pub fn observers_of(game: &Match, unit: UnitId) -> BTreeSet<PlayerId> {
    game.players.keys().copied().filter(|p| can_see(game, *p, unit)).collect()
}

/// Units `viewer` may be shown.
pub fn visible_units(game: &Match, viewer: PlayerId) -> Vec<&Unit> {
    game.units.values().filter(|u| can_see(game, viewer, u.id)).collect()
}

/// The report stream as `viewer` should receive it, starting after `since`.
///
/// Team-only entries for other teams are dropped; entries about units the
/// viewer cannot see arrive redacted.
pub fn reports_for(game: &Match, viewer: PlayerId, since: u64) -> Vec<Report> {
    let Some(player) = game.players.get(&viewer) else { return Vec::new() };
    game.reports
        .since(since)
        .iter()
        .filter(|r| player.observer || r.team_only.map(|t| t == player.team).unwrap_or(true))
        .map(|r| match r.subject {
            Some(subject) if !can_see(game, viewer, subject) => r.redacted(),
            _ => r.clone(),
        })
        .collect()
}
