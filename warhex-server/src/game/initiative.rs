//! Initiative
//!
//! Initiative is rolled once per round, per team or per unit. Each entrant
//! keeps the list of its rolls: the first roll decides, and entrants that
//! tie keep rolling among themselves until every list is distinct. Lower
//! initiative acts first.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::rng::DeterministicRng;
use crate::game::events::ReportKind;
use crate::game::state::{Match, TeamId};
use crate::game::unit::UnitId;

/// Roll for every entrant, then re-roll tied groups until the order is total.
///
/// `bonus` is added to every roll an entrant makes.
pub fn roll_with_ties<K: Ord + Copy>(
    rng: &mut DeterministicRng,
    entrants: &[K],
    bonus: impl Fn(K) -> i32,
) -> BTreeMap<K, Vec<i32>> {
    let mut rolls: BTreeMap<K, Vec<i32>> = BTreeMap::new();
    for key in entrants {
        rolls.insert(*key, vec![rng.roll_2d6().total() + bonus(*key)]);
    }
    loop {
        let mut groups: BTreeMap<Vec<i32>, Vec<K>> = BTreeMap::new();
        for (key, history) in &rolls {
            groups.entry(history.clone()).or_default().push(*key);
        }
        let tied: Vec<K> = groups.into_values().filter(|g| g.len() > 1).flatten().collect();
        if tied.is_empty() {
            return rolls;
        }
        debug!(tied = tied.len(), "initiative tie, re-rolling");
        for key in tied {
            let roll = rng.roll_2d6().total() + bonus(key);
            if let Some(history) = rolls.get_mut(&key) {
                history.push(roll);
            }
        }
    }
}

/// Entrants from lowest to highest initiative.
pub fn order<K: Ord + Copy>(rolls: &BTreeMap<K, Vec<i32>>) -> Vec<K> {
    let mut keys: Vec<K> = rolls.keys().copied().collect();
    keys.sort_by(|a, b| rolls[a].cmp(&rolls[b]).then(a.cmp(b)));
    keys
}

fn team_bonus(game: &Match, team: TeamId) -> i32 {
    game.players
        .values()
        .filter(|p| p.team == team && !p.observer)
        .map(|p| p.initiative_bonus)
        .max()
        .unwrap_or(0)
}

/// Teams with at least one non-observer player, connected or not.
pub fn playing_teams(game: &Match) -> Vec<TeamId> {
    let mut teams: Vec<TeamId> = game.players.values().filter(|p| !p.observer).map(|p| p.team).collect();
    teams.sort();
    teams.dedup();
    teams
}

/// Roll initiative for the round and report it.
pub fn roll_initiative(game: &mut Match) {
    let teams = playing_teams(game);
    let bonuses: BTreeMap<TeamId, i32> = teams.iter().map(|t| (*t, team_bonus(game, *t))).collect();
    let team_rolls = roll_with_ties(&mut game.rng, &teams, |t| bonuses.get(&t).copied().unwrap_or(0));
    for (team, history) in &team_rolls {
        let entry = game.teams.entry(*team).or_default();
        entry.id = *team;
        entry.initiative = history.clone();
    }

    if game.options.individual_initiative {
        let units: Vec<UnitId> = game.units.values().filter(|u| u.is_alive()).map(|u| u.id).collect();
        let unit_bonus: BTreeMap<UnitId, i32> = units
            .iter()
            .map(|id| {
                let team = game.unit_team(*id).unwrap_or_default();
                (*id, bonuses.get(&team).copied().unwrap_or(0))
            })
            .collect();
        let unit_rolls = roll_with_ties(&mut game.rng, &units, |u| unit_bonus.get(&u).copied().unwrap_or(0));
        for (id, history) in unit_rolls {
            if let Some(unit) = game.unit_mut(id) {
                unit.initiative = history;
            }
        }
    }
    report_initiative(game);
}

/// Team order for the round, lowest initiative first.
pub fn team_order(game: &Match) -> Vec<TeamId> {
    let rolls: BTreeMap<TeamId, Vec<i32>> = playing_teams(game)
        .into_iter()
        .map(|t| (t, game.teams.get(&t).map(|e| e.initiative.clone()).unwrap_or_default()))
        .collect();
    order(&rolls)
}

/// Unit order for individual initiative, lowest first.
pub fn unit_order(game: &Match, units: &[UnitId]) -> Vec<UnitId> {
    let rolls: BTreeMap<UnitId, Vec<i32>> = units
        .iter()
        .map(|id| (*id, game.unit(*id).map(|u| u.initiative.clone()).unwrap_or_default()))
        .collect();
    order(&rolls)
}

fn report_initiative(game: &mut Match) {
    let lines: Vec<String> = team_order(game)
        .into_iter()
        .map(|team| {
            let rolls = game.teams.get(&team).map(|t| t.initiative.clone()).unwrap_or_default();
            let shown: Vec<String> = rolls.iter().map(|r| r.to_string()).collect();
            format!("Team {}: {}", team.0, shown.join(" / "))
        })
        .collect();
    info!(round = game.round, order = ?lines, "initiative rolled");
    for line in lines {
        game.report(ReportKind::Initiative, None, line);
    }
}

// =============================================================================
// TACTICAL GENIUS
// =============================================================================

/// True when `team` may still ask for a reroll this round.
pub fn can_request_reroll(game: &Match, team: TeamId) -> bool {
    if !game.options.tactical_genius {
        return false;
    }
    let used = game.teams.get(&team).and_then(|t| t.reroll_round) == Some(game.round);
    let genius = game
        .units
        .values()
        .any(|u| u.is_on_board() && u.crew.tactical_genius && u.crew.is_active() && game.unit_team(u.id) == Some(team));
    genius && !used
}

/// Re-roll initiative for every team that asked, then settle new ties.
pub fn apply_rerolls(game: &mut Match) -> bool {
    let requests: Vec<TeamId> = std::mem::take(&mut game.reroll_requests).into_iter().collect();
    if requests.is_empty() {
        return false;
    }
    for team in &requests {
        game.report(ReportKind::Initiative, None, format!("Team {} uses tactical genius to re-roll initiative", team.0));
        let bonus = team_bonus(game, *team);
        let roll = game.rng.roll_2d6().total() + bonus;
        let round = game.round;
        if let Some(entry) = game.teams.get_mut(team) {
            entry.initiative = vec![roll];
            entry.reroll_round = Some(round);
        }
    }
    // Only the first roll matters after a reroll; older tie-break rolls go.
    let teams = playing_teams(game);
    let mut firsts: BTreeMap<TeamId, i32> = BTreeMap::new();
    for team in &teams {
        let first = game.teams.get(team).and_then(|t| t.initiative.first().copied()).unwrap_or(0);
        firsts.insert(*team, first);
    }
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for first in firsts.values() {
        *counts.entry(*first).or_default() += 1;
    }
    let tied: Vec<TeamId> = firsts.iter().filter(|(_, f)| counts[*f] > 1).map(|(t, _)| *t).collect();
    if !tied.is_empty() {
        let bonuses: BTreeMap<TeamId, i32> = tied.iter().map(|t| (*t, team_bonus(game, *t))).collect();
        let resolved = roll_with_ties(&mut game.rng, &tied, |t| bonuses.get(&t).copied().unwrap_or(0));
        for (team, history) in resolved {
            if let Some(entry) = game.teams.get_mut(&team) {
                let mut rolls = vec![firsts[&team]];
                rolls.extend(history);
                entry.initiative = rolls;
            }
        }
    }
    for team in teams.iter().filter(|t| !tied.contains(t)) {
        if let Some(entry) = game.teams.get_mut(team) {
            entry.initiative.truncate(1);
        }
    }
    report_initiative(game);
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testkit;
    use proptest::prelude::*;

    #[test]
    fn test_order_breaks_on_later_rolls() {
        let mut rolls = BTreeMap::new();
        rolls.insert('a', vec![7, 9]);
        rolls.insert('b', vec![7, 4]);
        rolls.insert('c', vec![5]);
        assert_eq!(order(&rolls), vec!['c', 'b', 'a']);
    }

    #[test]
    fn test_team_initiative_is_total() {
        let mut game = testkit::duel();
        roll_initiative(&mut game);
        let order = team_order(&game);
        assert_eq!(order.len(), 2);
        let red = &game.teams[&testkit::RED_TEAM].initiative;
        let blue = &game.teams[&testkit::BLUE_TEAM].initiative;
        assert_ne!(red, blue);
        // Tied teams roll again together, so both histories have equal length.
        assert_eq!(red.len(), blue.len());
        assert_eq!(game.reports.of_kind(ReportKind::Initiative).count(), 2);
    }

    #[test]
    fn test_individual_initiative_orders_units() {
        let mut game = testkit::duel();
        game.options.individual_initiative = true;
        roll_initiative(&mut game);
        let units: Vec<UnitId> = game.units.keys().copied().collect();
        let order = unit_order(&game, &units);
        assert_eq!(order.len(), 2);
        let first = &game.unit(order[0]).unwrap().initiative;
        let second = &game.unit(order[1]).unwrap().initiative;
        assert!(first < second);
    }

    #[test]
    fn test_tactical_genius_once_per_round() {
        let mut game = testkit::duel();
        roll_initiative(&mut game);
        assert!(!can_request_reroll(&game, testkit::RED_TEAM));
        if let Some(u) = game.unit_mut(testkit::RED_MECH) {
            u.crew.tactical_genius = true;
        }
        assert!(can_request_reroll(&game, testkit::RED_TEAM));
        game.reroll_requests.insert(testkit::RED_TEAM);
        assert!(apply_rerolls(&mut game));
        assert!(!can_request_reroll(&game, testkit::RED_TEAM));
        assert_ne!(game.teams[&testkit::RED_TEAM].initiative, game.teams[&testkit::BLUE_TEAM].initiative);
        assert!(!apply_rerolls(&mut game));
    }

    proptest! {
        #[test]
        fn prop_ties_always_resolve(seed in any::<u64>(), count in 2usize..8) {
            let mut rng = DeterministicRng::new(seed);
            let entrants: Vec<u32> = (0..count as u32).collect();
            let rolls = roll_with_ties(&mut rng, &entrants, |_| 0);
            let mut histories: Vec<&Vec<i32>> = rolls.values().collect();
            histories.sort();
            histories.dedup();
            prop_assert_eq!(histories.len(), count);
        }
    }
}
