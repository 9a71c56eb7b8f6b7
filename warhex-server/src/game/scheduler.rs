//! Turn Order
//!
//! Builds the turn queue for a turn-bearing phase from initiative. Teams
//! take turns lowest initiative first, and a team with more units gets
//! proportionally more turns per pass. Classes held back by the options get
//! their own turns, spread over the owning team's normal turns.

use std::collections::BTreeMap;

use tracing::debug;

use crate::game::events::ReportKind;
use crate::game::initiative;
use crate::game::phase::Phase;
use crate::game::state::{Match, PlayerId, TeamId};
use crate::game::turn::Turn;
use crate::game::unit::{ClassSet, UnitClass, UnitId};

/// Computes turn queues.
pub trait TurnScheduler: Send + Sync {
    /// Full queue for `phase`, computed from the current match.
    fn build_turns(&self, game: &Match, phase: Phase) -> Vec<Turn>;

    /// Turns to insert right after `unit` acted with `turn`.
    fn follow_up_turns(&self, game: &Match, unit: UnitId, turn: &Turn) -> Vec<Turn>;
}

/// The standard ordering rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardScheduler;

impl TurnScheduler for StandardScheduler {
    fn build_turns(&self, game: &Match, phase: Phase) -> Vec<Turn> {
        let turns = match phase {
            Phase::SetArtilleryAutoHitHexes => player_turns(game, |p| fields_artillery(game, p)),
            Phase::DeployMinefields => player_turns(game, |p| {
                game.players.get(&p).map(|p| p.minefields.any()).unwrap_or(false)
            }),
            Phase::Deployment | Phase::Movement | Phase::Offboard | Phase::Firing | Phase::Physical => {
                let mut turns = Vec::new();
                if phase == Phase::Movement {
                    turns.extend(stranded_turns(game));
                }
                if game.options.individual_initiative {
                    turns.extend(individual_turns(game, phase));
                } else {
                    turns.extend(team_turns(game, phase));
                }
                turns
            }
            _ => Vec::new(),
        };
        debug!(%phase, turns = turns.len(), "turn queue built");
        turns
    }

    fn follow_up_turns(&self, game: &Match, unit: UnitId, turn: &Turn) -> Vec<Turn> {
        if game.phase != Phase::Movement || game.options.individual_initiative {
            return Vec::new();
        }
        if matches!(turn, Turn::UnitClass { chained: true, .. } | Turn::UnloadStranded { .. }) {
            return Vec::new();
        }
        let Some(acted) = game.unit(unit) else { return Vec::new() };
        let class = acted.class();
        let Some(cap) = game.options.multi_move_cap(class) else { return Vec::new() };
        let player = acted.owner;
        let remaining = game
            .eligible_units(Phase::Movement)
            .into_iter()
            .filter_map(|id| game.unit(id))
            .filter(|u| u.owner == player && u.class() == class && u.id != unit)
            .count();
        let extra = remaining.min(cap as usize - 1);
        (0..extra)
            .map(|_| Turn::UnitClass { player, allowed: ClassSet::only(class), chained: true })
            .collect()
    }
}

// =============================================================================
// INTERLEAVING
// =============================================================================

/// Spread `counts` over passes in `order`: each pass, every entrant takes
/// as many turns as it has multiples of the smallest remaining count.
pub fn interleave<K: Ord + Copy>(order: &[K], counts: &BTreeMap<K, usize>) -> Vec<K> {
    let mut remaining: BTreeMap<K, usize> = order.iter().map(|k| (*k, counts.get(k).copied().unwrap_or(0))).collect();
    let mut sequence = Vec::new();
    loop {
        let Some(min) = remaining.values().copied().filter(|n| *n > 0).min() else { break };
        for key in order {
            let Some(left) = remaining.get_mut(key) else { continue };
            if *left == 0 {
                continue;
            }
            let take = *left / min;
            for _ in 0..take {
                sequence.push(*key);
            }
            *left -= take;
        }
    }
    sequence
}

/// Running share of held-back turns owed after each normal turn.
///
/// Each normal turn adds `held / normal` to the counter; the counter pays
/// out whole turns rounded half up and keeps the remainder for later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FairShare {
    normal: i64,
    held: i64,
    owed: i64,
}

impl FairShare {
    /// Share for `held` turns over `normal` turns.
    pub fn new(normal: usize, held: usize) -> Self {
        Self { normal: normal as i64, held: held as i64, owed: 0 }
    }

    /// Held turns to emit after the next normal turn.
    pub fn next(&mut self) -> usize {
        if self.normal == 0 {
            return 0;
        }
        self.owed += self.held;
        let pay = ((2 * self.owed + self.normal) / (2 * self.normal)).max(0);
        self.owed -= pay * self.normal;
        pay as usize
    }
}

// =============================================================================
// QUEUE BUILDERS
// =============================================================================

fn players_by_team(game: &Match) -> BTreeMap<TeamId, Vec<PlayerId>> {
    let mut teams: BTreeMap<TeamId, Vec<PlayerId>> = BTreeMap::new();
    for player in game.players.values().filter(|p| !p.observer) {
        teams.entry(player.team).or_default().push(player.id);
    }
    teams
}

fn player_turns(game: &Match, wanted: impl Fn(PlayerId) -> bool) -> Vec<Turn> {
    let teams = players_by_team(game);
    let mut turns = Vec::new();
    for team in initiative::team_order(game) {
        for player in teams.get(&team).into_iter().flatten() {
            if wanted(*player) {
                turns.push(Turn::AnyUnit { player: *player });
            }
        }
    }
    turns
}

fn fields_artillery(game: &Match, player: PlayerId) -> bool {
    game.units.values().filter(|u| u.owner == player && u.is_alive()).any(|u| {
        u.usable_weapons()
            .iter()
            .any(|w| u.equipment(*w).and_then(|m| m.weapon()).map(|s| s.artillery).unwrap_or(false))
    })
}

/// One turn per player with passengers stuck aboard an immobile carrier.
fn stranded_turns(game: &Match) -> Vec<Turn> {
    let mut stranded: BTreeMap<PlayerId, Vec<UnitId>> = BTreeMap::new();
    for unit in game.units.values().filter(|u| u.is_alive()) {
        let Some(carrier) = unit.transport.carried_by.and_then(|c| game.unit(c)) else { continue };
        if carrier.is_alive() && carrier.is_immobile() {
            stranded.entry(unit.owner).or_default().push(unit.id);
        }
    }
    stranded.into_iter().map(|(player, units)| Turn::UnloadStranded { player, units }).collect()
}

fn individual_turns(game: &Match, phase: Phase) -> Vec<Turn> {
    let eligible = game.eligible_units(phase);
    let held = if phase == Phase::Movement { game.options.held_back_classes() } else { Vec::new() };
    let ordered = initiative::unit_order(game, &eligible);
    let (late, early): (Vec<UnitId>, Vec<UnitId>) = ordered
        .into_iter()
        .partition(|id| game.unit(*id).map(|u| held.contains(&u.class())).unwrap_or(false));
    early
        .into_iter()
        .chain(late)
        .filter_map(|id| game.unit(id))
        .map(|u| Turn::SpecificUnit { player: u.owner, unit: u.id, resumed: false })
        .collect()
}

/// Normal and held-back turns for one player.
fn player_tokens(game: &Match, player: PlayerId, eligible: &[UnitId], phase: Phase) -> (Vec<Turn>, Vec<Turn>) {
    let mut per_class: BTreeMap<UnitClass, usize> = BTreeMap::new();
    for unit in eligible.iter().filter_map(|id| game.unit(*id)).filter(|u| u.owner == player) {
        *per_class.entry(unit.class()).or_default() += 1;
    }
    let grouping = phase == Phase::Movement;
    let held_classes = if grouping { game.options.held_back_classes() } else { Vec::new() };

    // Classes with their own turns are excluded from the general turn.
    let mut normal_set = ClassSet::ALL;
    for class in UnitClass::ALL {
        if grouping && (held_classes.contains(&class) || game.options.multi_move_cap(class).is_some()) {
            normal_set = normal_set.without(class);
        }
    }

    let mut normal_count = 0;
    let mut normal = Vec::new();
    let mut held = Vec::new();
    for (class, count) in per_class {
        let cap = if grouping { game.options.multi_move_cap(class) } else { None };
        let is_held = held_classes.contains(&class);
        match cap {
            Some(cap) => {
                let turns = count.div_ceil(cap as usize);
                let turn = Turn::UnitClass { player, allowed: ClassSet::only(class), chained: false };
                let target = if is_held { &mut held } else { &mut normal };
                target.extend(std::iter::repeat(turn).take(turns));
            }
            None if is_held => {
                let turn = Turn::UnitClass { player, allowed: ClassSet::only(class), chained: false };
                held.extend(std::iter::repeat(turn).take(count));
            }
            None => normal_count += count,
        }
    }
    let general = if normal_set == ClassSet::ALL || !grouping {
        Turn::AnyUnit { player }
    } else {
        Turn::UnitClass { player, allowed: normal_set, chained: false }
    };
    let mut tokens: Vec<Turn> = std::iter::repeat(general).take(normal_count).collect();
    tokens.extend(normal);
    (tokens, held)
}

/// Mix several players' tokens into one team sequence.
fn merge_players(tokens: BTreeMap<PlayerId, Vec<Turn>>) -> Vec<Turn> {
    let order: Vec<PlayerId> = tokens.keys().copied().collect();
    let counts: BTreeMap<PlayerId, usize> = tokens.iter().map(|(p, t)| (*p, t.len())).collect();
    let mut queues: BTreeMap<PlayerId, std::vec::IntoIter<Turn>> =
        tokens.into_iter().map(|(p, t)| (p, t.into_iter())).collect();
    interleave(&order, &counts)
        .into_iter()
        .filter_map(|p| queues.get_mut(&p).and_then(|q| q.next()))
        .collect()
}

fn team_turns(game: &Match, phase: Phase) -> Vec<Turn> {
    let eligible = game.eligible_units(phase);
    let teams = players_by_team(game);
    let order = initiative::team_order(game);

    let mut normal: BTreeMap<TeamId, std::vec::IntoIter<Turn>> = BTreeMap::new();
    let mut held: BTreeMap<TeamId, std::vec::IntoIter<Turn>> = BTreeMap::new();
    let mut normal_counts: BTreeMap<TeamId, usize> = BTreeMap::new();
    let mut shares: BTreeMap<TeamId, FairShare> = BTreeMap::new();
    for team in &order {
        let mut team_normal = BTreeMap::new();
        let mut team_held = BTreeMap::new();
        for player in teams.get(team).into_iter().flatten() {
            let (n, h) = player_tokens(game, *player, &eligible, phase);
            team_normal.insert(*player, n);
            team_held.insert(*player, h);
        }
        let n = merge_players(team_normal);
        let h = merge_players(team_held);
        normal_counts.insert(*team, n.len());
        shares.insert(*team, FairShare::new(n.len(), h.len()));
        normal.insert(*team, n.into_iter());
        held.insert(*team, h.into_iter());
    }

    let mut turns = Vec::new();
    for team in interleave(&order, &normal_counts) {
        if let Some(turn) = normal.get_mut(&team).and_then(|q| q.next()) {
            turns.push(turn);
        }
        let owed = shares.get_mut(&team).map(|s| s.next()).unwrap_or(0);
        if let Some(queue) = held.get_mut(&team) {
            turns.extend(queue.by_ref().take(owed));
        }
    }
    // Held turns of teams with nothing else to do, and rounding leftovers.
    let leftovers: BTreeMap<TeamId, Vec<Turn>> = held.into_iter().map(|(t, q)| (t, q.collect())).collect();
    let counts: BTreeMap<TeamId, usize> = leftovers.iter().map(|(t, v)| (*t, v.len())).collect();
    let mut queues: BTreeMap<TeamId, std::vec::IntoIter<Turn>> =
        leftovers.into_iter().map(|(t, v)| (t, v.into_iter())).collect();
    for team in interleave(&order, &counts) {
        if let Some(turn) = queues.get_mut(&team).and_then(|q| q.next()) {
            turns.push(turn);
        }
    }
    turns
}

// =============================================================================
// SKIPPABLE TURNS
// =============================================================================

/// True when the current turn's holder is connected and has something to
/// act with. A turn that fails this check waits for a skip command.
pub fn current_turn_playable(game: &Match) -> bool {
    let Some(turn) = game.turns.current() else { return false };
    let connected = game.players.get(&turn.player()).map(|p| !p.ghost).unwrap_or(false);
    connected && turn_has_actor(game, turn)
}

fn turn_has_actor(game: &Match, turn: &Turn) -> bool {
    match turn {
        Turn::UnloadStranded { units, .. } => units
            .iter()
            .any(|id| game.unit(*id).map(|u| u.is_alive() && u.transport.carried_by.is_some()).unwrap_or(false)),
        _ if game.phase == Phase::SetArtilleryAutoHitHexes || game.phase == Phase::DeployMinefields => true,
        _ => game
            .eligible_units(game.phase)
            .into_iter()
            .filter_map(|id| game.unit(id))
            .any(|u| turn.allows(u)),
    }
}

/// Announce the current turn, flagging it when it can only be skipped.
pub fn announce_turn(game: &mut Match) {
    let Some(turn) = game.turns.current().cloned() else { return };
    if current_turn_playable(game) {
        game.report(ReportKind::Turn, None, format!("It is the turn of {}", turn.describe()));
    } else {
        game.report(
            ReportKind::TurnSkippable,
            None,
            format!("The turn of {} may be skipped: nothing can act", turn.describe()),
        );
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Player;
    use crate::game::testkit;
    use crate::game::unit::Unit;
    use proptest::prelude::*;

    #[test]
    fn test_interleave_by_ratio() {
        let mut counts = BTreeMap::new();
        counts.insert('a', 2);
        counts.insert('b', 5);
        let sequence: String = interleave(&['a', 'b'], &counts).into_iter().collect();
        assert_eq!(sequence, "abbabbb");
    }

    #[test]
    fn test_fair_share_carries_remainder() {
        let mut share = FairShare::new(3, 1);
        assert_eq!([share.next(), share.next(), share.next()], [0, 1, 0]);
        let mut share = FairShare::new(2, 3);
        assert_eq!([share.next(), share.next()], [2, 1]);
        let mut share = FairShare::new(4, 2);
        assert_eq!([share.next(), share.next(), share.next(), share.next()], [1, 0, 1, 0]);
    }

    fn add_infantry(game: &mut Match, id: u32, owner: PlayerId) {
        let mut squad = Unit::infantry(UnitId(id), "Rifles", owner, 28, 1);
        squad.position = Some(crate::core::hex::HexCoord::from_offset(id as i32, 2));
        squad.status.deployed = true;
        game.add_unit(squad);
    }

    fn rolled(mut game: Match) -> Match {
        game.phase = Phase::Movement;
        if let Some(team) = game.teams.get_mut(&testkit::RED_TEAM) {
            team.initiative = vec![4];
        }
        if let Some(team) = game.teams.get_mut(&testkit::BLUE_TEAM) {
            team.initiative = vec![9];
        }
        game
    }

    #[test]
    fn test_lower_initiative_moves_first() {
        let game = rolled(testkit::duel());
        let turns = StandardScheduler.build_turns(&game, Phase::Movement);
        assert_eq!(turns, vec![Turn::AnyUnit { player: testkit::RED }, Turn::AnyUnit { player: testkit::BLUE }]);
    }

    #[test]
    fn test_held_back_infantry_spread_over_team_turns() {
        let mut game = rolled(testkit::duel());
        game.options.infantry_move_later = true;
        add_infantry(&mut game, 10, testkit::RED);
        add_infantry(&mut game, 11, testkit::RED);
        let turns = StandardScheduler.build_turns(&game, Phase::Movement);
        let infantry_only = ClassSet::only(UnitClass::Infantry);
        let normal = ClassSet::ALL.without(UnitClass::Infantry);
        assert_eq!(
            turns,
            vec![
                Turn::UnitClass { player: testkit::RED, allowed: normal, chained: false },
                Turn::UnitClass { player: testkit::RED, allowed: infantry_only, chained: false },
                Turn::UnitClass { player: testkit::RED, allowed: infantry_only, chained: false },
                Turn::UnitClass { player: testkit::BLUE, allowed: normal, chained: false },
            ]
        );
    }

    #[test]
    fn test_multi_move_groups_infantry() {
        let mut game = rolled(testkit::duel());
        game.options.infantry_move_multi = 3;
        for id in 10..14 {
            add_infantry(&mut game, id, testkit::BLUE);
        }
        let turns = StandardScheduler.build_turns(&game, Phase::Movement);
        let infantry = turns
            .iter()
            .filter(|t| matches!(t, Turn::UnitClass { allowed, .. } if *allowed == ClassSet::only(UnitClass::Infantry)))
            .count();
        assert_eq!(infantry, 2);

        let turn = Turn::UnitClass { player: testkit::BLUE, allowed: ClassSet::only(UnitClass::Infantry), chained: false };
        let follow = StandardScheduler.follow_up_turns(&game, UnitId(10), &turn);
        assert_eq!(follow.len(), 2);
        assert!(follow.iter().all(|t| matches!(t, Turn::UnitClass { chained: true, .. })));
        assert!(StandardScheduler.follow_up_turns(&game, UnitId(11), &follow[0]).is_empty());
    }

    #[test]
    fn test_stranded_unload_turn_comes_first() {
        let mut game = rolled(testkit::duel());
        let mut apc = Unit::vehicle(
            UnitId(20),
            "Packrat",
            testkit::BLUE,
            20,
            6,
            crate::game::unit::MotiveType::Wheeled,
            false,
            10,
        );
        apc.position = Some(crate::core::hex::HexCoord::from_offset(12, 12));
        apc.status.deployed = true;
        apc.status.stuck = true;
        apc.transport.carrying.push(UnitId(21));
        game.add_unit(apc);
        let mut squad = Unit::infantry(UnitId(21), "Rifles", testkit::BLUE, 28, 1);
        squad.transport.carried_by = Some(UnitId(20));
        squad.status.deployed = true;
        game.add_unit(squad);
        let turns = StandardScheduler.build_turns(&game, Phase::Movement);
        assert_eq!(turns[0], Turn::UnloadStranded { player: testkit::BLUE, units: vec![UnitId(21)] });
        assert!(StandardScheduler.build_turns(&game, Phase::Firing).iter().all(|t| !matches!(t, Turn::UnloadStranded { .. })));
    }

    #[test]
    fn test_ghost_turn_is_skippable() {
        let mut game = rolled(testkit::duel());
        game.turns = crate::game::turn::TurnQueue::from_turns(StandardScheduler.build_turns(&game, Phase::Movement));
        assert!(current_turn_playable(&game));
        if let Some(p) = game.players.get_mut(&testkit::RED) {
            p.ghost = true;
        }
        assert!(!current_turn_playable(&game));
        announce_turn(&mut game);
        assert_eq!(game.reports.of_kind(ReportKind::TurnSkippable).count(), 1);
    }

    #[test]
    fn test_setup_turns_follow_team_order() {
        let mut game = rolled(testkit::duel());
        game.add_player(Player { observer: true, ..Player::new(PlayerId(9), "Spectator", TeamId(9)) });
        assert!(StandardScheduler.build_turns(&game, Phase::SetArtilleryAutoHitHexes).is_empty());
        for player in [testkit::RED, testkit::BLUE, PlayerId(9)] {
            if let Some(p) = game.players.get_mut(&player) {
                p.minefields.conventional = 1;
            }
        }
        let turns = StandardScheduler.build_turns(&game, Phase::DeployMinefields);
        assert_eq!(turns, vec![Turn::AnyUnit { player: testkit::RED }, Turn::AnyUnit { player: testkit::BLUE }]);
    }

    proptest! {
        #[test]
        fn prop_fair_share_pays_everything(normal in 1usize..12, held in 0usize..12) {
            let mut share = FairShare::new(normal, held);
            let paid: usize = (0..normal).map(|_| share.next()).sum();
            prop_assert_eq!(paid, held);
        }

        #[test]
        fn prop_interleave_keeps_counts(a in 0usize..9, b in 0usize..9, c in 0usize..9) {
            let counts: BTreeMap<u8, usize> = [(0u8, a), (1, b), (2, c)].into_iter().collect();
            let sequence = interleave(&[2, 0, 1], &counts);
            prop_assert_eq!(sequence.len(), a + b + c);
            prop_assert_eq!(sequence.iter().filter(|k| **k == 0).count(), a);
        }
    }
}
