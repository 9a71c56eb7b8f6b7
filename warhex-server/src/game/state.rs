//! Match State
//!
//! The root aggregate every resolver works on. All collections are
//! `BTreeMap`s so iteration, hashing and serialization are deterministic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Deserialize};

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::hex::HexCoord;
use crate::core::rng::DeterministicRng;
use crate::game::board::{Board, MinefieldAllotment};
use crate::game::combat::artillery::ArtilleryStrike;
use crate::game::combat::attack::{AttackAction, AttackKind, PhysicalKind};
use crate::game::events::{Report, ReportKind, ReportLog};
use crate::game::options::GameOptions;
use crate::game::phase::{Phase, PhaseContext};
use crate::game::psr::PsrRequest;
use crate::game::turn::TurnQueue;
use crate::game::unit::{CanSwarm, Unit, UnitId, UnitKind};

// =============================================================================
// PLAYERS AND TEAMS
// =============================================================================

/// Player identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct PlayerId(pub u32);

/// Team identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct TeamId(pub u32);

/// A participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identifier
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Team
    pub team: TeamId,
    /// Watches without playing
    pub observer: bool,
    /// Disconnected
    pub ghost: bool,
    /// Declared ready in the current phase
    pub done: bool,
    /// Minefields left to lay
    pub minefields: MinefieldAllotment,
    /// Hexes pre-designated for artillery
    pub artillery_autohit: Vec<HexCoord>,
    /// Added to every initiative roll
    pub initiative_bonus: i32,
}

impl Player {
    /// A connected player on `team`.
    pub fn new(id: PlayerId, name: &str, team: TeamId) -> Self {
        Self {
            id,
            name: name.to_string(),
            team,
            observer: false,
            ghost: false,
            done: false,
            minefields: MinefieldAllotment::default(),
            artillery_autohit: Vec::new(),
            initiative_bonus: 0,
        }
    }

    /// Counts towards phase readiness.
    pub fn is_active(&self) -> bool {
        !self.observer && !self.ghost
    }
}

/// A side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Identifier
    pub id: TeamId,
    /// Initiative rolls this round (first roll, then tie-break rerolls)
    pub initiative: Vec<i32>,
    /// Round in which the team last used a tactical-genius reroll
    pub reroll_round: Option<u32>,
}

/// How the game ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victory {
    /// Winning team; `None` for a draw
    pub winner: Option<TeamId>,
    /// Round the game ended in
    pub round: u32,
    /// Why the game ended
    pub reason: String,
}

// =============================================================================
// MATCH
// =============================================================================

/// Complete authoritative state of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Match identifier
    pub match_id: [u8; 16],
    /// Current round (0 before the first initiative)
    pub round: u32,
    /// Current phase
    pub phase: Phase,
    /// Seed the RNG was created from
    pub rng_seed: u64,
    /// The single dice source
    pub rng: DeterministicRng,
    /// Rule options
    pub options: GameOptions,
    /// Board
    pub board: Board,
    /// Units in play
    pub units: BTreeMap<UnitId, Unit>,
    /// Units removed from play
    pub graveyard: BTreeMap<UnitId, Unit>,
    /// Players
    pub players: BTreeMap<PlayerId, Player>,
    /// Teams
    pub teams: BTreeMap<TeamId, Team>,
    /// Turn queue for the current phase
    pub turns: TurnQueue,
    /// Report log
    pub reports: ReportLog,
    /// Piloting rolls waiting to be resolved
    pub pending_psrs: Vec<PsrRequest>,
    /// Weapon attacks declared this phase
    pub pending_attacks: Vec<AttackAction>,
    /// Physical attacks declared this round (charges and DFAs from movement)
    pub pending_physicals: Vec<AttackAction>,
    /// Artillery strikes in flight
    pub pending_artillery: Vec<ArtilleryStrike>,
    /// Illuminated hexes and rounds left
    #[serde(with = "crate::core::hex::coord_map")]
    pub flares: BTreeMap<HexCoord, u8>,
    /// Teams asking for an initiative reroll
    pub reroll_requests: BTreeSet<TeamId>,
    /// Outcome, once decided
    pub victory: Option<Victory>,
    /// Next artillery strike id
    pub next_strike_id: u32,
}

impl Match {
    /// A fresh match in the lobby.
    pub fn new(match_id: [u8; 16], rng_seed: u64, options: GameOptions, board: Board) -> Self {
        Self {
            match_id,
            round: 0,
            phase: Phase::Lobby,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            options,
            board,
            units: BTreeMap::new(),
            graveyard: BTreeMap::new(),
            players: BTreeMap::new(),
            teams: BTreeMap::new(),
            turns: TurnQueue::default(),
            reports: ReportLog::new(),
            pending_psrs: Vec::new(),
            pending_attacks: Vec::new(),
            pending_physicals: Vec::new(),
            pending_artillery: Vec::new(),
            flares: BTreeMap::new(),
            reroll_requests: BTreeSet::new(),
            victory: None,
            next_strike_id: 1,
        }
    }

    /// Match id as hex, for logs.
    pub fn match_id_hex(&self) -> String {
        hex::encode(self.match_id)
    }

    // -------------------------------------------------------------------------
    // Membership
    // -------------------------------------------------------------------------

    /// Add a player, creating the team if needed.
    pub fn add_player(&mut self, player: Player) {
        let team = player.team;
        self.teams.entry(team).or_insert_with(|| Team { id: team, ..Default::default() });
        self.players.insert(player.id, player);
    }

    /// Add a unit.
    pub fn add_unit(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Unit in play.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Mutable unit in play.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Team of a player.
    pub fn team_of(&self, player: PlayerId) -> Option<TeamId> {
        self.players.get(&player).map(|p| p.team)
    }

    /// Team of a unit's owner.
    pub fn unit_team(&self, id: UnitId) -> Option<TeamId> {
        self.units
            .get(&id)
            .or_else(|| self.graveyard.get(&id))
            .and_then(|u| self.team_of(u.owner))
    }

    /// True when the two units are on different teams.
    pub fn are_enemies(&self, a: UnitId, b: UnitId) -> bool {
        match (self.unit_team(a), self.unit_team(b)) {
            (Some(x), Some(y)) => x != y,
            _ => false,
        }
    }

    /// Players who count towards readiness.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.is_active())
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    /// Append a report stamped with the current round and phase.
    pub fn report(&mut self, kind: ReportKind, subject: Option<UnitId>, text: impl Into<String>) {
        let report = Report {
            seq: 0,
            round: self.round,
            phase: self.phase,
            kind,
            subject,
            team_only: None,
            text: text.into(),
        };
        self.reports.push(report);
    }

    /// Append a report only one team may read.
    pub fn report_to_team(&mut self, kind: ReportKind, team: TeamId, text: impl Into<String>) {
        let report = Report {
            seq: 0,
            round: self.round,
            phase: self.phase,
            kind,
            subject: None,
            team_only: Some(team),
            text: text.into(),
        };
        self.reports.push(report);
    }

    // -------------------------------------------------------------------------
    // Board queries
    // -------------------------------------------------------------------------

    /// Units standing in `coord`, in id order.
    pub fn units_at(&self, coord: HexCoord) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.is_on_board() && u.position == Some(coord))
            .map(|u| u.id)
            .collect()
    }

    /// True when `unit` may end up in `coord` without breaking stacking.
    pub fn can_stack(&self, unit: &Unit, coord: HexCoord) -> bool {
        let mut infantry = 0;
        let mut others = 0;
        for id in self.units_at(coord) {
            if id == unit.id {
                continue;
            }
            let Some(other) = self.units.get(&id) else { continue };
            if self.are_enemies(unit.id, id) && !(unit.kind.is_infantry() || other.kind.is_infantry()) {
                return false;
            }
            if other.kind.is_infantry() {
                infantry += 1;
            } else {
                others += 1;
            }
        }
        if unit.kind.is_infantry() {
            infantry < self.options.max_infantry_per_hex as usize
        } else {
            others < self.options.max_units_per_hex as usize
        }
    }

    /// True when some enemy of `unit` is on the board.
    pub fn has_enemy_on_board(&self, unit: UnitId) -> bool {
        self.units.values().any(|u| u.is_on_board() && self.are_enemies(unit, u.id))
    }

    /// Enemy units within `range` hexes of `unit`.
    pub fn enemies_within(&self, unit: UnitId, range: u32) -> Vec<UnitId> {
        let Some(pos) = self.units.get(&unit).and_then(|u| u.position) else {
            return Vec::new();
        };
        self.units
            .values()
            .filter(|u| u.is_on_board() && self.are_enemies(unit, u.id))
            .filter(|u| u.position.map(|p| p.distance(&pos) <= range).unwrap_or(false))
            .map(|u| u.id)
            .collect()
    }

    /// Units on the board owned by a team.
    pub fn team_units(&self, team: TeamId) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.is_alive() && self.team_of(u.owner) == Some(team))
            .map(|u| u.id)
            .collect()
    }

    // -------------------------------------------------------------------------
    // Eligibility
    // -------------------------------------------------------------------------

    /// True when `id` may still act in `phase`.
    pub fn is_eligible(&self, id: UnitId, phase: Phase) -> bool {
        let Some(unit) = self.units.get(&id) else { return false };
        if !unit.is_alive() || unit.status.done {
            return false;
        }
        let can_act = unit.crew.is_active() && !unit.status.shutdown;
        match phase {
            Phase::Deployment => {
                !unit.status.deployed && unit.transport.carried_by.is_none() && unit.deploy_round <= self.round
            }
            Phase::Movement => unit.is_on_board() && !unit.is_immobile(),
            Phase::Firing => {
                unit.is_on_board()
                    && can_act
                    && (!unit.usable_weapons().is_empty() || unit.kind.can_swarm())
                    && self.has_enemy_on_board(id)
            }
            Phase::Physical => {
                let charged = self.pending_physicals.iter().any(|a| {
                    a.attacker == id
                        && matches!(a.kind, AttackKind::Physical(PhysicalKind::Charge | PhysicalKind::Dfa))
                });
                unit.is_on_board()
                    && can_act
                    && !charged
                    && matches!(unit.kind, UnitKind::Mech(_) | UnitKind::ProtoMech(_))
                    && (unit.swarmed_by.is_some() || !self.enemies_within(id, 1).is_empty())
            }
            Phase::Offboard => {
                unit.is_on_board()
                    && can_act
                    && unit
                        .usable_weapons()
                        .iter()
                        .any(|w| unit.equipment(*w).and_then(|m| m.weapon()).map(|s| s.artillery).unwrap_or(false))
            }
            _ => false,
        }
    }

    /// Units eligible for `phase`, in id order.
    pub fn eligible_units(&self, phase: Phase) -> Vec<UnitId> {
        self.units.keys().copied().filter(|id| self.is_eligible(*id, phase)).collect()
    }

    /// Facts consulted by the phase transition table.
    pub fn phase_context(&self) -> PhaseContext {
        let artillery_units = self.units.values().any(|u| {
            u.is_on_board()
                && u.usable_weapons()
                    .iter()
                    .any(|w| u.equipment(*w).and_then(|m| m.weapon()).map(|s| s.artillery).unwrap_or(false))
        });
        PhaseContext {
            minefields_in_play: self.players.values().any(|p| !p.observer && p.minefields.any()),
            artillery_in_play: artillery_units || !self.pending_artillery.is_empty(),
            deployment_pending: self.units.values().any(|u| {
                u.is_alive() && !u.status.deployed && u.transport.carried_by.is_none() && u.deploy_round <= self.round
            }),
            victory: self.victory.is_some(),
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Mark a unit destroyed. Returns false if it already was.
    pub fn destroy_unit(&mut self, id: UnitId, reason: &str) -> bool {
        let Some(unit) = self.units.get_mut(&id) else { return false };
        if unit.status.destroyed {
            return false;
        }
        unit.status.destroyed = true;
        let name = unit.name.clone();
        self.report(ReportKind::Destroyed, Some(id), format!("{} is destroyed ({})", name, reason));
        true
    }

    /// Move destroyed units out of play.
    pub fn remove_destroyed(&mut self) -> Vec<UnitId> {
        let dead: Vec<UnitId> = self.units.values().filter(|u| u.status.destroyed).map(|u| u.id).collect();
        for id in &dead {
            if let Some(mut unit) = self.units.remove(id) {
                unit.position = None;
                self.graveyard.insert(*id, unit);
            }
        }
        dead
    }

    /// Repair back-references after restoring from a snapshot.
    ///
    /// Every player starts as a ghost until the transport reconnects them.
    /// Transport and swarm links are rebuilt from the passenger side.
    pub fn relink(&mut self) {
        for player in self.players.values_mut() {
            player.ghost = true;
        }
        for team in self.players.values().map(|p| p.team).collect::<Vec<_>>() {
            self.teams.entry(team).or_insert_with(|| Team { id: team, ..Default::default() });
        }

        let ids: BTreeSet<UnitId> = self.units.keys().copied().collect();
        let mut carrying: BTreeMap<UnitId, Vec<UnitId>> = BTreeMap::new();
        let mut swarmed: BTreeMap<UnitId, UnitId> = BTreeMap::new();
        for unit in self.units.values_mut() {
            if let Some(carrier) = unit.transport.carried_by {
                if ids.contains(&carrier) {
                    carrying.entry(carrier).or_default().push(unit.id);
                } else {
                    unit.transport.carried_by = None;
                }
            }
            if let Some(target) = unit.swarming {
                if ids.contains(&target) {
                    swarmed.insert(target, unit.id);
                } else {
                    unit.swarming = None;
                }
            }
        }
        for unit in self.units.values_mut() {
            unit.transport.carrying = carrying.remove(&unit.id).unwrap_or_default();
            unit.swarmed_by = swarmed.get(&unit.id).copied();
        }
    }

    /// Clear the previous game so a new one can be set up.
    pub fn reset_for_new_game(&mut self) {
        self.round = 0;
        self.units.clear();
        self.graveyard.clear();
        self.turns.clear();
        self.pending_psrs.clear();
        self.pending_attacks.clear();
        self.pending_physicals.clear();
        self.pending_artillery.clear();
        self.flares.clear();
        self.reroll_requests.clear();
        self.victory = None;
        for team in self.teams.values_mut() {
            team.initiative.clear();
            team.reroll_round = None;
        }
        for player in self.players.values_mut() {
            player.done = false;
            player.artillery_autohit.clear();
        }
    }

    // -------------------------------------------------------------------------
    // Hashing
    // -------------------------------------------------------------------------

    /// Hash of everything that affects future resolution.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.round, self.rng_seed, |hasher| {
            hasher.update_u8(self.phase as u8);
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);

            for unit in self.units.values() {
                hash_unit(hasher, unit);
            }
            for id in self.graveyard.keys() {
                hasher.update_u32(id.0);
            }

            for (coord, hex) in &self.board.hexes {
                if hex.fire.is_some() || hex.smoke > 0 || hex.rubble || hex.ice || hex.magma.is_some() {
                    hasher.update_coord(Some(*coord));
                    hasher.update_bool(hex.fire.is_some());
                    hasher.update_u8(hex.smoke);
                    hasher.update_bool(hex.rubble);
                    hasher.update_bool(hex.ice);
                    hasher.update_bool(hex.magma.is_some());
                    hasher.update_bool(hex.woods.is_some());
                }
            }
            for building in self.board.buildings.values() {
                for (coord, bh) in &building.hexes {
                    hasher.update_coord(Some(*coord));
                    hasher.update_u32(bh.cf);
                    hasher.update_bool(bh.collapsed);
                }
            }
            for fields in self.board.minefields.values() {
                for field in fields {
                    hasher.update_u32(field.id);
                    hasher.update_u32(field.density);
                }
            }

            for player in self.players.values() {
                hasher.update_u32(player.id.0);
                hasher.update_bool(player.done);
                hasher.update_bool(player.ghost);
            }
            for team in self.teams.values() {
                hasher.update_u32(team.id.0);
                for roll in &team.initiative {
                    hasher.update_i32(*roll);
                }
            }

            hasher.update_u32(self.turns.len() as u32);
            hasher.update_u32(self.pending_attacks.len() as u32);
            hasher.update_u32(self.pending_physicals.len() as u32);
            hasher.update_u32(self.pending_artillery.len() as u32);
            hasher.update_u64(self.reports.last_seq());
            hasher.update_bool(self.victory.is_some());
        })
    }
}

fn hash_unit(hasher: &mut StateHasher, unit: &Unit) {
    hasher.update_u32(unit.id.0);
    hasher.update_coord(unit.position);
    hasher.update_u8(unit.facing.index());
    hasher.update_i32(unit.elevation);
    hasher.update_u32(unit.heat);
    hasher.update_u32(unit.heat_buildup);
    hasher.update_u8(unit.crew.hits);
    hasher.update_bool(unit.crew.unconscious);
    hasher.update_bool(unit.status.prone);
    hasher.update_bool(unit.status.shutdown);
    hasher.update_bool(unit.status.destroyed);
    hasher.update_bool(unit.status.done);
    hasher.update_u8(unit.status.burning);
    for location in &unit.locations {
        hasher.update_u32(location.armor);
        hasher.update_u32(location.rear_armor.unwrap_or(0));
        hasher.update_u32(location.internal);
        hasher.update_bool(location.destroyed);
        for slot in &location.slots {
            hasher.update_bool(slot.hit);
        }
    }
    for mounted in &unit.equipment {
        hasher.update_bool(mounted.destroyed);
        hasher.update_bool(mounted.jammed);
        if let Some(ammo) = mounted.ammo() {
            hasher.update_u32(ammo.shots);
        }
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
    fn test_hash_is_deterministic() {
        let a = testkit::duel();
        let b = testkit::duel();
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_hash_sees_damage() {
        let mut game = testkit::duel();
        let before = game.compute_hash();
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.locations[0].armor -= 1;
        }
        assert_ne!(before, game.compute_hash());
    }

    #[test]
    fn test_stacking_limits() {
        let mut game = testkit::duel();
        let red = game.unit(testkit::RED_MECH).cloned().unwrap();
        let blue_pos = game.unit(testkit::BLUE_MECH).and_then(|u| u.position).unwrap();
        // Enemy walker already there.
        assert!(!game.can_stack(&red, blue_pos));
        let mut friend = Unit::mech(UnitId(50), "Friend", testkit::RED, 50, 4, 0);
        friend.status.deployed = true;
        friend.position = red.position;
        game.add_unit(friend);
        game.options.max_units_per_hex = 1;
        let third = Unit::mech(UnitId(51), "Third", testkit::RED, 50, 4, 0);
        assert!(!game.can_stack(&third, red.position.unwrap()));
    }

    #[test]
    fn test_relink_ghosts_and_repairs_links() {
        let mut game = testkit::duel();
        let mut apc = Unit::vehicle(UnitId(60), "APC", testkit::RED, 20, 5, crate::game::unit::MotiveType::Tracked, false, 10);
        apc.transport.capacity = 5;
        let mut squad = Unit::infantry(UnitId(61), "Squad", testkit::RED, 28, 1);
        squad.transport.carried_by = Some(UnitId(60));
        game.add_unit(apc);
        game.add_unit(squad);
        game.relink();
        assert!(game.players.values().all(|p| p.ghost));
        assert_eq!(game.unit(UnitId(60)).map(|u| u.transport.carrying.clone()), Some(vec![UnitId(61)]));
    }

    #[test]
    fn test_remove_destroyed_moves_to_graveyard() {
        let mut game = testkit::duel();
        assert!(game.destroy_unit(testkit::BLUE_MECH, "test"));
        assert!(!game.destroy_unit(testkit::BLUE_MECH, "again"));
        assert_eq!(game.remove_destroyed(), vec![testkit::BLUE_MECH]);
        assert!(game.unit(testkit::BLUE_MECH).is_none());
        assert!(game.graveyard.contains_key(&testkit::BLUE_MECH));
    }

    #[test]
    fn test_eligibility_by_phase() {
        let mut game = testkit::duel();
        assert!(game.is_eligible(testkit::RED_MECH, Phase::Movement));
        assert!(game.is_eligible(testkit::RED_MECH, Phase::Firing));
        // Not adjacent yet.
        assert!(!game.is_eligible(testkit::RED_MECH, Phase::Physical));
        if let Some(unit) = game.unit_mut(testkit::RED_MECH) {
            unit.status.done = true;
        }
        assert!(!game.is_eligible(testkit::RED_MECH, Phase::Movement));
    }
}
