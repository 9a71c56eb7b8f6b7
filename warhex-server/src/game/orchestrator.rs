//! Phase/Turn Orchestrator
//!
//! The top-level state machine. Every player intent enters here, is checked
//! against the current phase and turn, is handed to the movement or combat
//! resolver, and then advances the turn queue or the phase.
//!
//! The orchestrator is not reentrant: callers serialize intents from all
//! connections into one stream (see `network::host`).

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::hash::StateHash;
use crate::core::hex::HexCoord;
use crate::game::combat::artillery;
use crate::game::combat::attack::{AttackAction, AttackKind, AttackTarget, PhysicalKind};
use crate::game::combat::{CombatResolver, StandardCombat};
use crate::game::deploy;
use crate::game::end_phase;
use crate::game::events::ReportKind;
use crate::game::initiative;
use crate::game::input::{Intent, IntentLog, LoggedAction};
use crate::game::movement::{self, MovementResolver, StandardMovement};
use crate::game::phase::{next_phase, Phase};
use crate::game::psr;
use crate::game::scheduler::{self, StandardScheduler, TurnScheduler};
use crate::game::state::{Match, PlayerId};
use crate::game::turn::{Turn, TurnQueue};
use crate::game::unit::{EquipmentId, UnitId};

// =============================================================================
// ERRORS
// =============================================================================

/// Why an intent was refused. A refused intent changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// Someone else holds the current turn
    #[error("player {0} does not hold the current turn")]
    NotYourTurn(u32),
    /// The intent does not belong in the current phase
    #[error("{intent} is not allowed in the {phase} phase")]
    WrongPhase {
        /// Intent name
        intent: &'static str,
        /// Current phase
        phase: Phase,
    },
    /// No such unit
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),
    /// The unit belongs to another player
    #[error("unit {0} is not yours")]
    UnitNotControlled(UnitId),
    /// The unit cannot act with the current turn
    #[error("unit {0} cannot act now")]
    UnitNotEligible(UnitId),
    /// The phase has no turn waiting
    #[error("no turn is pending")]
    NoTurnPending,
    /// No such player, or an observer
    #[error("unknown player {0}")]
    UnknownPlayer(u32),
    /// The current turn can still be played
    #[error("the current turn is not skippable")]
    NotSkippable,
    /// The request itself is malformed
    #[error("invalid request: {0}")]
    Invalid(String),
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Owns a match and drives it through its phases.
pub struct Orchestrator {
    game: Match,
    movement: Box<dyn MovementResolver>,
    combat: Box<dyn CombatResolver>,
    scheduler: Box<dyn TurnScheduler>,
    log: IntentLog,
}

impl Orchestrator {
    /// Orchestrator with the standard rules.
    pub fn new(game: Match) -> Self {
        Self::with_resolvers(
            game,
            Box::new(StandardMovement),
            Box::new(StandardCombat),
            Box::new(StandardScheduler),
        )
    }

    /// Orchestrator with injected resolvers.
    pub fn with_resolvers(
        game: Match,
        movement: Box<dyn MovementResolver>,
        combat: Box<dyn CombatResolver>,
        scheduler: Box<dyn TurnScheduler>,
    ) -> Self {
        Self { game, movement, combat, scheduler, log: IntentLog::new() }
    }

    /// The match.
    pub fn game(&self) -> &Match {
        &self.game
    }

    /// Mutable access for setup (players, units, board) before play.
    pub fn game_mut(&mut self) -> &mut Match {
        &mut self.game
    }

    /// Accepted actions so far.
    pub fn log(&self) -> &IntentLog {
        &self.log
    }

    /// Give up the match.
    pub fn into_game(self) -> Match {
        self.game
    }

    /// Current state hash.
    pub fn state_hash(&self) -> StateHash {
        self.game.compute_hash()
    }

    // -------------------------------------------------------------------------
    // Connections
    // -------------------------------------------------------------------------

    /// Mark a player connected or disconnected.
    ///
    /// A disconnected player becomes a ghost: their turns turn skippable and
    /// they no longer count towards readiness.
    pub fn set_connected(&mut self, player: PlayerId, connected: bool) -> Result<(), IntentError> {
        let Some(p) = self.game.players.get_mut(&player) else {
            return Err(IntentError::UnknownPlayer(player.0));
        };
        p.ghost = !connected;
        info!(player = player.0, connected, "connection changed");
        if self.game.phase.has_turns() {
            scheduler::announce_turn(&mut self.game);
        } else if !connected {
            self.check_ready();
        }
        let hash = self.game.compute_hash();
        self.log.record(player, LoggedAction::Connection(connected), hash);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Intents
    // -------------------------------------------------------------------------

    /// Validate and apply one intent from `player`.
    pub fn submit_intent(&mut self, player: PlayerId, intent: Intent) -> Result<(), IntentError> {
        let result = self.apply(player, &intent);
        match &result {
            Ok(()) => {
                debug!(player = player.0, intent = intent.name(), phase = %self.game.phase, "intent applied");
                let hash = self.game.compute_hash();
                #[cfg(feature = "debug-tracing")]
                tracing::trace!(seq = self.log.len(), hash = %hex::encode(hash), "state after intent");
                self.log.record(player, LoggedAction::Intent(intent), hash);
            }
            Err(e) => {
                warn!(player = player.0, intent = intent.name(), phase = %self.game.phase, error = %e, "intent refused");
            }
        }
        result
    }

    fn apply(&mut self, player: PlayerId, intent: &Intent) -> Result<(), IntentError> {
        let known = self.game.players.get(&player).map(|p| !p.observer).unwrap_or(false);
        if !known {
            return Err(IntentError::UnknownPlayer(player.0));
        }
        match intent {
            Intent::PlayerReady(ready) => self.player_ready(player, *ready),
            Intent::RerollInitiative => self.request_reroll(player),
            Intent::SkipTurn => self.skip_turn(player),
            _ => self.take_turn(player, intent),
        }
    }

    fn player_ready(&mut self, player: PlayerId, ready: bool) -> Result<(), IntentError> {
        if !self.game.phase.is_ready_gated() {
            return Err(IntentError::WrongPhase { intent: "player_ready", phase: self.game.phase });
        }
        if let Some(p) = self.game.players.get_mut(&player) {
            p.done = ready;
        }
        if ready {
            self.check_ready();
        }
        Ok(())
    }

    fn request_reroll(&mut self, player: PlayerId) -> Result<(), IntentError> {
        if self.game.phase != Phase::InitiativeReport {
            return Err(IntentError::WrongPhase { intent: "reroll_initiative", phase: self.game.phase });
        }
        let team = self.game.team_of(player).ok_or(IntentError::UnknownPlayer(player.0))?;
        if !initiative::can_request_reroll(&self.game, team) {
            return Err(IntentError::Invalid("no tactical genius reroll available".into()));
        }
        if self.game.reroll_requests.insert(team) {
            self.game.report(ReportKind::Initiative, None, format!("Team {} asks to re-roll initiative", team.0));
        }
        Ok(())
    }

    /// Any player may skip a turn whose holder is gone or has nothing to act with.
    fn skip_turn(&mut self, player: PlayerId) -> Result<(), IntentError> {
        if !self.game.phase.has_turns() {
            return Err(IntentError::WrongPhase { intent: "skip_turn", phase: self.game.phase });
        }
        let Some(turn) = self.game.turns.current().cloned() else {
            return Err(IntentError::NoTurnPending);
        };
        if scheduler::current_turn_playable(&self.game) {
            return Err(IntentError::NotSkippable);
        }
        info!(by = player.0, turn = %turn.describe(), "turn skipped");
        self.game.report(ReportKind::Turn, None, format!("The turn of {} is skipped", turn.describe()));
        self.game.turns.pop();
        self.advance_turn();
        Ok(())
    }

    fn take_turn(&mut self, player: PlayerId, intent: &Intent) -> Result<(), IntentError> {
        let phase = self.game.phase;
        if !intent_fits_phase(intent, phase) {
            return Err(IntentError::WrongPhase { intent: intent.name(), phase });
        }
        let turn = self.game.turns.current().cloned().ok_or(IntentError::NoTurnPending)?;
        if turn.player() != player {
            return Err(IntentError::NotYourTurn(player.0));
        }
        if let Some(id) = intent.unit() {
            let unit = self.game.unit(id).ok_or(IntentError::UnknownUnit(id))?;
            if unit.owner != player {
                return Err(IntentError::UnitNotControlled(id));
            }
            if !turn.allows(unit) || !self.game.is_eligible(id, phase) {
                return Err(IntentError::UnitNotEligible(id));
            }
        }

        let mut resume = false;
        match intent {
            Intent::Move { unit, path } => {
                let outcome = self.movement.resolve_move(&mut self.game, *unit, path);
                resume = outcome.continue_turn;
            }
            Intent::Attack { unit, actions } => self.declare_attacks(*unit, actions)?,
            Intent::Deploy { unit, coords, facing, loaded, assault_drop } => {
                deploy::deploy_unit(&mut self.game, player, *unit, *coords, *facing, loaded, *assault_drop)
                    .map_err(IntentError::Invalid)?;
            }
            Intent::DeployMinefields { minefields } => {
                deploy::deploy_minefields(&mut self.game, player, minefields).map_err(IntentError::Invalid)?;
            }
            Intent::SetArtilleryAutoHitHexes { hexes } => {
                deploy::set_artillery_autohit(&mut self.game, player, hexes).map_err(IntentError::Invalid)?;
            }
            Intent::UnloadStranded { units } => {
                let Turn::UnloadStranded { units: stranded, .. } = &turn else {
                    return Err(IntentError::Invalid("the current turn is not for stranded units".into()));
                };
                if let Some(bad) = units.iter().find(|u| !stranded.contains(u)) {
                    return Err(IntentError::UnitNotEligible(*bad));
                }
                movement::unload_stranded(&mut self.game, units);
            }
            Intent::PlayerReady(_) | Intent::RerollInitiative | Intent::SkipTurn => {}
        }
        self.end_turn(intent.unit(), turn, resume);
        Ok(())
    }

    /// Queue a unit's declared attacks for end-of-phase resolution.
    ///
    /// Malformed declarations are refused outright. Declarations the rules
    /// forbid are reported and dropped, and the unit's turn is still spent.
    fn declare_attacks(&mut self, unit: UnitId, actions: &[AttackAction]) -> Result<(), IntentError> {
        if actions.iter().any(|a| a.attacker != unit) {
            return Err(IntentError::Invalid("attack declared for another unit".into()));
        }
        let phase = self.game.phase;
        let name = self.game.unit(unit).map(|u| u.name.clone()).unwrap_or_default();
        let mut accepted = 0;
        for action in actions {
            match (phase, action.kind) {
                (Phase::Firing, AttackKind::Weapon { .. } | AttackKind::Swarm) => {
                    self.game.pending_attacks.push(action.clone());
                    accepted += 1;
                }
                (Phase::Physical, AttackKind::Physical(kind))
                    if !matches!(kind, PhysicalKind::Charge | PhysicalKind::Dfa) =>
                {
                    self.game.pending_physicals.push(action.clone());
                    accepted += 1;
                }
                (Phase::Offboard, AttackKind::Weapon { weapon, ammo, .. }) => {
                    if self.declare_strike(action, weapon, ammo) {
                        accepted += 1;
                    }
                }
                _ => {
                    self.game.report(
                        ReportKind::Error,
                        Some(unit),
                        format!("{} cannot make that attack in the {} phase", name, phase),
                    );
                }
            }
        }
        if let Some(u) = self.game.unit_mut(unit) {
            u.status.done = true;
        }
        self.game.report(ReportKind::Attack, Some(unit), format!("{} declares {} attack(s)", name, accepted));
        Ok(())
    }

    fn declare_strike(
        &mut self,
        action: &AttackAction,
        weapon: EquipmentId,
        ammo: Option<EquipmentId>,
    ) -> bool {
        let Some(unit) = self.game.unit(action.attacker) else { return false };
        let is_artillery = unit.equipment(weapon).and_then(|m| m.weapon()).map(|w| w.artillery).unwrap_or(false);
        let munition = ammo.and_then(|a| unit.equipment(a)).and_then(|m| m.ammo()).map(|b| b.munition).unwrap_or_default();
        let target: Option<HexCoord> = match action.target {
            AttackTarget::Hex(coords) | AttackTarget::Building(_, coords) => Some(coords),
            AttackTarget::Unit(id) => self.game.unit(id).and_then(|t| t.position),
        };
        match target {
            Some(coords) if is_artillery => {
                artillery::declare_strike(&mut self.game, action.attacker, weapon, coords, action.to_hit, munition).is_some()
            }
            _ => {
                self.game.report(ReportKind::Error, Some(action.attacker), "only artillery may fire in the Offboard phase");
                false
            }
        }
    }

    // -------------------------------------------------------------------------
    // Turn flow
    // -------------------------------------------------------------------------

    /// Retire the turn just played and hand out the next one.
    fn end_turn(&mut self, acted: Option<UnitId>, turn: Turn, resume: bool) {
        self.game.turns.pop();
        if let Some(unit) = acted {
            let extra = if resume {
                debug!(unit = unit.0, "unit fell and may continue moving");
                vec![Turn::SpecificUnit { player: turn.player(), unit, resumed: true }]
            } else {
                self.scheduler.follow_up_turns(&self.game, unit, &turn)
            };
            self.game.turns.insert_next(extra);
        }
        self.advance_turn();
    }

    fn advance_turn(&mut self) {
        if self.game.turns.is_empty() {
            self.end_current_phase();
        } else {
            scheduler::announce_turn(&mut self.game);
        }
    }

    // -------------------------------------------------------------------------
    // Phase flow
    // -------------------------------------------------------------------------

    /// Leave the current phase, and keep going through phases that have
    /// nothing to wait for.
    pub fn end_current_phase(&mut self) {
        loop {
            self.finish_phase();
            let next = next_phase(self.game.phase, &self.game.phase_context());
            self.enter_phase(next);
            if !self.auto_advances() {
                break;
            }
        }
    }

    /// Resolution owed when a phase closes.
    fn finish_phase(&mut self) {
        match self.game.phase {
            Phase::Movement => {
                psr::drain_psrs(&mut self.game, None);
            }
            Phase::Offboard => self.combat.resolve_artillery(&mut self.game),
            Phase::Firing => self.combat.resolve_weapon_attacks(&mut self.game),
            Phase::Physical => self.combat.resolve_physical_attacks(&mut self.game),
            _ => {}
        }
        self.game.turns.clear();
    }

    fn enter_phase(&mut self, phase: Phase) {
        let from = self.game.phase;
        self.game.phase = phase;
        match phase {
            Phase::Lobby if from == Phase::Victory => self.game.reset_for_new_game(),
            Phase::Initiative => {
                self.game.round += 1;
                for unit in self.game.units.values_mut() {
                    unit.new_round();
                }
            }
            _ => {}
        }
        info!(round = self.game.round, %from, to = %phase, "phase change");
        self.game.report(ReportKind::Phase, None, format!("Round {}: {} phase", self.game.round, phase));
        self.prepare_for_phase(phase);
        match phase {
            Phase::Initiative => initiative::roll_initiative(&mut self.game),
            Phase::End => end_phase::resolve_end_phase(&mut self.game, self.combat.as_ref()),
            _ => {}
        }
        if phase.has_turns() && !self.game.turns.is_empty() {
            scheduler::announce_turn(&mut self.game);
        }
    }

    /// Per-phase setup. Running it twice in a row yields the same state.
    pub fn prepare_for_phase(&mut self, phase: Phase) {
        for player in self.game.players.values_mut() {
            player.done = false;
        }
        for unit in self.game.units.values_mut() {
            unit.status.done = false;
            unit.damage_this_phase = 0;
        }
        self.game.board.snapshot_building_cf();
        let turns = self.scheduler.build_turns(&self.game, phase);
        self.game.turns = TurnQueue::from_turns(turns);
    }

    /// True when `phase` has something for players to do.
    pub fn is_phase_playable(&self, phase: Phase) -> bool {
        if phase.is_automatic() {
            return false;
        }
        !phase.has_turns() || !self.game.turns.is_empty()
    }

    fn auto_advances(&self) -> bool {
        let phase = self.game.phase;
        if phase.is_automatic() || !self.is_phase_playable(phase) {
            debug!(%phase, "nothing to do, advancing");
            return true;
        }
        false
    }

    /// Leave a ready-gated phase once every connected player is done.
    ///
    /// A pending tactical genius request re-rolls initiative first; the
    /// players then have to confirm again.
    pub fn check_ready(&mut self) {
        if !self.game.phase.is_ready_gated() {
            return;
        }
        let (any_active, all_done) = {
            let mut active = self.game.active_players().peekable();
            (active.peek().is_some(), active.all(|p| p.done))
        };
        if !any_active || !all_done {
            return;
        }
        if self.game.phase == Phase::InitiativeReport && initiative::apply_rerolls(&mut self.game) {
            for player in self.game.players.values_mut() {
                player.done = false;
            }
            return;
        }
        self.end_current_phase();
    }
}

/// Phases each turn-bound intent belongs to.
fn intent_fits_phase(intent: &Intent, phase: Phase) -> bool {
    match intent {
        Intent::Move { .. } | Intent::UnloadStranded { .. } => phase == Phase::Movement,
        Intent::Attack { .. } => matches!(phase, Phase::Offboard | Phase::Firing | Phase::Physical),
        Intent::Deploy { .. } => phase == Phase::Deployment,
        Intent::DeployMinefields { .. } => phase == Phase::DeployMinefields,
        Intent::SetArtilleryAutoHitHexes { .. } => phase == Phase::SetArtilleryAutoHitHexes,
        Intent::PlayerReady(_) | Intent::RerollInitiative | Intent::SkipTurn => true,
    }
}

// =============================================================================
// TESTS
// =============================================================================
