//! Combat Resolution
//!
//! Weapon and physical attacks share one damage core: a hit becomes a set of
//! [`cascade::DamageJob`]s, and the cascade drains everything those jobs
//! cause before the next attack resolves. Attacks resolve in declaration
//! order and each one sees the results of the ones before it.

pub mod artillery;
pub mod attack;
pub mod cascade;
pub mod cluster;
pub mod critical;
pub mod damage;
pub mod heat;
pub mod hitloc;
pub mod physical;
pub mod secondary;
pub mod weapon;

use tracing::{debug, warn};

use crate::core::rng::Roll;
use crate::game::psr;
use crate::game::state::Match;

pub use attack::{AttackAction, AttackKind, AttackTarget, Limb, PhysicalKind, ToHit};

// =============================================================================
// RESOLVER INTERFACE
// =============================================================================

/// Resolves the attacks declared in a phase.
///
/// The orchestrator only talks to combat through this trait.
pub trait CombatResolver: Send + Sync {
    /// Resolve every weapon attack declared this Firing phase.
    fn resolve_weapon_attacks(&self, game: &mut Match);

    /// Resolve every physical attack (including charges and DFAs).
    fn resolve_physical_attacks(&self, game: &mut Match);

    /// Land artillery due this round.
    fn resolve_artillery(&self, game: &mut Match);

    /// Settle heat for the round.
    fn resolve_heat(&self, game: &mut Match);
}

/// The standard rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCombat;

impl CombatResolver for StandardCombat {
    fn resolve_weapon_attacks(&self, game: &mut Match) {
        let attacks = std::mem::take(&mut game.pending_attacks);
        debug!(count = attacks.len(), "resolving weapon attacks");
        for action in &attacks {
            match action.kind {
                AttackKind::Weapon { .. } => weapon::resolve_weapon_attack(game, action),
                AttackKind::Swarm => physical::resolve_swarm(game, action),
                AttackKind::Physical(_) => {
                    warn!(attacker = action.attacker.0, "physical attack in the weapon pass ignored");
                }
            }
        }
        psr::queue_damage_psrs(game);
        psr::drain_psrs(game, None);
    }

    fn resolve_physical_attacks(&self, game: &mut Match) {
        let attacks = std::mem::take(&mut game.pending_physicals);
        debug!(count = attacks.len(), "resolving physical attacks");
        for action in &attacks {
            physical::resolve_physical_attack(game, action);
        }
        psr::queue_damage_psrs(game);
        psr::drain_psrs(game, None);
    }

    fn resolve_artillery(&self, game: &mut Match) {
        artillery::resolve_artillery(game);
        psr::queue_damage_psrs(game);
        psr::drain_psrs(game, None);
    }

    fn resolve_heat(&self, game: &mut Match) {
        heat::resolve_heat(game);
    }
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Roll against a to-hit number. The dice are returned when a roll was made.
pub fn roll_attack(game: &mut Match, to_hit: ToHit) -> (bool, Option<Roll>) {
    match to_hit {
        ToHit::Value(target) => {
            let roll = game.rng.roll_2d6();
            (roll.total() >= target, Some(roll))
        }
        other => (other.is_hit(0), None),
    }
}

/// "needs 8, rolls 9 (4+5): hits" style suffix for attack reports.
pub fn describe_roll(to_hit: ToHit, roll: Option<Roll>, hit: bool) -> String {
    let verdict = if hit { "hits" } else { "misses" };
    match (to_hit, roll) {
        (ToHit::Value(target), Some(roll)) => format!("needs {}, rolls {}: {}", target, roll, verdict),
        (ToHit::Automatic, _) => "automatic hit".to_string(),
        _ => format!("cannot hit: {}", verdict),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::ReportKind;
    use crate::game::testkit;
    use crate::game::unit::EquipmentId;

    #[test]
    fn test_roll_attack_without_dice() {
        let mut game = testkit::duel();
        let before = game.rng.state();
        assert_eq!(roll_attack(&mut game, ToHit::Automatic), (true, None));
        assert_eq!(roll_attack(&mut game, ToHit::Impossible), (false, None));
        assert_eq!(game.rng.state(), before);
    }

    #[test]
    fn test_weapon_pass_drains_declarations() {
        let mut game = testkit::duel();
        game.pending_attacks.push(AttackAction::weapon(
            testkit::RED_MECH,
            testkit::BLUE_MECH,
            EquipmentId(0),
            ToHit::Automatic,
        ));
        StandardCombat.resolve_weapon_attacks(&mut game);
        assert!(game.pending_attacks.is_empty());
        assert_eq!(game.unit(testkit::BLUE_MECH).unwrap().damage_this_phase, 5);
        assert!(game.reports.of_kind(ReportKind::Attack).count() >= 1);
    }
}
