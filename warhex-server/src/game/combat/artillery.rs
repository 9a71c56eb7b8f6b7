//! Artillery
//!
//! Artillery fire is aimed at hexes. A strike is declared in the Offboard
//! (or Firing) phase, flies for a number of rounds and resolves at the end
//! of the Offboard phase of the round it arrives in.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hex::{Facing, HexCoord};
use crate::game::board::MinefieldKind;
use crate::game::combat::attack::ToHit;
use crate::game::combat::cascade::{self, DamageJob};
use crate::game::combat::damage::DamageSource;
use crate::game::combat::secondary;
use crate::game::events::ReportKind;
use crate::game::state::{Match, PlayerId};
use crate::game::unit::{EquipmentId, Munition, UnitId};

/// Range in hexes covered without extra flight time.
pub const DIRECT_RANGE: u32 = 17;

/// An artillery round in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtilleryStrike {
    /// Strike id, in declaration order
    pub id: u32,
    /// Firing unit
    pub attacker: UnitId,
    /// Player who fired
    pub owner: PlayerId,
    /// Weapon fired
    pub weapon: EquipmentId,
    /// Aim point
    pub target: HexCoord,
    /// To-hit number
    pub to_hit: ToHit,
    /// Damage in the target hex
    pub damage: u32,
    /// Round the strike lands
    pub arrive_round: u32,
    /// Munition loaded
    pub munition: Munition,
}

/// Rounds a strike spends in flight over `distance` hexes.
pub fn flight_time(distance: u32) -> u32 {
    if distance <= DIRECT_RANGE {
        0
    } else {
        1
    }
}

/// Queue a strike from `attacker` at `target`.
pub fn declare_strike(
    game: &mut Match,
    attacker: UnitId,
    weapon: EquipmentId,
    target: HexCoord,
    to_hit: ToHit,
    munition: Munition,
) -> Option<u32> {
    let unit = game.unit(attacker)?;
    let damage = unit.equipment(weapon)?.weapon()?.damage;
    let owner = unit.owner;
    let distance = unit.position.map(|p| p.distance(&target)).unwrap_or(DIRECT_RANGE + 1);
    let name = unit.name.clone();
    let id = game.next_strike_id;
    game.next_strike_id += 1;
    let arrive_round = game.round + flight_time(distance);
    game.pending_artillery.push(ArtilleryStrike {
        id,
        attacker,
        owner,
        weapon,
        target,
        to_hit,
        damage,
        arrive_round,
        munition,
    });
    if let Some(team) = game.team_of(owner) {
        game.report_to_team(
            ReportKind::Artillery,
            team,
            format!("{} fires artillery at {}, arriving in round {}", name, target, arrive_round),
        );
    }
    Some(id)
}

/// Resolve every strike arriving this round, in declaration order.
pub fn resolve_artillery(game: &mut Match) {
    let round = game.round;
    let (arriving, waiting): (Vec<_>, Vec<_>) =
        std::mem::take(&mut game.pending_artillery).into_iter().partition(|s| s.arrive_round <= round);
    game.pending_artillery = waiting;
    for strike in arriving {
        resolve_strike(game, &strike);
    }
}

fn resolve_strike(game: &mut Match, strike: &ArtilleryStrike) {
    let designated = game
        .players
        .get(&strike.owner)
        .map(|p| p.artillery_autohit.contains(&strike.target))
        .unwrap_or(false);
    let hit = if designated {
        game.report(ReportKind::Artillery, None, format!("Artillery lands on pre-designated hex {}", strike.target));
        true
    } else if strike.to_hit.needs_roll() {
        let roll = game.rng.roll_2d6();
        let hit = strike.to_hit.is_hit(roll.total());
        game.report(
            ReportKind::Artillery,
            None,
            format!("Artillery at {}, needs {}, rolls {}", strike.target, strike.to_hit, roll),
        );
        hit
    } else {
        strike.to_hit.is_hit(0)
    };

    let landing = if hit {
        strike.target
    } else {
        let direction = Facing::from_index(game.rng.d6() as i32 - 1);
        let distance = game.rng.d6() as u32;
        let landing = strike.target.translated(direction, distance);
        game.report(
            ReportKind::Artillery,
            None,
            format!("Artillery misses and scatters {} hexes to {}", distance, landing),
        );
        landing
    };
    debug!(strike = strike.id, %landing, hit, "artillery landed");
    if !game.board.contains(landing) {
        game.report(ReportKind::Artillery, None, "The shell lands off the board");
        return;
    }
    land(game, strike, landing);
}

fn land(game: &mut Match, strike: &ArtilleryStrike, center: HexCoord) {
    match strike.munition {
        Munition::Smoke => {
            secondary::drop_smoke(game, center);
            for neighbor in center.neighbors() {
                secondary::drop_smoke(game, neighbor);
            }
        }
        Munition::Flare => secondary::drop_flare(game, center),
        Munition::Thunder => {
            let team = game.team_of(strike.owner).unwrap_or_default();
            let density = (strike.damage / 5 * 5).clamp(5, 30);
            game.board.add_minefield(center, MinefieldKind::Conventional, density, strike.owner, team);
            game.report(ReportKind::Minefield, None, format!("Thunder munitions seed a minefield at {}", center));
        }
        Munition::Inferno => {
            cascade::run(game, vec![DamageJob::Ignite { coords: center, modifier: 0, automatic: true }]);
            for unit in game.units_at(center) {
                if let Some(u) = game.unit_mut(unit) {
                    u.status.burning = secondary::BURN_ROUNDS;
                }
            }
        }
        _ => {
            cascade::run(
                game,
                vec![DamageJob::AreaDamage {
                    center,
                    rings: vec![strike.damage, strike.damage / 2],
                    exclude: None,
                    source: DamageSource::Artillery,
                }],
            );
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
