//! Shared test fixtures.

use crate::core::hex::{Facing, HexCoord};
use crate::game::board::Board;
use crate::game::options::GameOptions;
use crate::game::state::{Match, Player, PlayerId, TeamId};
use crate::game::unit::{mech_loc, EquipmentId, EquipmentKind, Mounted, Unit, UnitId, WeaponSpec};

pub const RED: PlayerId = PlayerId(1);
pub const BLUE: PlayerId = PlayerId(2);
pub const RED_TEAM: TeamId = TeamId(1);
pub const BLUE_TEAM: TeamId = TeamId(2);
pub const RED_MECH: UnitId = UnitId(1);
pub const BLUE_MECH: UnitId = UnitId(2);
/// First equipment slot on both duel mechs.
pub const MEDIUM_LASER: EquipmentId = EquipmentId(0);

pub const SEED: u64 = 0x5eed_2024;

fn duelist(id: UnitId, name: &str, owner: PlayerId, col: i32) -> Unit {
    let mut unit = Unit::mech(id, name, owner, 50, 4, 0);
    unit.add_equipment(Mounted::new("Medium Laser", mech_loc::RT, EquipmentKind::Weapon(WeaponSpec::energy(5, 3))));
    unit.position = Some(HexCoord::from_offset(col, 8));
    unit.facing = Facing::N;
    unit.status.deployed = true;
    unit
}

/// Two 50-ton walkers seven hexes apart on an open 16x17 board, round 1.
pub fn duel() -> Match {
    let mut game = Match::new([7; 16], SEED, GameOptions::default(), Board::new(16, 17));
    game.add_player(Player::new(RED, "Red", RED_TEAM));
    game.add_player(Player::new(BLUE, "Blue", BLUE_TEAM));
    game.add_unit(duelist(RED_MECH, "Red Hunchback", RED, 3));
    game.add_unit(duelist(BLUE_MECH, "Blue Centurion", BLUE, 10));
    game.round = 1;
    game
}
