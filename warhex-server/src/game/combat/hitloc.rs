//! Hit location tables.

use serde::{Serialize, Deserialize};

use crate::core::hex::HexCoord;
use crate::core::rng::DeterministicRng;
use crate::game::unit::{aero_loc, mech_loc, proto_loc, vehicle_loc, Unit, UnitKind};

/// Side of the target an attack comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Front arc
    Front,
    /// Left side
    Left,
    /// Right side
    Right,
    /// Rear arc
    Rear,
}

impl Side {
    /// Side for a fall result (1d6): 1 front, 2-3 right, 4 rear, 5-6 left.
    pub fn from_fall_roll(roll: u8) -> Side {
        match roll {
            1 => Side::Front,
            2 | 3 => Side::Right,
            4 => Side::Rear,
            _ => Side::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Side::Front => "front",
            Side::Left => "left",
            Side::Right => "right",
            Side::Rear => "rear",
        })
    }
}

/// Which table to roll on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTable {
    /// Standard 2d6 table
    Standard,
    /// Punch 1d6 table (also attacks from well above)
    Punch,
    /// Kick 1d6 table (also attacks from well below)
    Kick,
}

/// Where one cluster lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitData {
    /// Location index
    pub location: usize,
    /// Strikes rear armor
    pub rear: bool,
    /// Through-armor critical chance
    pub floating_crit: bool,
    /// Vehicle motive system damage roll
    pub motive: bool,
}

impl HitData {
    /// Plain hit on `location`.
    pub fn new(location: usize) -> Self {
        Self { location, rear: false, floating_crit: false, motive: false }
    }

    fn rear(mut self, rear: bool) -> Self {
        self.rear = rear;
        self
    }

    fn crit(mut self) -> Self {
        self.floating_crit = true;
        self
    }

    fn motive(mut self) -> Self {
        self.motive = true;
        self
    }
}

/// Side of `target` facing an attack from `from`.
pub fn side_of(target: &Unit, from: HexCoord) -> Side {
    let Some(pos) = target.position else { return Side::Front };
    let Some(bearing) = pos.bearing_to(&from) else { return Side::Front };
    let twelfths = bearing.relative_to(target.facing).0;
    match target.kind {
        UnitKind::Mech(_) => match twelfths {
            9..=11 | 0..=3 => Side::Front,
            4 | 5 => Side::Right,
            6 => Side::Rear,
            _ => Side::Left,
        },
        _ => match twelfths {
            11 | 0 | 1 => Side::Front,
            2..=5 => Side::Right,
            6 => Side::Rear,
            _ => Side::Left,
        },
    }
}

/// Table forced by an elevation difference of two or more.
pub fn elevation_table(attacker_elevation: i32, target_elevation: i32) -> HitTable {
    if attacker_elevation - target_elevation >= 2 {
        HitTable::Punch
    } else if target_elevation - attacker_elevation >= 2 {
        HitTable::Kick
    } else {
        HitTable::Standard
    }
}

/// Roll a location. `None` is a near miss (protomech table only).
pub fn roll_location(rng: &mut DeterministicRng, unit: &Unit, side: Side, table: HitTable) -> Option<HitData> {
    match &unit.kind {
        UnitKind::Mech(_) => Some(match table {
            HitTable::Standard => mech_standard(rng.roll_2d6().total(), side),
            HitTable::Punch => mech_punch(rng.d6(), side),
            HitTable::Kick => mech_kick(rng.d6(), side),
        }),
        UnitKind::Vehicle(v) => Some(vehicle(rng.roll_2d6().total(), side, v.has_turret)),
        UnitKind::ProtoMech(_) => proto(rng.roll_2d6().total()),
        UnitKind::Aero(_) => Some(HitData::new(match side {
            Side::Front => aero_loc::NOSE,
            Side::Left => aero_loc::LEFT_WING,
            Side::Right => aero_loc::RIGHT_WING,
            Side::Rear => aero_loc::AFT,
        })),
        UnitKind::Infantry => Some(HitData::new(0)),
        UnitKind::BattleArmor => {
            let living: Vec<usize> = (1..unit.locations.len()).filter(|i| !unit.locations[*i].destroyed).collect();
            Some(HitData::new(rng.choose(&living).copied().unwrap_or(0)))
        }
    }
}

/// Walker standard table.
pub fn mech_standard(roll: i32, side: Side) -> HitData {
    use mech_loc::*;
    let rear = side == Side::Rear;
    match side {
        Side::Front | Side::Rear => match roll {
            2 => HitData::new(CT).rear(rear).crit(),
            3 | 4 => HitData::new(RA),
            5 => HitData::new(RL),
            6 => HitData::new(RT).rear(rear),
            7 => HitData::new(CT).rear(rear),
            8 => HitData::new(LT).rear(rear),
            9 => HitData::new(LL),
            10 | 11 => HitData::new(LA),
            _ => HitData::new(HEAD),
        },
        Side::Left => match roll {
            2 => HitData::new(LT).crit(),
            3 | 6 => HitData::new(LL),
            4 | 5 => HitData::new(LA),
            7 => HitData::new(LT),
            8 => HitData::new(CT),
            9 => HitData::new(RT),
            10 => HitData::new(RA),
            11 => HitData::new(RL),
            _ => HitData::new(HEAD),
        },
        Side::Right => match roll {
            2 => HitData::new(RT).crit(),
            3 | 6 => HitData::new(RL),
            4 | 5 => HitData::new(RA),
            7 => HitData::new(RT),
            8 => HitData::new(CT),
            9 => HitData::new(LT),
            10 => HitData::new(LA),
            11 => HitData::new(LL),
            _ => HitData::new(HEAD),
        },
    }
}

/// Walker punch table.
pub fn mech_punch(roll: u8, side: Side) -> HitData {
    use mech_loc::*;
    let rear = side == Side::Rear;
    match side {
        Side::Front | Side::Rear => match roll {
            1 => HitData::new(LA),
            2 => HitData::new(LT).rear(rear),
            3 => HitData::new(CT).rear(rear),
            4 => HitData::new(RT).rear(rear),
            5 => HitData::new(RA),
            _ => HitData::new(HEAD),
        },
        Side::Left => match roll {
            1 | 2 => HitData::new(LT),
            3 => HitData::new(CT),
            4 | 5 => HitData::new(LA),
            _ => HitData::new(HEAD),
        },
        Side::Right => match roll {
            1 | 2 => HitData::new(RT),
            3 => HitData::new(CT),
            4 | 5 => HitData::new(RA),
            _ => HitData::new(HEAD),
        },
    }
}

/// Walker kick table.
pub fn mech_kick(roll: u8, side: Side) -> HitData {
    use mech_loc::*;
    match side {
        Side::Front | Side::Rear => HitData::new(if roll <= 3 { RL } else { LL }),
        Side::Left => HitData::new(LL),
        Side::Right => HitData::new(RL),
    }
}

fn vehicle(roll: i32, side: Side, has_turret: bool) -> HitData {
    use vehicle_loc::*;
    let (facing, left_of, right_of) = match side {
        Side::Front => (FRONT, LEFT, RIGHT),
        Side::Right => (RIGHT, FRONT, REAR),
        Side::Left => (LEFT, REAR, FRONT),
        Side::Rear => (REAR, RIGHT, LEFT),
    };
    let turret = if has_turret { TURRET } else { facing };
    match roll {
        2 => HitData::new(facing).crit(),
        3 | 4 => HitData::new(facing).motive(),
        5 => HitData::new(right_of).motive(),
        6..=8 => HitData::new(facing),
        9 => HitData::new(left_of).motive(),
        10 | 11 => HitData::new(turret),
        _ => HitData::new(turret).crit(),
    }
}

fn proto(roll: i32) -> Option<HitData> {
    use proto_loc::*;
    match roll {
        2 => Some(HitData::new(MAIN_GUN)),
        3 | 11 => None,
        4 => Some(HitData::new(RIGHT_ARM)),
        5 | 9 => Some(HitData::new(LEGS)),
        6..=8 => Some(HitData::new(TORSO)),
        10 => Some(HitData::new(LEFT_ARM)),
        _ => Some(HitData::new(HEAD)),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hex::Facing;
    use crate::game::state::PlayerId;
    use crate::game::unit::{MotiveType, UnitId};

    fn placed_mech(facing: Facing) -> Unit {
        let mut unit = Unit::mech(UnitId(1), "Target", PlayerId(1), 50, 4, 0);
        unit.position = Some(HexCoord::new(0, 0));
        unit.facing = facing;
        unit
    }

    #[test]
    fn test_mech_sides() {
        let target = placed_mech(Facing::N);
        let origin = HexCoord::new(0, 0);
        assert_eq!(side_of(&target, origin.translated(Facing::N, 3)), Side::Front);
        assert_eq!(side_of(&target, origin.translated(Facing::NE, 3)), Side::Front);
        assert_eq!(side_of(&target, origin.translated(Facing::SE, 3)), Side::Right);
        assert_eq!(side_of(&target, origin.translated(Facing::S, 3)), Side::Rear);
        assert_eq!(side_of(&target, origin.translated(Facing::SW, 3)), Side::Left);
        // Due east sits on the 90 degree boundary and still counts as front.
        assert_eq!(side_of(&target, HexCoord::new(2, -1)), Side::Front);
    }

    #[test]
    fn test_vehicle_sides() {
        let mut tank = Unit::vehicle(UnitId(2), "Tank", PlayerId(1), 50, 4, MotiveType::Tracked, true, 20);
        tank.position = Some(HexCoord::new(0, 0));
        tank.facing = Facing::N;
        let origin = HexCoord::new(0, 0);
        assert_eq!(side_of(&tank, origin.translated(Facing::N, 2)), Side::Front);
        assert_eq!(side_of(&tank, origin.translated(Facing::NE, 2)), Side::Right);
        assert_eq!(side_of(&tank, origin.translated(Facing::S, 2)), Side::Rear);
        assert_eq!(side_of(&tank, origin.translated(Facing::NW, 2)), Side::Left);
    }

    #[test]
    fn test_rotated_target() {
        let target = placed_mech(Facing::S);
        assert_eq!(side_of(&target, HexCoord::new(0, -3)), Side::Rear);
    }

    #[test]
    fn test_standard_table_rows() {
        assert_eq!(mech_standard(7, Side::Front), HitData::new(mech_loc::CT));
        assert!(mech_standard(7, Side::Rear).rear);
        assert!(mech_standard(2, Side::Front).floating_crit);
        assert_eq!(mech_standard(12, Side::Left).location, mech_loc::HEAD);
        assert_eq!(mech_standard(3, Side::Right).location, mech_loc::RL);
        assert!(!mech_standard(3, Side::Rear).rear);
    }

    #[test]
    fn test_punch_and_kick_tables() {
        assert_eq!(mech_punch(6, Side::Front).location, mech_loc::HEAD);
        assert_eq!(mech_kick(2, Side::Front).location, mech_loc::RL);
        assert_eq!(mech_kick(5, Side::Right).location, mech_loc::RL);
        assert_eq!(elevation_table(3, 0), HitTable::Punch);
        assert_eq!(elevation_table(0, 2), HitTable::Kick);
        assert_eq!(elevation_table(1, 0), HitTable::Standard);
    }

    #[test]
    fn test_vehicle_without_turret() {
        let hit = vehicle(11, Side::Left, false);
        assert_eq!(hit.location, vehicle_loc::LEFT);
        assert!(vehicle(3, Side::Front, true).motive);
    }

    #[test]
    fn test_proto_near_miss() {
        assert!(proto(3).is_none());
        assert!(proto(11).is_none());
        assert_eq!(proto(7).map(|h| h.location), Some(proto_loc::TORSO));
    }
}
