//! Hex Geometry
//!
//! Flat-topped hexes in axial coordinates (q, r). Facing 0 is north and
//! increases clockwise. Bearings are measured in twelfths of a circle
//! (30 degree steps), which is exactly the resolution the hit-side tables
//! need, so all geometry stays in integer arithmetic.

use serde::{Serialize, Deserialize};

/// Axial hex coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct HexCoord {
    /// Column axis
    pub q: i32,
    /// Diagonal row axis
    pub r: i32,
}

impl HexCoord {
    /// Create a coordinate.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Convert from odd-q offset layout (column, row).
    pub fn from_offset(col: i32, row: i32) -> Self {
        let q = col;
        let r = row - (col - (col & 1)) / 2;
        Self { q, r }
    }

    /// Convert to odd-q offset layout (column, row).
    pub fn to_offset(&self) -> (i32, i32) {
        let col = self.q;
        let row = self.r + (self.q - (self.q & 1)) / 2;
        (col, row)
    }

    /// Cube coordinate S (derived from q and r).
    #[inline]
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance.
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// The adjacent hex in `facing`.
    pub fn neighbor(&self, facing: Facing) -> HexCoord {
        let (dq, dr) = facing.offset();
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// The hex `steps` hexes away along `facing`.
    pub fn translated(&self, facing: Facing, steps: u32) -> HexCoord {
        let (dq, dr) = facing.offset();
        HexCoord::new(self.q + dq * steps as i32, self.r + dr * steps as i32)
    }

    /// All 6 adjacent hexes, in facing order.
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Facing::ALL.map(|f| self.neighbor(f))
    }

    /// Bearing from this hex to `other`, or `None` for the same hex.
    pub fn bearing_to(&self, other: &Self) -> Option<Bearing> {
        let q = other.q - self.q;
        let r = other.r - self.r;
        let s = -q - r;
        if q == 0 && r == 0 {
            return None;
        }
        // The six cube orderings are the six wedges around a hex; ties
        // between neighbours in the ordering are the wedge boundaries.
        let twelfths = if r < q && q < s {
            0
        } else if r < q && q == s {
            1
        } else if r < s && s < q {
            2
        } else if r == s && s < q {
            3
        } else if s < r && r < q {
            4
        } else if s < r && r == q {
            5
        } else if s < q && q < r {
            6
        } else if q == s && s < r {
            7
        } else if q < s && s < r {
            8
        } else if q < r && r == s {
            9
        } else if q < r && r < s {
            10
        } else {
            11
        };
        Some(Bearing(twelfths))
    }

    /// Nearest facing from this hex towards `other`.
    ///
    /// Bearings exactly between two facings round clockwise.
    pub fn direction_to(&self, other: &Self) -> Option<Facing> {
        self.bearing_to(other)
            .map(|b| Facing::from_index(((b.0 as usize + 1) / 2) as i32))
    }

    /// All hexes within `range` (inclusive), in deterministic order.
    pub fn hexes_in_range(&self, range: u32) -> Vec<HexCoord> {
        let range = range as i32;
        let mut results = Vec::new();
        for q in -range..=range {
            for r in (-range).max(-q - range)..=range.min(-q + range) {
                results.push(HexCoord::new(self.q + q, self.r + r));
            }
        }
        results
    }

    /// Hexes exactly `radius` away.
    pub fn ring(&self, radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![*self];
        }
        let mut results = Vec::with_capacity(6 * radius as usize);
        let mut current = self.translated(Facing::SW, radius);
        for facing in Facing::ALL {
            for _ in 0..radius {
                results.push(current);
                current = current.neighbor(facing);
            }
        }
        results
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (col, row) = self.to_offset();
        write!(f, "{:02}{:02}", col + 1, row + 1)
    }
}

/// Bearing in twelfths of a circle, clockwise from north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bearing(pub u8);

impl Bearing {
    /// Bearing in degrees.
    pub fn degrees(&self) -> u32 {
        self.0 as u32 * 30
    }

    /// Bearing relative to a facing (0 = dead ahead).
    pub fn relative_to(&self, facing: Facing) -> Bearing {
        Bearing(((self.0 as i32 - 2 * facing.index() as i32).rem_euclid(12)) as u8)
    }
}

/// Hex facing, clockwise from north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Facing {
    /// North
    #[default]
    N,
    /// North-east
    NE,
    /// South-east
    SE,
    /// South
    S,
    /// South-west
    SW,
    /// North-west
    NW,
}

impl Facing {
    /// All facings in clockwise order.
    pub const ALL: [Facing; 6] = [Facing::N, Facing::NE, Facing::SE, Facing::S, Facing::SW, Facing::NW];

    /// Facing index (0-5).
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Facing from any integer (wraps).
    pub fn from_index(index: i32) -> Facing {
        Facing::ALL[index.rem_euclid(6) as usize]
    }

    /// Axial offset of the adjacent hex in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Facing::N => (0, -1),
            Facing::NE => (1, -1),
            Facing::SE => (1, 0),
            Facing::S => (0, 1),
            Facing::SW => (-1, 1),
            Facing::NW => (-1, 0),
        }
    }

    /// Rotate by `steps` hexsides (positive is clockwise).
    pub fn rotated(self, steps: i32) -> Facing {
        Facing::from_index(self.index() as i32 + steps)
    }

    /// Opposite facing.
    pub fn opposite(self) -> Facing {
        self.rotated(3)
    }
}

/// Serde adapter for maps keyed by [`HexCoord`].
///
/// Encodes the map as a list of pairs so text formats that only accept
/// string keys can carry it.
pub mod coord_map {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::HexCoord;

    /// Serialize as `[(coord, value), ...]`.
    pub fn serialize<S, V>(map: &BTreeMap<HexCoord, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_seq(map.iter())
    }

    /// Deserialize from `[(coord, value), ...]`.
    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<HexCoord, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        let pairs: Vec<(HexCoord, V)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_neighbors_are_adjacent() {
        let origin = HexCoord::new(2, 3);
        for n in origin.neighbors() {
            assert_eq!(origin.distance(&n), 1);
        }
    }

    #[test]
    fn test_direction_to_neighbors() {
        let origin = HexCoord::new(0, 0);
        for facing in Facing::ALL {
            assert_eq!(origin.direction_to(&origin.neighbor(facing)), Some(facing));
            assert_eq!(origin.bearing_to(&origin.neighbor(facing)).map(|b| b.degrees()), Some(facing.index() as u32 * 60));
        }
        assert_eq!(origin.direction_to(&origin), None);
    }

    #[test]
    fn test_boundary_bearings() {
        let origin = HexCoord::new(0, 0);
        // Due east lies on the wedge boundary between NE and SE.
        let east = HexCoord::new(2, -1);
        assert_eq!(origin.bearing_to(&east).map(|b| b.degrees()), Some(90));
        assert_eq!(origin.direction_to(&east), Some(Facing::SE));
    }

    #[test]
    fn test_relative_bearing() {
        let b = Bearing(0);
        assert_eq!(b.relative_to(Facing::S).degrees(), 180);
        assert_eq!(Bearing(4).relative_to(Facing::NE).degrees(), 60);
    }

    #[test]
    fn test_offset_round_trip() {
        for col in 0..8 {
            for row in 0..8 {
                let hex = HexCoord::from_offset(col, row);
                assert_eq!(hex.to_offset(), (col, row));
            }
        }
    }

    #[test]
    fn test_ring_size() {
        let origin = HexCoord::new(0, 0);
        assert_eq!(origin.ring(1).len(), 6);
        assert_eq!(origin.ring(3).len(), 18);
        assert!(origin.ring(3).iter().all(|h| origin.distance(h) == 3));
        assert_eq!(origin.hexes_in_range(2).len(), 19);
    }

    #[test]
    fn test_facing_rotation() {
        assert_eq!(Facing::N.rotated(-1), Facing::NW);
        assert_eq!(Facing::SW.rotated(3), Facing::NE);
        assert_eq!(Facing::SE.opposite(), Facing::NW);
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(a in -20i32..20, b in -20i32..20, c in -20i32..20, d in -20i32..20) {
            let x = HexCoord::new(a, b);
            let y = HexCoord::new(c, d);
            prop_assert_eq!(x.distance(&y), y.distance(&x));
        }

        #[test]
        fn prop_bearing_reverses(a in -20i32..20, b in -20i32..20, c in -20i32..20, d in -20i32..20) {
            let x = HexCoord::new(a, b);
            let y = HexCoord::new(c, d);
            prop_assume!(x != y);
            let there = x.bearing_to(&y).unwrap().0 as i32;
            let back = y.bearing_to(&x).unwrap().0 as i32;
            prop_assert_eq!((there + 6) % 12, back);
        }
    }
}
