//! Cluster hits table.
//!
//! Number of missiles (or shots) that connect for a rack of a given size,
//! indexed by a 2d6 roll.

use crate::core::rng::DeterministicRng;

/// Rack sizes with their own column.
const COLUMNS: [(u32, [u32; 11]); 30] = [
    (2, [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2]),
    (3, [1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3]),
    (4, [1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4]),
    (5, [1, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5]),
    (6, [2, 2, 3, 3, 4, 4, 4, 5, 5, 6, 6]),
    (7, [2, 2, 3, 4, 4, 4, 4, 6, 6, 7, 7]),
    (8, [3, 3, 4, 4, 5, 5, 5, 6, 6, 8, 8]),
    (9, [3, 3, 4, 5, 5, 5, 5, 7, 7, 9, 9]),
    (10, [3, 3, 4, 6, 6, 6, 6, 8, 8, 10, 10]),
    (11, [4, 4, 5, 7, 7, 7, 7, 9, 9, 11, 11]),
    (12, [4, 4, 5, 8, 8, 8, 8, 10, 10, 12, 12]),
    (13, [4, 4, 5, 8, 8, 8, 8, 11, 11, 13, 13]),
    (14, [5, 5, 6, 9, 9, 9, 9, 11, 11, 14, 14]),
    (15, [5, 5, 6, 9, 9, 9, 9, 12, 12, 15, 15]),
    (16, [5, 5, 7, 10, 10, 10, 10, 13, 13, 16, 16]),
    (17, [5, 5, 7, 10, 10, 10, 10, 14, 14, 17, 17]),
    (18, [6, 6, 8, 11, 11, 11, 11, 14, 14, 18, 18]),
    (19, [6, 6, 8, 11, 11, 11, 11, 15, 15, 19, 19]),
    (20, [6, 6, 9, 12, 12, 12, 12, 16, 16, 20, 20]),
    (21, [7, 7, 9, 13, 13, 13, 13, 17, 17, 21, 21]),
    (22, [7, 7, 9, 14, 14, 14, 14, 18, 18, 22, 22]),
    (23, [7, 7, 10, 15, 15, 15, 15, 19, 19, 23, 23]),
    (24, [8, 8, 10, 16, 16, 16, 16, 20, 20, 24, 24]),
    (25, [8, 8, 10, 16, 16, 16, 16, 21, 21, 25, 25]),
    (26, [9, 9, 11, 17, 17, 17, 17, 21, 21, 26, 26]),
    (27, [9, 9, 11, 17, 17, 17, 17, 22, 22, 27, 27]),
    (28, [9, 9, 11, 17, 17, 17, 17, 23, 23, 28, 28]),
    (29, [10, 10, 12, 18, 18, 18, 18, 23, 23, 29, 29]),
    (30, [10, 10, 12, 18, 18, 18, 18, 24, 24, 30, 30]),
    (40, [12, 12, 18, 24, 24, 24, 24, 32, 32, 40, 40]),
];

fn column(size: u32) -> Option<&'static [u32; 11]> {
    COLUMNS.iter().find(|(s, _)| *s == size).map(|(_, c)| c)
}

/// Hits for a rack of `size` on a (modified) 2d6 `roll`.
///
/// The roll is clamped to 2..=12. Racks without their own column are split
/// into 40- and 30-sized columns plus a remainder, all read on the same roll.
pub fn cluster_hits(size: u32, roll: i32) -> u32 {
    if size == 0 {
        return 0;
    }
    if size == 1 {
        return 1;
    }
    let index = (roll.clamp(2, 12) - 2) as usize;
    if let Some(col) = column(size) {
        return col[index];
    }
    let mut remaining = size;
    let mut hits = 0;
    while remaining > 0 {
        let part = if remaining > 40 {
            40
        } else if remaining > 30 && remaining != 40 {
            30
        } else {
            remaining
        };
        hits += match column(part) {
            Some(col) => col[index],
            None => part,
        };
        remaining -= part;
    }
    hits
}

/// Roll 2d6, add `modifier`, and read the table.
pub fn roll_cluster(rng: &mut DeterministicRng, size: u32, modifier: i32) -> (u32, i32) {
    let roll = rng.roll_2d6().total() + modifier;
    (cluster_hits(size, roll), roll)
}

/// Split `total` damage into clusters of at most `group`.
pub fn group_damage(total: u32, group: u32) -> Vec<u32> {
    if total == 0 {
        return Vec::new();
    }
    let group = group.max(1);
    let mut clusters = vec![group; (total / group) as usize];
    if total % group > 0 {
        clusters.push(total % group);
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_columns() {
        assert_eq!(cluster_hits(20, 7), 12);
        assert_eq!(cluster_hits(6, 2), 2);
        assert_eq!(cluster_hits(6, 12), 6);
        assert_eq!(cluster_hits(2, 8), 2);
        assert_eq!(cluster_hits(40, 9), 32);
    }

    #[test]
    fn test_roll_clamped() {
        assert_eq!(cluster_hits(10, -3), cluster_hits(10, 2));
        assert_eq!(cluster_hits(10, 15), 10);
    }

    #[test]
    fn test_large_racks_split() {
        // 60 = 40 + 20
        assert_eq!(cluster_hits(60, 7), 24 + 12);
        // 35 = 30 + 5
        assert_eq!(cluster_hits(35, 12), 35);
    }

    #[test]
    fn test_grouping() {
        assert_eq!(group_damage(12, 5), vec![5, 5, 2]);
        assert_eq!(group_damage(10, 5), vec![5, 5]);
        assert!(group_damage(0, 5).is_empty());
    }

    proptest! {
        #[test]
        fn prop_cluster_roll_is_reproducible(seed in any::<u64>(), size in 2u32..=40, modifier in -4i32..=4) {
            let mut a = DeterministicRng::new(seed);
            let mut b = DeterministicRng::new(seed);
            prop_assert_eq!(roll_cluster(&mut a, size, modifier), roll_cluster(&mut b, size, modifier));
        }

        #[test]
        fn prop_hits_never_exceed_rack(size in 1u32..=80, roll in 2i32..=12) {
            let hits = cluster_hits(size, roll);
            prop_assert!(hits >= 1 && hits <= size);
        }
    }
}
