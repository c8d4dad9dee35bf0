//! Per-level and per-subtree capacity of a forced matrix.

use crate::{MATRIX_WIDTH, MAX_LEVELS};

/// Maximum members of one tree summed over every level.
pub const TOTAL_NETWORK_CAPACITY: u64 = total_capacity_through(MAX_LEVELS);

/// Maximum members on `level` of a single tree.
///
/// - Level 1: 1 (the root)
/// - Level L: 3^(L-1)
///
/// Level 0 and levels beyond `MAX_LEVELS` hold nothing.
#[inline]
pub const fn level_capacity(level: u8) -> u64 {
    if level == 0 || level > MAX_LEVELS {
        return 0;
    }
    (MATRIX_WIDTH as u64).pow(level as u32 - 1)
}

/// Total capacity of levels `1..=level`.
///
/// Formula: (3^level - 1) / 2
#[inline]
pub const fn total_capacity_through(level: u8) -> u64 {
    let level = if level > MAX_LEVELS { MAX_LEVELS } else { level };
    ((MATRIX_WIDTH as u64).pow(level as u32) - 1) / (MATRIX_WIDTH as u64 - 1)
}

/// Capacity table indexed by level, `[level 1, ..., level 7]`.
pub fn level_capacities() -> [(u8, u64); MAX_LEVELS as usize] {
    let mut table = [(0u8, 0u64); MAX_LEVELS as usize];
    for (i, entry) in table.iter_mut().enumerate() {
        let level = i as u8 + 1;
        *entry = (level, level_capacity(level));
    }
    table
}

/// Members that fit in the subtree rooted at a node on `level`, the node
/// itself included.
#[inline]
pub const fn subtree_capacity(level: u8) -> u64 {
    if level == 0 || level > MAX_LEVELS {
        return 0;
    }
    total_capacity_through(MAX_LEVELS - level + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_capacity_triples() {
        let expected = [1, 3, 9, 27, 81, 243, 729];
        for (i, cap) in expected.iter().enumerate() {
            assert_eq!(level_capacity(i as u8 + 1), *cap);
        }
        assert_eq!(level_capacity(0), 0);
        assert_eq!(level_capacity(MAX_LEVELS + 1), 0);
    }

    #[test]
    fn total_capacity_formula() {
        assert_eq!(total_capacity_through(0), 0);
        assert_eq!(total_capacity_through(1), 1);
        assert_eq!(total_capacity_through(2), 4);
        assert_eq!(total_capacity_through(3), 13);
        assert_eq!(total_capacity_through(7), 1093);
        // Clamped to the matrix depth
        assert_eq!(total_capacity_through(20), 1093);
    }

    #[test]
    fn capacity_table_sums_to_total() {
        let sum: u64 = level_capacities().iter().map(|(_, c)| c).sum();
        assert_eq!(sum, TOTAL_NETWORK_CAPACITY);
        assert_eq!(level_capacities()[0], (1, 1));
        assert_eq!(level_capacities()[6], (7, 729));
    }

    #[test]
    fn subtree_capacity_shrinks_with_depth() {
        assert_eq!(subtree_capacity(1), 1093);
        assert_eq!(subtree_capacity(2), 364);
        assert_eq!(subtree_capacity(6), 4);
        assert_eq!(subtree_capacity(7), 1);
        assert_eq!(subtree_capacity(8), 0);
    }

    #[test]
    fn root_subtree_is_root_plus_three_children_subtrees() {
        for level in 1..MAX_LEVELS {
            assert_eq!(
                subtree_capacity(level),
                1 + 3 * subtree_capacity(level + 1),
                "level {}",
                level
            );
        }
    }
}
