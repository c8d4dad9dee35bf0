//! Matrix coordinates: `(level, position)` addressing.
//!
//! Within one tree every node has a unique coordinate. Numbering on a level
//! follows breadth-first order, so the coordinate of a child is a pure
//! function of its parent's coordinate and the slot it fills:
//!
//! ```text
//! child.level    = parent.level + 1
//! child.position = (parent.position - 1) * 3 + slot
//! ```

use crate::{level_capacity, total_capacity_through, Slot, TopologyError, MATRIX_WIDTH, MAX_LEVELS};

/// A node address inside one matrix tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixCoord {
    /// Generation, root = 1
    pub level: u8,
    /// One-based index on the level
    pub position: u32,
}

impl MatrixCoord {
    /// The root of every tree.
    pub const ROOT: Self = Self { level: 1, position: 1 };

    /// Create a coordinate, checking that it exists in the matrix.
    pub fn new(level: u8, position: u32) -> Result<Self, TopologyError> {
        let coord = Self { level, position };
        if level == 0 || level > MAX_LEVELS {
            return Err(TopologyError::LevelOutOfRange { level, max: MAX_LEVELS });
        }
        if !coord.is_valid() {
            return Err(TopologyError::InvalidPosition { level, position });
        }
        Ok(coord)
    }

    /// Whether this coordinate lies inside the matrix bounds.
    pub fn is_valid(&self) -> bool {
        self.level >= 1
            && self.level <= MAX_LEVELS
            && self.position >= 1
            && u64::from(self.position) <= level_capacity(self.level)
    }

    /// Coordinate of the child in `slot`.
    ///
    /// Fails with `LevelOutOfRange` when the child would sit below
    /// `MAX_LEVELS`.
    pub fn child(&self, slot: Slot) -> Result<Self, TopologyError> {
        let level = self.level.saturating_add(1);
        if level > MAX_LEVELS {
            return Err(TopologyError::LevelOutOfRange { level, max: MAX_LEVELS });
        }
        Ok(Self {
            level,
            position: self.position.saturating_sub(1) * MATRIX_WIDTH as u32 + u32::from(slot.number()),
        })
    }

    /// All three child coordinates in fill order.
    pub fn children(&self) -> Result<[Self; MATRIX_WIDTH], TopologyError> {
        Ok([
            self.child(Slot::Left)?,
            self.child(Slot::Middle)?,
            self.child(Slot::Right)?,
        ])
    }

    /// Parent coordinate and the slot this coordinate fills under it.
    ///
    /// Returns `None` for the root.
    pub fn parent(&self) -> Option<(Self, Slot)> {
        if self.level <= 1 || self.position == 0 {
            return None;
        }
        let zero_based = self.position - 1;
        let slot = Slot::from_index((zero_based % MATRIX_WIDTH as u32) as usize)?;
        let parent = Self {
            level: self.level - 1,
            position: zero_based / MATRIX_WIDTH as u32 + 1,
        };
        Some((parent, slot))
    }

    /// Whether a node here may still receive children.
    pub fn can_have_children(&self) -> bool {
        self.level < MAX_LEVELS
    }

    /// Index of this coordinate in whole-tree breadth-first order (root = 0).
    pub fn bfs_index(&self) -> u64 {
        total_capacity_through(self.level.saturating_sub(1)) + u64::from(self.position).saturating_sub(1)
    }

    /// Inverse of [`MatrixCoord::bfs_index`].
    pub fn from_bfs_index(index: u64) -> Option<Self> {
        for level in 1..=MAX_LEVELS {
            if index < total_capacity_through(level) {
                let offset = index - total_capacity_through(level - 1);
                return Some(Self {
                    level,
                    position: offset as u32 + 1,
                });
            }
        }
        None
    }
}

impl Default for MatrixCoord {
    fn default() -> Self {
        Self::ROOT
    }
}

/// Iterator over coordinates in breadth-first fill order.
///
/// This is the order in which a single sponsor's tree fills when every
/// newcomer is placed under the root and spills over.
pub struct BreadthFirst {
    current: u64,
    limit: u64,
}

impl BreadthFirst {
    /// Every coordinate of a full tree.
    pub fn new() -> Self {
        Self::through(MAX_LEVELS)
    }

    /// Coordinates on levels `1..=level`.
    pub fn through(level: u8) -> Self {
        Self {
            current: 0,
            limit: total_capacity_through(level),
        }
    }

    /// Coordinates on a single level.
    pub fn level(level: u8) -> Self {
        if level == 0 || level > MAX_LEVELS {
            return Self { current: 0, limit: 0 };
        }
        Self {
            current: total_capacity_through(level - 1),
            limit: total_capacity_through(level),
        }
    }
}

impl Default for BreadthFirst {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for BreadthFirst {
    type Item = MatrixCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.limit {
            return None;
        }
        let coord = MatrixCoord::from_bfs_index(self.current)?;
        self.current += 1;
        Some(coord)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.limit.saturating_sub(self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BreadthFirst {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_children_are_one_two_three() {
        let children = MatrixCoord::ROOT.children().unwrap();
        assert_eq!(children[0], MatrixCoord { level: 2, position: 1 });
        assert_eq!(children[1], MatrixCoord { level: 2, position: 2 });
        assert_eq!(children[2], MatrixCoord { level: 2, position: 3 });
    }

    #[test]
    fn child_formula() {
        // (p - 1) * 3 + s
        let parent = MatrixCoord { level: 3, position: 5 };
        assert_eq!(parent.child(Slot::Left).unwrap().position, 13);
        assert_eq!(parent.child(Slot::Middle).unwrap().position, 14);
        assert_eq!(parent.child(Slot::Right).unwrap().position, 15);
    }

    #[test]
    fn deepest_level_has_no_children() {
        let leaf = MatrixCoord { level: MAX_LEVELS, position: 1 };
        assert!(!leaf.can_have_children());
        assert_eq!(
            leaf.child(Slot::Left),
            Err(TopologyError::LevelOutOfRange { level: 8, max: MAX_LEVELS })
        );
    }

    #[test]
    fn root_has_no_parent() {
        assert_eq!(MatrixCoord::ROOT.parent(), None);
    }

    #[test]
    fn new_rejects_out_of_bounds() {
        assert!(MatrixCoord::new(1, 1).is_ok());
        assert!(MatrixCoord::new(2, 3).is_ok());
        assert_eq!(
            MatrixCoord::new(2, 4),
            Err(TopologyError::InvalidPosition { level: 2, position: 4 })
        );
        assert_eq!(
            MatrixCoord::new(8, 1),
            Err(TopologyError::LevelOutOfRange { level: 8, max: MAX_LEVELS })
        );
        assert!(MatrixCoord::new(3, 0).is_err());
    }

    #[test]
    fn breadth_first_covers_whole_tree() {
        let all: Vec<_> = BreadthFirst::new().collect();
        assert_eq!(all.len() as u64, crate::TOTAL_NETWORK_CAPACITY);
        assert_eq!(all[0], MatrixCoord::ROOT);
        assert_eq!(all[1], MatrixCoord { level: 2, position: 1 });
        assert_eq!(all[4], MatrixCoord { level: 3, position: 1 });
    }

    #[test]
    fn breadth_first_single_level() {
        let level_3: Vec<_> = BreadthFirst::level(3).collect();
        assert_eq!(level_3.len(), 9);
        assert!(level_3.iter().all(|c| c.level == 3));
        assert_eq!(BreadthFirst::level(0).count(), 0);
        assert_eq!(BreadthFirst::level(8).count(), 0);
    }

    proptest! {
        #[test]
        fn parent_inverts_child(level in 1u8..MAX_LEVELS, slot_index in 0usize..3, seed in any::<u32>()) {
            let position = seed % level_capacity(level) as u32 + 1;
            let parent = MatrixCoord { level, position };
            let slot = Slot::from_index(slot_index).unwrap();
            let child = parent.child(slot).unwrap();

            prop_assert!(child.is_valid());
            prop_assert_eq!(child.parent(), Some((parent, slot)));
        }

        #[test]
        fn bfs_index_roundtrip(index in 0u64..crate::TOTAL_NETWORK_CAPACITY) {
            let coord = MatrixCoord::from_bfs_index(index).unwrap();
            prop_assert!(coord.is_valid());
            prop_assert_eq!(coord.bfs_index(), index);
        }
    }
}
