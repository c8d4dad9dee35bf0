//! Forced Matrix Topology
//!
//! Pure geometry of a forced matrix: every node has at most three children
//! (left, middle, right) and the tree is at most seven levels deep.
//!
//! # Numbering
//!
//! Each node is addressed by a `(level, position)` pair. The root sits at
//! `(1, 1)`. A child in slot `s` (1 = left, 2 = middle, 3 = right) of a
//! parent numbered `p` is numbered `(p - 1) * 3 + s` on the next level, so
//! positions on a level run `1..=3^(level-1)` in breadth-first order and the
//! parent of any node can be recovered from its own number.
//!
//! # Capacity
//!
//! Level `L` of one tree holds at most `3^(L-1)` members; the whole tree
//! holds `(3^7 - 1) / 2 = 1093`.

mod capacity;
mod coord;
mod error;
mod slot;

pub use capacity::{
    level_capacity, level_capacities, subtree_capacity, total_capacity_through,
    TOTAL_NETWORK_CAPACITY,
};
pub use coord::{BreadthFirst, MatrixCoord};
pub use error::TopologyError;
pub use slot::Slot;

/// Children per node.
pub const MATRIX_WIDTH: usize = 3;

/// Deepest level a position may occupy (root = 1).
pub const MAX_LEVELS: u8 = 7;

const _: () = assert!(MATRIX_WIDTH == Slot::ALL.len());
