//! Forced Matrix Engine
//!
//! Placement and reporting over a 3-wide, 7-deep forced matrix.
//!
//! # Placement
//!
//! A newcomer is placed directly under their sponsor while the sponsor has a
//! free slot. Once the sponsor's three slots are taken the newcomer
//! **spills over**: a breadth-first search of the sponsor's downline finds
//! the shallowest open position, and the newcomer is placed there while
//! still recording the original sponsor.
//!
//! Slots fill left, middle, right. A filled slot is never cleared, so the
//! tree only grows.
//!
//! # Storage
//!
//! Positions live in a [`PositionStore`]: an arena of records keyed by user
//! id, each carrying its three child ids. [`MemoryStore`] is the in-process
//! implementation; persistent stores implement the same trait and must make
//! [`PositionStore::commit`] atomic.
//!
//! # Reporting
//!
//! Tree snapshots, downline statistics, upline chains and the matrix-wide
//! overview are pure reads and can run at any time.
//!
//! # Example
//!
//! ```
//! use matrix_engine::{MatrixEngine, MemoryStore, UserId};
//!
//! let mut engine = MatrixEngine::new(MemoryStore::new());
//! engine.place(UserId(1), None).unwrap();
//! let b = engine.place(UserId(2), Some(UserId(1))).unwrap();
//! assert_eq!((b.level, b.position), (2, 1));
//! ```

mod engine;
mod error;
mod invariants;
mod position;
mod spillover;
mod stats;
mod store;
mod traversal;

pub use engine::MatrixEngine;
pub use error::{Error, Result};
pub use invariants::{check_invariants, InvariantViolation};
pub use position::{now_millis, MatrixPosition, UserId};
pub use spillover::{accepts_children, find_open_position};
pub use stats::{network_stats, overview, LevelStats, MatrixOverview, NetworkStats};
pub use store::{prepare_commit, MemoryStore, PlacementCommit, PositionStore, SlotClaim};
pub use traversal::{build_tree, upline, TreeNode};

pub use matrix_topology::{Slot, MAX_LEVELS, TOTAL_NETWORK_CAPACITY};
