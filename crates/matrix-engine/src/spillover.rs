//! Spillover search: breadth-first hunt for the shallowest open position.
//!
//! When a sponsor's own three slots are taken, a newcomer spills over into
//! the sponsor's downline. The search visits the downline level by level,
//! children in left, middle, right order, and returns the first position
//! that is active, not full and not on the deepest level. Breadth-first order
//! guarantees the result is as close to the sponsor as possible.
//!
//! # Termination
//!
//! A visited set keyed by user id and a generation bound of `MAX_LEVELS`
//! keep the walk finite even over malformed data (cycles, dangling child
//! ids). At most `(3^7 - 1) / 2` positions are visited.

use crate::{MatrixPosition, PositionStore, Result, UserId};
use matrix_topology::MAX_LEVELS;
use std::collections::{HashSet, VecDeque};

/// Whether a position can take another child.
pub fn accepts_children(position: &MatrixPosition) -> bool {
    position.is_active && !position.is_full() && position.level < MAX_LEVELS
}

/// Find the first position under (or at) `start` that can take a child.
///
/// Returns `Ok(None)` when the whole reachable subtree is saturated.
pub fn find_open_position<S: PositionStore + ?Sized>(
    store: &S,
    start: &MatrixPosition,
) -> Result<Option<MatrixPosition>> {
    let mut queue: VecDeque<(MatrixPosition, u8)> = VecDeque::new();
    let mut visited: HashSet<UserId> = HashSet::new();
    queue.push_back((start.clone(), 0));

    while let Some((position, generation)) = queue.pop_front() {
        if !visited.insert(position.user_id) {
            continue;
        }

        if accepts_children(&position) {
            tracing::debug!(
                start = %start.user_id,
                found = %position.user_id,
                level = position.level,
                visited = visited.len(),
                "spillover search found open position"
            );
            return Ok(Some(position));
        }

        if generation >= MAX_LEVELS {
            continue;
        }

        for child in position.child_ids() {
            if visited.contains(&child) {
                continue;
            }
            match store.get(child)? {
                Some(record) => queue.push_back((record, generation + 1)),
                None => tracing::warn!(
                    parent = %position.user_id,
                    child = %child,
                    "child slot references a missing position"
                ),
            }
        }
    }

    tracing::debug!(
        start = %start.user_id,
        visited = visited.len(),
        "spillover search exhausted subtree"
    );
    Ok(None)
}
