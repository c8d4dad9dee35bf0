//! Structural invariants of a stored matrix.
//!
//! The placement engine never produces a violation; these checks exist for
//! data that came from elsewhere (imports, migrations, hand edits) and for
//! property tests.
//!
//! For every non-root position P with tree parent Q:
//! - `Q` references `P` in exactly the slot implied by `P.position`
//! - `P.level == Q.level + 1`
//! - `P.position == (Q.position - 1) * 3 + slot`
//! - `P.tree_root == Q.tree_root`
//!
//! For every position: `level <= MAX_LEVELS`, and no two positions in one
//! tree share a coordinate. Roots sit at `(1, 1)` without sponsor.

use crate::{MatrixPosition, UserId};
use matrix_topology::{MatrixCoord, Slot, MAX_LEVELS};
use std::collections::HashMap;
use thiserror::Error;

/// A broken structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{user} sits at level {level}, beyond the matrix depth")]
    DepthExceeded { user: UserId, level: u8 },

    #[error("root {user} must be at level 1, position 1 without sponsor")]
    MalformedRoot { user: UserId },

    #[error("{user} names parent {parent}, which does not exist")]
    MissingParent { user: UserId, parent: UserId },

    #[error("{parent} lists child {child}, which does not exist")]
    DanglingChild { parent: UserId, child: UserId },

    #[error("{user} is not referenced by its parent {parent}")]
    ParentMismatch { user: UserId, parent: UserId },

    #[error("{user} is at level {level} but its parent is at level {parent_level}")]
    LevelMismatch {
        user: UserId,
        level: u8,
        parent_level: u8,
    },

    #[error("{user} in slot {slot} should be position {expected}, found {actual}")]
    PositionMismatch {
        user: UserId,
        slot: Slot,
        expected: u32,
        actual: u32,
    },

    #[error("{user} belongs to tree {actual} but its parent is in tree {expected}")]
    TreeMismatch {
        user: UserId,
        expected: UserId,
        actual: UserId,
    },

    #[error("{first} and {second} share level {level} position {position} in tree {tree}")]
    DuplicateCoordinate {
        tree: UserId,
        level: u8,
        position: u32,
        first: UserId,
        second: UserId,
    },
}

/// Check every invariant over a full snapshot of the store.
///
/// Returns the first violation found.
pub fn check_invariants(positions: &[MatrixPosition]) -> Result<(), InvariantViolation> {
    let by_user: HashMap<UserId, &MatrixPosition> =
        positions.iter().map(|p| (p.user_id, p)).collect();
    let mut coords: HashMap<(UserId, MatrixCoord), UserId> = HashMap::new();

    for position in positions {
        let user = position.user_id;

        if position.level > MAX_LEVELS {
            return Err(InvariantViolation::DepthExceeded {
                user,
                level: position.level,
            });
        }

        if let Some(first) = coords.insert((position.tree_root, position.coord()), user) {
            return Err(InvariantViolation::DuplicateCoordinate {
                tree: position.tree_root,
                level: position.level,
                position: position.position,
                first,
                second: user,
            });
        }

        for child in position.child_ids() {
            if !by_user.contains_key(&child) {
                return Err(InvariantViolation::DanglingChild {
                    parent: user,
                    child,
                });
            }
        }

        let Some(parent_id) = position.parent_id else {
            if position.coord() != MatrixCoord::ROOT
                || position.sponsor_id.is_some()
                || position.tree_root != user
            {
                return Err(InvariantViolation::MalformedRoot { user });
            }
            continue;
        };

        let parent = by_user
            .get(&parent_id)
            .ok_or(InvariantViolation::MissingParent {
                user,
                parent: parent_id,
            })?;

        let slot = parent
            .slot_of(user)
            .ok_or(InvariantViolation::ParentMismatch {
                user,
                parent: parent_id,
            })?;

        if position.level != parent.level.saturating_add(1) {
            return Err(InvariantViolation::LevelMismatch {
                user,
                level: position.level,
                parent_level: parent.level,
            });
        }

        let expected = parent
            .coord()
            .child(slot)
            .map_err(|_| InvariantViolation::DepthExceeded {
                user,
                level: position.level,
            })?
            .position;
        if position.position != expected {
            return Err(InvariantViolation::PositionMismatch {
                user,
                slot,
                expected,
                actual: position.position,
            });
        }

        if position.tree_root != parent.tree_root {
            return Err(InvariantViolation::TreeMismatch {
                user,
                expected: parent.tree_root,
                actual: position.tree_root,
            });
        }
    }

    Ok(())
}
