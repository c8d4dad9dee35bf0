//! Position storage.
//!
//! The matrix is an arena of [`MatrixPosition`] records keyed by user id.
//! Every mutation of the tree structure goes through [`PositionStore::commit`],
//! which inserts the new record and claims the parent's slot as one atomic
//! step. Commits are compare-and-swap: the slot must still be empty and the
//! user must still be unplaced at the moment of the write.

use crate::{Error, MatrixPosition, Result, UserId};
use matrix_topology::Slot;
use std::collections::HashMap;

/// The parent slot a new position occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotClaim {
    /// Tree parent
    pub parent: UserId,
    /// Slot on the parent that must be empty
    pub slot: Slot,
}

/// A placement ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCommit {
    /// The new record
    pub position: MatrixPosition,
    /// Parent slot to claim; `None` for a root
    pub claim: Option<SlotClaim>,
}

/// Backend holding matrix positions.
pub trait PositionStore {
    /// Position occupied by `user`, active or not.
    fn get(&self, user: UserId) -> Result<Option<MatrixPosition>>;

    /// Every stored position.
    fn positions(&self) -> Result<Vec<MatrixPosition>>;

    /// Atomically insert `commit.position` and claim its parent slot.
    ///
    /// Implementations must validate with [`prepare_commit`] (or an
    /// equivalent check) inside the same critical section as the write.
    fn commit(&mut self, commit: &PlacementCommit) -> Result<()>;

    /// Toggle the active flag. Returns `false` if the flag was already set.
    fn set_active(&mut self, user: UserId, active: bool) -> Result<bool>;

    /// Position occupied by `user` if it is active.
    fn get_active(&self, user: UserId) -> Result<Option<MatrixPosition>> {
        Ok(self.get(user)?.filter(|p| p.is_active))
    }

    /// Number of stored positions.
    fn len(&self) -> Result<usize> {
        Ok(self.positions()?.len())
    }

    /// Check if empty.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Validate a commit against the current store contents.
///
/// Returns the parent record with the claimed slot filled in, ready to be
/// written next to the new position.
pub fn prepare_commit<S: PositionStore + ?Sized>(
    store: &S,
    commit: &PlacementCommit,
) -> Result<Option<MatrixPosition>> {
    let user = commit.position.user_id;
    if store.get(user)?.is_some() {
        return Err(Error::AlreadyPlaced(user));
    }

    let Some(claim) = commit.claim else {
        return Ok(None);
    };

    let mut parent = store
        .get(claim.parent)?
        .ok_or(Error::UnknownPosition(claim.parent))?;
    if parent.child(claim.slot).is_some() {
        return Err(Error::SlotTaken {
            parent: claim.parent,
            slot: claim.slot,
        });
    }
    parent.children[claim.slot.index()] = Some(user);
    Ok(Some(parent))
}

/// In-memory arena store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    positions: HashMap<UserId, MatrixPosition>,
}

impl MemoryStore {
    /// Create empty store.
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Build a store from existing records, e.g. a snapshot.
    pub fn from_positions(positions: impl IntoIterator<Item = MatrixPosition>) -> Self {
        Self {
            positions: positions.into_iter().map(|p| (p.user_id, p)).collect(),
        }
    }

    /// Borrow a position without cloning.
    pub fn position(&self, user: UserId) -> Option<&MatrixPosition> {
        self.positions.get(&user)
    }

    /// Iterate positions in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &MatrixPosition> {
        self.positions.values()
    }
}

impl PositionStore for MemoryStore {
    fn get(&self, user: UserId) -> Result<Option<MatrixPosition>> {
        Ok(self.positions.get(&user).cloned())
    }

    fn positions(&self) -> Result<Vec<MatrixPosition>> {
        let mut all: Vec<_> = self.positions.values().cloned().collect();
        all.sort_by_key(|p| (p.tree_root, p.level, p.position));
        Ok(all)
    }

    fn commit(&mut self, commit: &PlacementCommit) -> Result<()> {
        // Validation happens before any mutation, so a failed commit leaves
        // the arena untouched.
        let parent = prepare_commit(&*self, commit)?;
        if let Some(parent) = parent {
            self.positions.insert(parent.user_id, parent);
        }
        self.positions
            .insert(commit.position.user_id, commit.position.clone());
        Ok(())
    }

    fn set_active(&mut self, user: UserId, active: bool) -> Result<bool> {
        let position = self
            .positions
            .get_mut(&user)
            .ok_or(Error::UnknownPosition(user))?;
        if position.is_active == active {
            return Ok(false);
        }
        position.is_active = active;
        Ok(true)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.positions.len())
    }
}
