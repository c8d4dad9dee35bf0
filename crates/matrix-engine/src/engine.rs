//! Placement engine.
//!
//! `place` is the only way a position enters the matrix. It resolves the
//! sponsor's position, picks a parent (the sponsor itself, or the first open
//! position found by spillover search), computes the new coordinate and
//! commits the record together with the parent's slot claim.
//!
//! # Atomicity
//!
//! `place` takes `&mut self`, so the fullness check and the write cannot
//! interleave with another placement on the same engine. The store commit is
//! additionally a compare-and-swap on the parent slot; a shared engine must be
//! wrapped in a lock by its owner.

use crate::spillover::find_open_position;
use crate::stats::{network_stats, overview, MatrixOverview, NetworkStats};
use crate::traversal::{build_tree, upline, TreeNode};
use crate::{
    now_millis, Error, MatrixPosition, PlacementCommit, PositionStore, Result, SlotClaim, UserId,
};
use matrix_topology::{TopologyError, MATRIX_WIDTH, MAX_LEVELS};

/// Forced matrix over a position store.
#[derive(Debug, Default)]
pub struct MatrixEngine<S> {
    store: S,
}

impl<S: PositionStore> MatrixEngine<S> {
    /// Create an engine over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the engine, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Place `user` in the matrix, under `sponsor` if given.
    ///
    /// Without a sponsor the user becomes the root of a new tree.
    pub fn place(&mut self, user: UserId, sponsor: Option<UserId>) -> Result<MatrixPosition> {
        self.place_at(user, sponsor, now_millis())
    }

    /// [`MatrixEngine::place`] with an explicit placement timestamp.
    pub fn place_at(
        &mut self,
        user: UserId,
        sponsor: Option<UserId>,
        placed_at: u64,
    ) -> Result<MatrixPosition> {
        let result = self.try_place(user, sponsor, placed_at);
        match &result {
            Ok(position) => tracing::info!(
                user = %user,
                sponsor = ?sponsor.map(|s| s.0),
                parent = ?position.parent_id.map(|p| p.0),
                level = position.level,
                position = position.position,
                spillover = position.is_spillover(),
                "placed user in matrix"
            ),
            Err(Error::ParentFull(parent)) => tracing::error!(
                user = %user,
                parent = %parent,
                "chosen parent had no free slot"
            ),
            Err(e) => tracing::warn!(
                user = %user,
                sponsor = ?sponsor.map(|s| s.0),
                error = %e,
                "placement refused"
            ),
        }
        result
    }

    fn try_place(
        &mut self,
        user: UserId,
        sponsor: Option<UserId>,
        placed_at: u64,
    ) -> Result<MatrixPosition> {
        if self.store.get(user)?.is_some() {
            return Err(Error::AlreadyPlaced(user));
        }

        let Some(sponsor_id) = sponsor else {
            let root = MatrixPosition::root(user, placed_at);
            self.store.commit(&PlacementCommit {
                position: root.clone(),
                claim: None,
            })?;
            return Ok(root);
        };

        let sponsor_position = self
            .store
            .get_active(sponsor_id)?
            .ok_or(Error::NoSponsorPosition(sponsor_id))?;

        let parent = if sponsor_position.is_full() {
            tracing::debug!(sponsor = %sponsor_id, "sponsor is full, searching downline");
            find_open_position(&self.store, &sponsor_position)?
                .ok_or(Error::MatrixFull(sponsor_id))?
        } else {
            sponsor_position
        };

        let commit = child_commit(&parent, user, sponsor_id, placed_at)?;
        self.store.commit(&commit)?;
        Ok(commit.position)
    }

    /// Activate or deactivate a member's position.
    ///
    /// Inactive positions keep their place in the tree but cannot sponsor,
    /// receive spillover, or count towards statistics.
    pub fn set_active(&mut self, user: UserId, active: bool) -> Result<bool> {
        let changed = self.store.set_active(user, active)?;
        if changed {
            tracing::info!(user = %user, active, "matrix position state changed");
        }
        Ok(changed)
    }

    /// Active position of `user`, if any.
    pub fn position(&self, user: UserId) -> Result<Option<MatrixPosition>> {
        self.store.get_active(user)
    }

    /// First position at or below `start` able to take a child.
    pub fn find_open_position(&self, start: &MatrixPosition) -> Result<Option<MatrixPosition>> {
        find_open_position(&self.store, start)
    }

    /// Tree snapshot under `user`, `max_depth` generations deep.
    ///
    /// Returns `None` when the user has no active position.
    pub fn build_tree(&self, user: UserId, max_depth: u8) -> Result<Option<TreeNode>> {
        match self.store.get_active(user)? {
            Some(position) => Ok(Some(build_tree(&self.store, &position, max_depth)?)),
            None => Ok(None),
        }
    }

    /// Tree snapshot under an already loaded position.
    pub fn tree_for(&self, position: &MatrixPosition, max_depth: u8) -> Result<TreeNode> {
        build_tree(&self.store, position, max_depth)
    }

    /// Downline report for `user`; an empty report when unplaced.
    pub fn network_stats(&self, user: UserId) -> Result<NetworkStats> {
        match self.store.get_active(user)? {
            Some(position) => network_stats(&self.store, &position),
            None => Ok(NetworkStats::empty(user)),
        }
    }

    /// Ancestors of `user`, nearest first, at most `max_levels`.
    pub fn upline(&self, user: UserId, max_levels: u8) -> Result<Vec<MatrixPosition>> {
        match self.store.get_active(user)? {
            Some(position) => upline(&self.store, &position, max_levels),
            None => Ok(Vec::new()),
        }
    }

    /// Matrix-wide fill report.
    pub fn overview(&self) -> Result<MatrixOverview> {
        overview(&self.store)
    }
}

/// Build the commit that places `user` in the first open slot of `parent`.
fn child_commit(
    parent: &MatrixPosition,
    user: UserId,
    sponsor: UserId,
    placed_at: u64,
) -> Result<PlacementCommit> {
    let slot = parent
        .first_open_slot()
        .ok_or(Error::ParentFull(parent.user_id))?;

    let coord = parent.coord().child(slot).map_err(|e| match e {
        TopologyError::LevelOutOfRange { level, max } => Error::MaxDepthExceeded { level, max },
        _ => Error::MaxDepthExceeded {
            level: parent.level.saturating_add(1),
            max: MAX_LEVELS,
        },
    })?;

    Ok(PlacementCommit {
        position: MatrixPosition {
            user_id: user,
            sponsor_id: Some(sponsor),
            parent_id: Some(parent.user_id),
            tree_root: parent.tree_root,
            level: coord.level,
            position: coord.position,
            children: [None; MATRIX_WIDTH],
            is_active: true,
            placed_at,
        },
        claim: Some(SlotClaim {
            parent: parent.user_id,
            slot,
        }),
    })
}
