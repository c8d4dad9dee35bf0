//! Read-only walks over the matrix: tree snapshots and upline chains.

use crate::{MatrixPosition, PositionStore, Result, UserId};
use matrix_topology::MAX_LEVELS;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One node of a tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Member at this node
    pub user_id: UserId,
    /// Member who recruited them; `None` for a root
    pub sponsor_id: Option<UserId>,
    /// Absolute matrix level
    pub level: u8,
    /// Position number within the level
    pub position: u32,
    /// All three slots occupied
    pub is_full: bool,
    /// Inactive members stay in the snapshot, flagged here
    pub is_active: bool,
    /// Occupied slots in left, middle, right order, cut at the requested depth
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(position: &MatrixPosition) -> Self {
        Self {
            user_id: position.user_id,
            sponsor_id: position.sponsor_id,
            level: position.level,
            position: position.position,
            is_full: position.is_full(),
            is_active: position.is_active,
            children: Vec::new(),
        }
    }

    /// Nodes in this snapshot, root included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    /// Generations below this node present in the snapshot.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Snapshot the subtree under `root`, `max_depth` generations deep.
///
/// `max_depth = 0` yields just the root. The depth is clamped to
/// `MAX_LEVELS`; a user already seen on the current walk is not expanded
/// twice.
pub fn build_tree<S: PositionStore + ?Sized>(
    store: &S,
    root: &MatrixPosition,
    max_depth: u8,
) -> Result<TreeNode> {
    let mut seen = HashSet::new();
    seen.insert(root.user_id);
    descend(store, root, max_depth.min(MAX_LEVELS), &mut seen)
}

fn descend<S: PositionStore + ?Sized>(
    store: &S,
    position: &MatrixPosition,
    remaining: u8,
    seen: &mut HashSet<UserId>,
) -> Result<TreeNode> {
    let mut node = TreeNode::leaf(position);
    if remaining == 0 {
        return Ok(node);
    }

    for child_id in position.child_ids() {
        if !seen.insert(child_id) {
            continue;
        }
        if let Some(child) = store.get(child_id)? {
            node.children.push(descend(store, &child, remaining - 1, seen)?);
        }
    }
    Ok(node)
}

/// Ancestors of `position` from its tree parent upward, at most `max_levels`.
pub fn upline<S: PositionStore + ?Sized>(
    store: &S,
    position: &MatrixPosition,
    max_levels: u8,
) -> Result<Vec<MatrixPosition>> {
    let limit = max_levels.min(MAX_LEVELS) as usize;
    let mut chain = Vec::with_capacity(limit);
    let mut seen = HashSet::from([position.user_id]);
    let mut next = position.parent_id;

    while let Some(parent_id) = next {
        if chain.len() >= limit || !seen.insert(parent_id) {
            break;
        }
        let Some(parent) = store.get(parent_id)? else {
            tracing::warn!(user = %position.user_id, parent = %parent_id, "upline references a missing position");
            break;
        };
        next = parent.parent_id;
        chain.push(parent);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatrixEngine, MemoryStore};

    fn engine_with(count: u64) -> MatrixEngine<MemoryStore> {
        let mut engine = MatrixEngine::new(MemoryStore::new());
        engine.place(UserId(1), None).unwrap();
        for user in 2..=count {
            engine.place(UserId(user), Some(UserId(1))).unwrap();
        }
        engine
    }

    #[test]
    fn depth_zero_is_just_the_root() {
        let engine = engine_with(4);
        let root = engine.store().get(UserId(1)).unwrap().unwrap();
        let tree = build_tree(engine.store(), &root, 0).unwrap();
        assert_eq!(tree.size(), 1);
        assert!(tree.is_full);
    }

    #[test]
    fn depth_limits_generations() {
        // Root + 3 children + 3 grandchildren
        let engine = engine_with(7);
        let root = engine.store().get(UserId(1)).unwrap().unwrap();

        let shallow = build_tree(engine.store(), &root, 1).unwrap();
        assert_eq!(shallow.size(), 4);
        assert_eq!(shallow.depth(), 1);

        let deep = build_tree(engine.store(), &root, 5).unwrap();
        assert_eq!(deep.size(), 7);
        assert_eq!(deep.depth(), 2);
        assert_eq!(
            deep.children[0].children.iter().map(|c| c.user_id).collect::<Vec<_>>(),
            vec![UserId(5), UserId(6), UserId(7)]
        );
    }

    #[test]
    fn snapshot_is_repeatable() {
        let engine = engine_with(10);
        let root = engine.store().get(UserId(1)).unwrap().unwrap();
        let first = build_tree(engine.store(), &root, MAX_LEVELS).unwrap();
        let second = build_tree(engine.store(), &root, MAX_LEVELS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn upline_walks_to_root() {
        let engine = engine_with(7);
        let leaf = engine.store().get(UserId(7)).unwrap().unwrap();
        let chain = upline(engine.store(), &leaf, MAX_LEVELS).unwrap();
        let ids: Vec<_> = chain.iter().map(|p| p.user_id).collect();
        assert_eq!(ids, vec![UserId(2), UserId(1)]);

        let capped = upline(engine.store(), &leaf, 1).unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn root_has_empty_upline() {
        let engine = engine_with(1);
        let root = engine.store().get(UserId(1)).unwrap().unwrap();
        assert!(upline(engine.store(), &root, MAX_LEVELS).unwrap().is_empty());
    }
}
