//! Matrix position records.

use matrix_topology::{MatrixCoord, Slot, MATRIX_WIDTH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Identity of a network member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    /// Get the raw id.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One placed member of the matrix.
///
/// The three child fields hold user ids rather than references, so the whole
/// matrix is an arena keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixPosition {
    /// Member occupying this position
    pub user_id: UserId,

    /// Referrer credited with this member (not necessarily the tree parent)
    pub sponsor_id: Option<UserId>,

    /// Node whose child slot references this member; `None` for roots
    pub parent_id: Option<UserId>,

    /// Root of the tree this position belongs to
    pub tree_root: UserId,

    /// Generation, root = 1
    pub level: u8,

    /// One-based position number on the level, scoped to `tree_root`
    pub position: u32,

    /// Child user ids in left, middle, right order
    pub children: [Option<UserId>; MATRIX_WIDTH],

    /// Only active positions take part in placement and traversal
    pub is_active: bool,

    /// Unix timestamp in milliseconds
    pub placed_at: u64,
}

impl MatrixPosition {
    /// A new root position starting its own tree.
    pub fn root(user_id: UserId, placed_at: u64) -> Self {
        Self {
            user_id,
            sponsor_id: None,
            parent_id: None,
            tree_root: user_id,
            level: MatrixCoord::ROOT.level,
            position: MatrixCoord::ROOT.position,
            children: [None; MATRIX_WIDTH],
            is_active: true,
            placed_at,
        }
    }

    /// Coordinate of this position inside its tree.
    pub fn coord(&self) -> MatrixCoord {
        MatrixCoord {
            level: self.level,
            position: self.position,
        }
    }

    /// Whether this position is a tree root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether all three child slots are taken.
    pub fn is_full(&self) -> bool {
        self.children.iter().all(Option::is_some)
    }

    /// First empty slot in fill order.
    pub fn first_open_slot(&self) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| self.children[slot.index()].is_none())
    }

    /// Occupant of `slot`.
    pub fn child(&self, slot: Slot) -> Option<UserId> {
        self.children[slot.index()]
    }

    /// Slot under which `user` sits, if it is a direct child.
    pub fn slot_of(&self, user: UserId) -> Option<Slot> {
        Slot::ALL
            .into_iter()
            .find(|slot| self.children[slot.index()] == Some(user))
    }

    /// Filled children in left, middle, right order.
    pub fn child_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.children.iter().flatten().copied()
    }

    /// Number of filled slots.
    pub fn child_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }

    /// Whether this member was placed away from its sponsor.
    pub fn is_spillover(&self) -> bool {
        match (self.sponsor_id, self.parent_id) {
            (Some(sponsor), Some(parent)) => sponsor != parent,
            _ => false,
        }
    }
}

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
