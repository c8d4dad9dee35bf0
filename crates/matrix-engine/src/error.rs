//! Error types for matrix-engine.

use crate::UserId;
use matrix_topology::Slot;
use thiserror::Error;

/// Result type for matrix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a placement or store operation can fail.
///
/// Every variant aborts the enclosing placement; nothing is committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The sponsor has no active position to place under
    #[error("sponsor {0} has no active matrix position")]
    NoSponsorPosition(UserId),

    /// All three slots of the chosen parent are taken (invariant violation)
    #[error("parent position {0} has no free slot")]
    ParentFull(UserId),

    /// The new position would sit below the deepest level
    #[error("level {level} exceeds the matrix depth of {max}")]
    MaxDepthExceeded { level: u8, max: u8 },

    /// Spillover search found no open position under the sponsor
    #[error("no open position left under sponsor {0}")]
    MatrixFull(UserId),

    /// The user already occupies a position
    #[error("user {0} is already placed in the matrix")]
    AlreadyPlaced(UserId),

    /// The slot was claimed between the read and the commit
    #[error("slot {slot} under {parent} is already taken")]
    SlotTaken { parent: UserId, slot: Slot },

    /// A commit or lookup referenced a position that does not exist
    #[error("no matrix position for user {0}")]
    UnknownPosition(UserId),

    /// Backend failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether the failure is a business condition the caller should surface
    /// to the user, as opposed to a backend or invariant fault.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NoSponsorPosition(_)
                | Error::MaxDepthExceeded { .. }
                | Error::MatrixFull(_)
                | Error::AlreadyPlaced(_)
        )
    }
}
