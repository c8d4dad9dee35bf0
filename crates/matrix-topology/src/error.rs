//! Error types for matrix-topology.

use thiserror::Error;

/// Errors produced by coordinate arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Slot numbers are 1 (left), 2 (middle) or 3 (right).
    #[error("invalid slot number {0}, expected 1..=3")]
    InvalidSlot(u8),

    /// A coordinate would sit below the deepest allowed level.
    #[error("level {level} exceeds the matrix depth of {max}")]
    LevelOutOfRange { level: u8, max: u8 },

    /// The position number does not exist on that level.
    #[error("position {position} does not exist on level {level}")]
    InvalidPosition { level: u8, position: u32 },
}
