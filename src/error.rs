//! Error types shared across the simulation core.

use std::fmt;

/// Why an attach request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachRefusal {
    /// Item and holder are the same character
    SelfAttach,
    /// The item is stored in a pack
    Packed,
    /// The item is already held or ridden
    AlreadyAttached,
    /// The holder's model has no such grip
    SlotInvalid,
    /// The holder's hand is full
    SlotOccupied,
    /// The holder is itself held by someone, so it cannot carry a mount
    MountHeld,
    /// Attaching would close a loop in the holder chain
    WouldCycle,
    /// Dead characters do not pick things up
    HolderDead,
}

impl fmt::Display for AttachRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AttachRefusal::SelfAttach => "item and holder are the same",
            AttachRefusal::Packed => "item is packed",
            AttachRefusal::AlreadyAttached => "item is already attached",
            AttachRefusal::SlotInvalid => "holder has no such slot",
            AttachRefusal::SlotOccupied => "holder slot is occupied",
            AttachRefusal::MountHeld => "mount is held",
            AttachRefusal::WouldCycle => "attachment would create a cycle",
            AttachRefusal::HolderDead => "holder is dead",
        };
        f.write_str(text)
    }
}

/// Errors reported by simulation operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("invalid reference: {0}")]
    InvalidReference(&'static str),
    #[error("bounding volume is empty")]
    EmptyBoundingVolume,
    #[error("octagonal axis index {0} is out of range")]
    OutOfRange(usize),
    #[error("model missing for character")]
    ModelMissing,
    #[error("attachment refused: {0}")]
    AttachRefused(AttachRefusal),
    #[error("pack is full")]
    PackFull,
    #[error("item is kursed")]
    Kursed,
    #[error("configuration rejected: {0}")]
    InvalidConfig(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
