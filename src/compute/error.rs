//! Error type shared by rows, rules and steppers.

/// Validation failures. Every one of them is detected before any state is
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutomatonError {
    #[error("Rule {0} is outside the elementary range 0-255")]
    InvalidRule(i128),
    #[error("Cannot parse rule from {0:?}")]
    InvalidRuleName(String),
    #[error("Index {index} out of range (bound {bound})")]
    OutOfRange { index: usize, bound: usize },
    #[error("Length {length} exceeds the {capacity} bits held by the supplied words")]
    InvalidConstruction { length: usize, capacity: usize },
    #[error("Invalid character {found:?} at position {position} in bit string")]
    InvalidBitString { position: usize, found: char },
    #[error("Advancing a row of length {length} by {generations} generations overflows")]
    LengthOverflow { length: usize, generations: u64 },
}
