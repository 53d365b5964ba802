//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum TrpoError {
    /// The replay buffer does not hold enough transitions for the requested batch.
    #[error("insufficient data: requested {requested} transitions, buffer holds {available}")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,
        /// Number of transitions currently stored.
        available: usize,
    },

    /// A persisted replay buffer was created with a different capacity.
    #[error("capacity mismatch: buffer configured for {expected}, stored state was saved with capacity {found}")]
    CapacityMismatch {
        /// Capacity of the live buffer.
        expected: usize,
        /// Capacity recorded in the serialized state.
        found: usize,
    },

    /// The replay buffer capacity must be positive.
    #[error("invalid capacity: {0}")]
    InvalidCapacity(usize),

    /// The action space is neither discrete-finite nor continuous-bounded.
    #[error("unsupported action space: {0}")]
    UnsupportedActionSpace(String),

    /// Two policies of different parameterizations were combined.
    #[error("policy mismatch: {0}")]
    PolicyMismatch(String),

    /// Configured and runtime tensor shapes disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}
