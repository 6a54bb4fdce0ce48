//! Error types for POD surrogate training.
//!
//! Preconditions on input shapes are not silently tolerated anywhere in the
//! crate: violations surface as dedicated variants (`ShapeMismatch`,
//! `InsufficientGrids`, `InsufficientTimesteps`) so callers can tell a bad
//! input apart from a genuine numerical failure. Training-loop failures such
//! as non-finite losses are never caught or retried; they propagate to the
//! caller and terminate the run.

use thiserror::Error;

/// Result type alias for surrogate-model operations.
pub type Result<T> = std::result::Result<T, SurrogateError>;

/// Errors that can occur while building or training a POD surrogate.
#[derive(Debug, Error)]
pub enum SurrogateError {
    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Shape mismatch in matrix operations.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        actual: Vec<usize>,
    },

    /// Empty input where non-empty was required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Too few subgrids for the requested operation.
    #[error("need at least {required} subgrids, got {actual}")]
    InsufficientGrids {
        /// Minimum number of subgrids required.
        required: usize,
        /// Number of subgrids supplied.
        actual: usize,
    },

    /// Too few time samples after striding.
    #[error("need at least {required} time samples after striding, got {actual}")]
    InsufficientTimesteps {
        /// Minimum number of samples required.
        required: usize,
        /// Number of samples available.
        actual: usize,
    },

    /// The singular value decomposition could not be computed.
    #[error("singular value decomposition failed: {0}")]
    SvdFailed(String),

    /// Non-finite loss encountered during training.
    #[error("numerical instability at epoch {epoch}: {detail}")]
    NumericalInstability {
        /// Epoch in which the instability was observed.
        epoch: usize,
        /// Description of the offending value.
        detail: String,
    },

    /// Failure reported by an encoder/decoder/discriminator collaborator.
    #[error("model error: {0}")]
    Model(String),

    /// Artifact serialization or deserialization failure.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
