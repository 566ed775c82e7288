//! Error types shared by every estimator and decoder in the crate.

use thiserror::Error;

/// Unified error type for HMM estimation, inference and evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HmmError {
    /// No usable observations, or a state/symbol count that cannot be inferred.
    #[error("estimation error: {0}")]
    Estimation(String),

    /// A state or symbol value lies outside its declared range, or two
    /// shapes that must agree do not.
    #[error("dimension mismatch: {what} at index {index} is {value}, expected < {bound}")]
    DimensionMismatch {
        what: &'static str,
        index: usize,
        value: usize,
        bound: usize,
    },

    /// Decoding or posterior inference was asked to run on a zero-length sequence.
    #[error("observation sequence is empty")]
    EmptySequence,

    /// Out-of-range configuration value (smoothing, tolerance, iteration budget, labels).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Probability vector or matrix row that is not a distribution.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HmmError>;

impl HmmError {
    pub(crate) fn out_of_range(what: &'static str, index: usize, value: usize, bound: usize) -> Self {
        HmmError::DimensionMismatch {
            what,
            index,
            value,
            bound,
        }
    }
}
