//! Error types for landfall operations.
//!
//! Fatal errors (`DataShape`, `EmptyPartition`) abort a selection run before
//! any model is fitted. `UnfittableConfiguration` is recovered per grid point
//! and only reaches the caller when a whole family cannot be fitted.

use thiserror::Error;

/// Main error type for landfall operations.
///
/// # Examples
///
/// ```
/// use landfall::error::LandfallError;
///
/// let err = LandfallError::DimensionMismatch {
///     expected: "100x10".to_string(),
///     actual: "100x5".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug, Error)]
pub enum LandfallError {
    /// Features and labels disagree, or the feature table holds values that
    /// are not usable numbers.
    #[error("Data shape error: {message}")]
    DataShape {
        /// Which precondition failed
        message: String,
    },

    /// A requested split or fold count leaves a partition empty.
    #[error("Empty partition: {message}")]
    EmptyPartition {
        /// Which partition would be empty and why
        message: String,
    },

    /// No grid point of a classifier family could be fitted.
    #[error("Unfittable configuration for {family}: {message}")]
    UnfittableConfiguration {
        /// Classifier family name
        family: String,
        /// Last underlying failure
        message: String,
    },

    /// Matrix/vector dimensions don't match for the operation.
    #[error("Matrix dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    #[error("Invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// An iterative solver could not produce a usable model.
    #[error("Convergence failure after {iterations} iterations: {message}")]
    ConvergenceFailure {
        /// Number of iterations attempted
        iterations: usize,
        /// What went wrong
        message: String,
    },

    /// Predict or transform was called before fit.
    #[error("{0} is not fitted; call fit() first")]
    NotFitted(&'static str),

    /// Invalid selection configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LandfallError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create a data shape error
    #[must_use]
    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::DataShape {
            message: message.into(),
        }
    }

    /// Create an empty partition error
    #[must_use]
    pub fn empty_partition(message: impl Into<String>) -> Self {
        Self::EmptyPartition {
            message: message.into(),
        }
    }

    /// Create an invalid hyperparameter error
    #[must_use]
    pub fn invalid_hyperparameter(
        param: &str,
        value: impl std::fmt::Display,
        constraint: &str,
    ) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Returns true for errors that abort a selection run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnfittableConfiguration { .. })
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, LandfallError>;
