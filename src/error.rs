//! Error types for the agrostat library.
//!
//! This module provides the error taxonomy shared by every engine, using the
//! `thiserror` crate. Statistical failures (too little data, degenerate fits,
//! too few groups, numerical breakdown) are kept apart from plumbing failures
//! (unknown variables, wrong value kinds, invalid parameters).

use thiserror::Error;

/// The main error type for the agrostat library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Statistical Errors ============
    /// Too few rows remain after cleaning for the requested analysis.
    #[error("insufficient data: {message}")]
    InsufficientData {
        /// Description of what is missing.
        message: String,
    },

    /// The design matrix cannot support the requested fit.
    #[error("degenerate fit: {message}")]
    DegenerateFit {
        /// Description of the degeneracy.
        message: String,
    },

    /// Fewer than two groups carry usable data.
    #[error("insufficient groups for {grouping}: found {found}, need at least 2")]
    InsufficientGroups {
        /// The grouping variable.
        grouping: String,
        /// Number of groups with usable data.
        found: usize,
    },

    /// A statistic could not be computed (singular matrix, zero variance).
    #[error("numerical instability: {message}")]
    NumericalInstability {
        /// Description of the failure.
        message: String,
    },

    // ============ Table Errors ============
    /// The variable is not part of the table schema.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// The variable exists but holds the other kind of value.
    #[error("variable '{variable}' is {actual}, expected {expected}")]
    KindMismatch {
        /// The offending variable.
        variable: String,
        /// Kind required by the caller.
        expected: &'static str,
        /// Kind declared by the schema or found in the record.
        actual: &'static str,
    },

    // ============ Parameter Errors ============
    /// Invalid analysis parameters.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    /// Array dimensions are inconsistent.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },
}

/// A specialized `Result` type for agrostat operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InsufficientData` error.
    #[must_use]
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    /// Create a new `DegenerateFit` error.
    #[must_use]
    pub fn degenerate_fit(message: impl Into<String>) -> Self {
        Self::DegenerateFit {
            message: message.into(),
        }
    }

    /// Create a new `NumericalInstability` error.
    #[must_use]
    pub fn numerical_instability(message: impl Into<String>) -> Self {
        Self::NumericalInstability {
            message: message.into(),
        }
    }

    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }
}
