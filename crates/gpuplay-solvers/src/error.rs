//! Error - Solver Error Types
//!
//! Running out of iterations is reported through
//! [`ConvergenceStatus`](crate::ConvergenceStatus), not as an error.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Solver-specific errors
#[derive(Error, Debug)]
pub enum SolverError {
    /// A tensor operation failed
    #[error(transparent)]
    Tensor(#[from] gpuplay_core::Error),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for solver operations
pub type SolverResult<T> = Result<T, SolverError>;

// =============================================================================
// Error Conversion
// =============================================================================

impl From<toml::de::Error> for SolverError {
    fn from(e: toml::de::Error) -> Self {
        SolverError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for SolverError {
    fn from(e: toml::ser::Error) -> Self {
        SolverError::Serialization(e.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
