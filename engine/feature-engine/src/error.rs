//! Error types for the feature engine

use thiserror::Error;

/// Result type for feature engine operations
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while building player features
///
/// Only structurally malformed input is reported here. Small samples, missing
/// optional columns and regression failures resolve to documented defaults.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Game record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures inside the least-squares fit
///
/// These never leave the moving-average optimizer; they select the smoothing path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressionError {
    #[error("Design matrix is singular (rank {rank} < {columns})")]
    SingularMatrix { rank: usize, columns: usize },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Fit produced non-finite coefficients")]
    NonFinite,

    #[error("Decomposition failed: {0}")]
    Decomposition(&'static str),
}
