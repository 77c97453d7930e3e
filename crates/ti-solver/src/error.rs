//! Error types for solver operations.

use thiserror::Error;
use ti_core::error::TiError;

/// Errors that can occur while reducing or solving an instanton QCQP.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Dimension mismatch: {what}")]
    Dimension { what: String },

    #[error("Ill-posed constraint system: {what}")]
    IllPosed { what: String },

    #[error("Degenerate at-pole block: {what}")]
    DegenerateBlock { what: String },

    #[error("Unsupported thermal form: {what}")]
    IndefiniteThermalForm { what: String },

    #[error("Secular root search stalled on every bracket ({stalls} stalls, no candidate)")]
    StalledRoot { stalls: usize },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Core error: {0}")]
    Core(#[from] TiError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for TiError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Dimension { what: _ } => TiError::InvalidArg { what: "dimension" },
            SolverError::IllPosed { what: _ } => TiError::InvalidArg {
                what: "constraint system",
            },
            SolverError::DegenerateBlock { what: _ } => TiError::InvalidArg {
                what: "at-pole block",
            },
            SolverError::IndefiniteThermalForm { what: _ } => TiError::InvalidArg {
                what: "thermal form",
            },
            SolverError::StalledRoot { stalls: _ } => TiError::InvalidArg {
                what: "secular root",
            },
            SolverError::Numeric { what: _ } => TiError::InvalidArg { what: "numeric" },
            SolverError::Core(e) => e,
        }
    }
}
