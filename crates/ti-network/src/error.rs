//! Network construction and assembly errors.

use thiserror::Error;
use ti_core::{BusId, TiError};
use ti_solver::SolverError;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("{what} refers to non-existent bus {bus}")]
    InvalidBusRef { what: String, bus: BusId },

    #[error("Invalid value for {what}: {reason}")]
    InvalidValue { what: String, reason: String },

    #[error("{what} has {actual} time steps, expected {expected}")]
    SeriesLength {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Generator participation factors sum to {total}, expected 1")]
    Participation { total: f64 },

    #[error("Network has no {what}")]
    Empty { what: &'static str },

    #[error("Solver setup error: {0}")]
    Solver(#[from] SolverError),
}

pub type NetworkResult<T> = Result<T, NetworkError>;

impl From<NetworkError> for TiError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Solver(e) => e.into(),
            NetworkError::InvalidBusRef { .. } => TiError::InvalidArg { what: "bus reference" },
            NetworkError::SeriesLength { .. } => TiError::InvalidArg { what: "time series" },
            NetworkError::InvalidValue { .. }
            | NetworkError::Participation { .. }
            | NetworkError::Empty { .. } => TiError::InvalidArg { what: "network" },
        }
    }
}
