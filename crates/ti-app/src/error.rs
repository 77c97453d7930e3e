//! Error types for the ti-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// provides a unified error interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Case error: {0}")]
    Case(String),

    #[error("Failed to read case file: {path}")]
    CaseFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Case validation failed: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Line not found: {0}")]
    LineNotFound(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ti-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ti_case::CaseError> for AppError {
    fn from(err: ti_case::CaseError) -> Self {
        match err {
            ti_case::CaseError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Case(other.to_string()),
        }
    }
}

impl From<ti_network::NetworkError> for AppError {
    fn from(err: ti_network::NetworkError) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<ti_solver::SolverError> for AppError {
    fn from(err: ti_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<ti_results::ResultsError> for AppError {
    fn from(err: ti_results::ResultsError) -> Self {
        match err {
            ti_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            ti_results::ResultsError::LineNotFound { line_id, .. } => {
                AppError::LineNotFound(line_id)
            }
            other => AppError::Results(other.to_string()),
        }
    }
}
