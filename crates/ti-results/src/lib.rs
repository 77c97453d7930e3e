//! ti-results: run cache and per-line instanton storage.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Line {line_id} not found in run {run_id}")]
    LineNotFound { run_id: String, line_id: String },

    #[error("Line {line_id} stored twice in run {run_id}")]
    DuplicateLine { run_id: String, line_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
