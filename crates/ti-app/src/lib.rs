//! Shared application service layer for temporal instanton analysis.
//!
//! This crate provides the interface the CLI drives: case loading and
//! compilation, per-line analysis (serial or on the rayon pool), run
//! caching and result querying.

pub mod analysis;
pub mod case_service;
pub mod error;
pub mod progress;
pub mod query;
pub mod results;
pub mod run_service;

pub use analysis::{AnalysisOptions, analyze_lines, solve_line};
pub use case_service::{
    CompiledCase, LineSummary, compile_case, list_lines, load_case, solver_config, validate_case,
};
pub use error::{AppError, AppResult};
pub use progress::{LineProgress, RunProgressEvent, RunStage};
pub use results::{InstantonResults, LineResult};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, delete_run, ensure_run, ensure_run_with_progress,
    list_runs, load_line, load_run,
};
