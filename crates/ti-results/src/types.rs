//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub case_name: String,
    pub timestamp: String,
    pub solver_version: String,
    pub horizon: usize,
    pub summary: RunSummary,
}

/// Line counts for one run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_total: usize,
    pub analyzed: usize,
    pub skipped: usize,
    pub solved: usize,
    pub no_instanton: usize,
    pub failed: usize,
    pub stalls: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LineOutcome {
    /// A verified instanton was found
    Solved,
    /// The thermal limit cannot be reached
    NoInstanton,
    /// The solve raised an error; the line scores `+∞`
    Failed { reason: String },
}

impl LineOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            LineOutcome::Solved => "solved",
            LineOutcome::NoInstanton => "no-instanton",
            LineOutcome::Failed { .. } => "failed",
        }
    }
}

/// Per-line instanton, one JSON line in `lines.jsonl`.
///
/// `score` is `None` when the line has no instanton (score `+∞`); the
/// per-step vectors are empty in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub line_id: String,
    pub name: String,
    pub outcome: LineOutcome,
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    /// `[step][farm]` wind deviations
    #[serde(default)]
    pub deviations: Vec<Vec<f64>>,
    /// `[step][bus]` phase angles
    #[serde(default)]
    pub angles: Vec<Vec<f64>>,
    #[serde(default)]
    pub mismatches: Vec<f64>,
    #[serde(default)]
    pub angle_diffs: Vec<f64>,
    #[serde(default)]
    pub stalls: usize,
}

impl LineRecord {
    pub fn score_or_inf(&self) -> f64 {
        self.score.unwrap_or(f64::INFINITY)
    }
}

/// RFC 3339 timestamp for a new manifest.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
