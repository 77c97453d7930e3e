//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use ti_case::CaseFile;

pub fn compute_run_id(case: &CaseFile, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let case_json = serde_json::to_string(case).unwrap_or_default();
    hasher.update(case_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
