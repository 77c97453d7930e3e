//! Query helpers for extracting data from loaded runs.

use std::fmt::Write;

use ti_results::LineRecord;

use crate::error::{AppError, AppResult};

/// Records ordered by increasing score; lines without an instanton last.
pub fn rank_lines(records: &[LineRecord]) -> Vec<&LineRecord> {
    let mut ranked: Vec<&LineRecord> = records.iter().collect();
    ranked.sort_by(|a, b| a.score_or_inf().total_cmp(&b.score_or_inf()));
    ranked
}

/// The `k` most vulnerable lines (smallest finite score).
pub fn top_k(records: &[LineRecord], k: usize) -> Vec<&LineRecord> {
    rank_lines(records)
        .into_iter()
        .filter(|r| r.score.is_some())
        .take(k)
        .collect()
}

/// Find a line record by case line id.
pub fn find_line<'a>(records: &'a [LineRecord], line_id: &str) -> AppResult<&'a LineRecord> {
    records
        .iter()
        .find(|r| r.line_id == line_id)
        .ok_or_else(|| AppError::LineNotFound(line_id.to_string()))
}

/// Per-step CSV of one line's instanton.
///
/// Columns: `step`, one deviation column per farm, one angle column per bus,
/// `mismatch`, `angle_diff`.
pub fn line_series_csv(
    record: &LineRecord,
    farm_ids: &[String],
    bus_ids: &[String],
) -> AppResult<String> {
    if record.score.is_none() {
        return Err(AppError::InvalidInput(format!(
            "Line '{}' has no instanton to export",
            record.line_id
        )));
    }
    let steps = record.mismatches.len();
    let shape_ok = record.deviations.len() == steps
        && record.angles.len() == steps
        && record.angle_diffs.len() == steps
        && record.deviations.iter().all(|d| d.len() == farm_ids.len())
        && record.angles.iter().all(|a| a.len() == bus_ids.len());
    if !shape_ok {
        return Err(AppError::InvalidInput(format!(
            "Line '{}' does not match {} farms and {} buses",
            record.line_id,
            farm_ids.len(),
            bus_ids.len()
        )));
    }

    let mut csv = String::from("step");
    for id in farm_ids {
        let _ = write!(csv, ",deviation_{id}");
    }
    for id in bus_ids {
        let _ = write!(csv, ",angle_{id}");
    }
    csv.push_str(",mismatch,angle_diff\n");

    for t in 0..steps {
        let _ = write!(csv, "{t}");
        for v in record.deviations[t].iter().chain(&record.angles[t]) {
            let _ = write!(csv, ",{v}");
        }
        let _ = writeln!(csv, ",{},{}", record.mismatches[t], record.angle_diffs[t]);
    }
    Ok(csv)
}
