//! Typed accumulation of per-line instantons.

use nalgebra::DVector;
use ti_core::LineId;
use ti_network::InstantonProfile;
use ti_results::{LineOutcome, LineRecord, RunSummary};

use crate::case_service::CompiledCase;

/// Outcome of solving one line.
#[derive(Debug, Clone)]
pub struct LineResult {
    pub line: LineId,
    pub name: String,
    pub outcome: LineOutcome,
    /// `+∞` without an instanton
    pub score: f64,
    pub multiplier: Option<f64>,
    pub profile: InstantonProfile,
    /// Raw solution vector, empty without an instanton
    pub x: DVector<f64>,
    pub stalls: usize,
}

/// Per-field result vectors indexed by analyzed-line position.
///
/// Zero-length lines are never analyzed; their ids land in `skipped`.
#[derive(Debug, Clone, Default)]
pub struct InstantonResults {
    pub line_ids: Vec<LineId>,
    pub names: Vec<String>,
    pub outcomes: Vec<LineOutcome>,
    pub scores: Vec<f64>,
    pub multipliers: Vec<Option<f64>>,
    pub deviations: Vec<Vec<Vec<f64>>>,
    pub angles: Vec<Vec<Vec<f64>>>,
    pub mismatches: Vec<Vec<f64>>,
    pub angle_diffs: Vec<Vec<f64>>,
    pub solutions: Vec<DVector<f64>>,
    pub stalls: Vec<usize>,
    pub skipped: Vec<LineId>,
}

impl InstantonResults {
    pub fn push(&mut self, result: LineResult) {
        let LineResult {
            line,
            name,
            outcome,
            score,
            multiplier,
            profile,
            x,
            stalls,
        } = result;
        self.line_ids.push(line);
        self.names.push(name);
        self.outcomes.push(outcome);
        self.scores.push(score);
        self.multipliers.push(multiplier);
        self.deviations.push(profile.deviations);
        self.angles.push(profile.angles);
        self.mismatches.push(profile.mismatches);
        self.angle_diffs.push(profile.angle_diffs);
        self.solutions.push(x);
        self.stalls.push(stalls);
    }

    /// Number of analyzed lines.
    pub fn len(&self) -> usize {
        self.line_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_ids.is_empty()
    }

    /// Analyzed position of a line, if it was analyzed.
    pub fn position(&self, line: LineId) -> Option<usize> {
        self.line_ids.iter().position(|id| *id == line)
    }

    /// Analyzed positions ordered by increasing score; ties keep line order.
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.scores[a].total_cmp(&self.scores[b]));
        order
    }

    pub fn summary(&self) -> RunSummary {
        let count = |label: &str| self.outcomes.iter().filter(|o| o.label() == label).count();
        RunSummary {
            lines_total: self.len() + self.skipped.len(),
            analyzed: self.len(),
            skipped: self.skipped.len(),
            solved: count("solved"),
            no_instanton: count("no-instanton"),
            failed: count("failed"),
            stalls: self.stalls.iter().sum(),
        }
    }

    /// Persistable records keyed by the case's line ids.
    pub fn to_records(&self, compiled: &CompiledCase) -> Vec<LineRecord> {
        (0..self.len())
            .map(|i| LineRecord {
                line_id: compiled.line_key(self.line_ids[i]).to_string(),
                name: self.names[i].clone(),
                outcome: self.outcomes[i].clone(),
                score: Some(self.scores[i]).filter(|s| s.is_finite()),
                multiplier: self.multipliers[i],
                deviations: self.deviations[i].clone(),
                angles: self.angles[i].clone(),
                mismatches: self.mismatches[i].clone(),
                angle_diffs: self.angle_diffs[i].clone(),
                stalls: self.stalls[i],
            })
            .collect()
    }
}

impl FromIterator<LineResult> for InstantonResults {
    fn from_iter<I: IntoIterator<Item = LineResult>>(iter: I) -> Self {
        let mut results = Self::default();
        for result in iter {
            results.push(result);
        }
        results
    }
}
