//! Solver configuration and secular stall policy.

use ti_core::numeric::DEFAULT_ROUNDING_TOL;

/// How the secular bisection decides that a bracket can make no more progress.
///
/// A stalled bracket abandons that root; the stall is counted and logged but
/// does not fail the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StallCriterion {
    /// Only the iteration cap stalls. A bracket that shrinks to
    /// floating-point resolution yields its midpoint as the root.
    #[default]
    BracketCollapse,

    /// Two successive midpoint residuals are bit-identical.
    ///
    /// Cheaper to evaluate, but can fire early on flat stretches of the
    /// secular function.
    RepeatedResidual,
}

impl StallCriterion {
    /// Convert criterion to human-readable name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            StallCriterion::BracketCollapse => "BracketCollapse",
            StallCriterion::RepeatedResidual => "RepeatedResidual",
        }
    }

    /// Parse a criterion name as produced by [`StallCriterion::as_str`]
    /// (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bracketcollapse" | "bracket_collapse" => Some(StallCriterion::BracketCollapse),
            "repeatedresidual" | "repeated_residual" => Some(StallCriterion::RepeatedResidual),
            _ => None,
        }
    }
}

/// QCQP solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Rounding tolerance for eigenvalues, the Schur operator and pole merging
    pub tolerance: f64,
    /// Secular convergence threshold on |f(v)|, scaled by max(1, |c|)
    pub residual_tol: f64,
    /// Relative tolerance for accepting a back-mapped candidate
    pub verify_tol: f64,
    /// Maximum bisection iterations per bracket
    pub max_bisection_iters: usize,
    /// Stall detection policy
    pub stall_criterion: StallCriterion,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_ROUNDING_TOL,
            residual_tol: 1e-8,
            verify_tol: 1e-6,
            max_bisection_iters: 500,
            stall_criterion: StallCriterion::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criterion_names_are_stable() {
        assert_eq!(StallCriterion::BracketCollapse.as_str(), "BracketCollapse");
        assert_eq!(StallCriterion::RepeatedResidual.as_str(), "RepeatedResidual");
    }

    #[test]
    fn criterion_parse_round_trips() {
        for c in [StallCriterion::BracketCollapse, StallCriterion::RepeatedResidual] {
            assert_eq!(StallCriterion::parse(c.as_str()), Some(c));
        }
        assert_eq!(
            StallCriterion::parse("repeated_residual"),
            Some(StallCriterion::RepeatedResidual)
        );
        assert_eq!(StallCriterion::parse("newton"), None);
    }

    #[test]
    fn default_config_uses_documented_tolerances() {
        let cfg = SolverConfig::default();
        assert_eq!(cfg.tolerance, 1e-10);
        assert_eq!(cfg.residual_tol, 1e-8);
        assert_eq!(cfg.stall_criterion, StallCriterion::BracketCollapse);
        assert!(cfg.max_bisection_iters > 100);
    }
}
