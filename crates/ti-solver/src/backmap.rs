//! Mapping reduced points back to the original unknowns and selecting the
//! cheapest verified candidate.

use crate::config::SolverConfig;
use crate::problem::InstantonProblem;
use nalgebra::{DMatrix, DVector};

/// Composed affine map `x = x* + N U K⁻¹ (w + w0)`.
#[derive(Debug, Clone)]
pub struct TransformChain {
    /// Translation point `x*`
    pub origin: DVector<f64>,
    /// Null-space basis `N`
    pub basis: DMatrix<f64>,
    /// Thermal eigenvectors `U`
    pub eigenvectors: DMatrix<f64>,
    /// Scaling `K`
    pub scales: DVector<f64>,
    /// Square-completion shift `w0`
    pub shift: DVector<f64>,
}

impl TransformChain {
    pub fn reduced_dim(&self) -> usize {
        self.scales.len()
    }

    /// Original unknowns for reduced coordinates `w`.
    pub fn to_original(&self, w: &DVector<f64>) -> DVector<f64> {
        let total = w + &self.shift;
        let y = &self.eigenvectors * total.component_div(&self.scales);
        &self.origin + &self.basis * y
    }

    /// Reduced coordinates of a point in the original space; exact inverse of
    /// [`TransformChain::to_original`] on the feasible affine set.
    pub fn to_reduced(&self, x: &DVector<f64>) -> DVector<f64> {
        let y = self.basis.transpose() * (x - &self.origin);
        (self.eigenvectors.transpose() * y).component_mul(&self.scales) - &self.shift
    }
}

/// A back-mapped stationary point with its score and residuals.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Secular root or Lagrange multiplier that produced the point
    pub multiplier: f64,
    pub reduced: DVector<f64>,
    pub x: DVector<f64>,
    pub score: f64,
    pub thermal_residual: f64,
    pub linear_residual: f64,
}

impl Candidate {
    pub fn new(
        problem: &InstantonProblem,
        chain: &TransformChain,
        reduced: DVector<f64>,
        multiplier: f64,
    ) -> Self {
        let x = chain.to_original(&reduced);
        Self::at(problem, x, reduced, multiplier)
    }

    /// Candidate at an already known original point.
    pub fn at(
        problem: &InstantonProblem,
        x: DVector<f64>,
        reduced: DVector<f64>,
        multiplier: f64,
    ) -> Self {
        let score = problem.objective.evaluate(&x);
        let thermal_residual = problem.thermal.evaluate(&x);
        let linear_residual = problem.constraints.residual_norm(&x);
        Self {
            multiplier,
            reduced,
            x,
            score,
            thermal_residual,
            linear_residual,
        }
    }

    /// Whether both constraint residuals are within `verify_tol`, relative to
    /// the size of the terms involved.
    pub fn is_feasible(&self, problem: &InstantonProblem, config: &SolverConfig) -> bool {
        let quad = self.x.dot(&(problem.thermal.matrix() * &self.x)).abs();
        let thermal_scale = 1.0_f64
            .max(problem.thermal.constant().abs())
            .max(quad);
        let linear_scale = 1.0_f64.max(problem.constraints.rhs().norm());
        self.score.is_finite()
            && self.thermal_residual.abs() <= config.verify_tol * thermal_scale
            && self.linear_residual <= config.verify_tol * linear_scale
    }
}

/// Minimum-score candidate; ties keep the first.
pub fn select_minimum(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best: Option<&Candidate>, c| match best {
        Some(b) if b.score <= c.score => Some(b),
        _ => Some(c),
    })
}
