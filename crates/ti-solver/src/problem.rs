//! Problem definition for a single-line instanton QCQP.

use crate::error::{SolverError, SolverResult};
use crate::quadratic::QuadraticForm;
use nalgebra::{DMatrix, DVector};

/// Linear equality system `A x = b` with `m ≤ n`.
///
/// Full row rank is required; it is checked where the factorizations happen
/// (translation and null-space construction), not here.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
}

impl LinearSystem {
    pub fn new(matrix: DMatrix<f64>, rhs: DVector<f64>) -> SolverResult<Self> {
        if rhs.len() != matrix.nrows() {
            return Err(SolverError::Dimension {
                what: format!(
                    "rhs has length {} but constraint matrix has {} rows",
                    rhs.len(),
                    matrix.nrows()
                ),
            });
        }
        if matrix.nrows() > matrix.ncols() {
            return Err(SolverError::IllPosed {
                what: format!(
                    "{} constraints on {} unknowns",
                    matrix.nrows(),
                    matrix.ncols()
                ),
            });
        }
        Ok(Self { matrix, rhs })
    }

    /// Stack a fixed block on top of a per-line block: `[top; bottom]`,
    /// `[top_rhs; bottom_rhs]`.
    pub fn stacked(
        top: &DMatrix<f64>,
        top_rhs: &DVector<f64>,
        bottom: &DMatrix<f64>,
        bottom_rhs: &DVector<f64>,
    ) -> SolverResult<Self> {
        if top.ncols() != bottom.ncols() {
            return Err(SolverError::Dimension {
                what: format!(
                    "cannot stack blocks with {} and {} columns",
                    top.ncols(),
                    bottom.ncols()
                ),
            });
        }
        let m1 = top.nrows();
        let matrix = DMatrix::from_fn(m1 + bottom.nrows(), top.ncols(), |i, j| {
            if i < m1 { top[(i, j)] } else { bottom[(i - m1, j)] }
        });
        let rhs = DVector::from_iterator(
            top_rhs.len() + bottom_rhs.len(),
            top_rhs.iter().chain(bottom_rhs.iter()).copied(),
        );
        Self::new(matrix, rhs)
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Euclidean norm of `A x - b`.
    pub fn residual_norm(&self, x: &DVector<f64>) -> f64 {
        (&self.matrix * x - &self.rhs).norm()
    }
}

/// One QCQP: minimize `objective(x)` subject to `constraints` and
/// `thermal(x) = 0`. The last `horizon` unknowns carry the thermal variables.
#[derive(Debug, Clone)]
pub struct InstantonProblem {
    pub objective: QuadraticForm,
    pub thermal: QuadraticForm,
    pub constraints: LinearSystem,
    pub horizon: usize,
}

impl InstantonProblem {
    pub fn new(
        objective: QuadraticForm,
        thermal: QuadraticForm,
        constraints: LinearSystem,
        horizon: usize,
    ) -> SolverResult<Self> {
        let n = constraints.cols();
        if objective.dim() != n || thermal.dim() != n {
            return Err(SolverError::Dimension {
                what: format!(
                    "objective ({}) and thermal ({}) forms must match {} unknowns",
                    objective.dim(),
                    thermal.dim(),
                    n
                ),
            });
        }
        if horizon > n {
            return Err(SolverError::Dimension {
                what: format!("horizon {horizon} exceeds {n} unknowns"),
            });
        }
        Ok(Self {
            objective,
            thermal,
            constraints,
            horizon,
        })
    }

    pub fn dim(&self) -> usize {
        self.constraints.cols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacked_concatenates_rows() {
        let top = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let bottom = DMatrix::from_row_slice(1, 3, &[0.0, 1.0, -1.0]);
        let sys = LinearSystem::stacked(
            &top,
            &DVector::from_vec(vec![4.0]),
            &bottom,
            &DVector::zeros(1),
        )
        .unwrap();
        assert_eq!(sys.rows(), 2);
        assert_eq!(sys.matrix()[(1, 2)], -1.0);
        assert_eq!(sys.rhs()[0], 4.0);
        assert_eq!(sys.rhs()[1], 0.0);
    }

    #[test]
    fn overdetermined_system_is_rejected() {
        let err = LinearSystem::new(DMatrix::zeros(3, 2), DVector::zeros(3)).unwrap_err();
        assert!(matches!(err, SolverError::IllPosed { .. }));
    }

    #[test]
    fn horizon_larger_than_dimension_is_rejected() {
        let sys = LinearSystem::new(DMatrix::from_row_slice(1, 2, &[1.0, 1.0]), DVector::zeros(1))
            .unwrap();
        let q = QuadraticForm::pure(DMatrix::identity(2, 2)).unwrap();
        let err = InstantonProblem::new(q.clone(), q, sys, 3).unwrap_err();
        assert!(matches!(err, SolverError::Dimension { .. }));
    }
}
