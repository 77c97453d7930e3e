//! Immutable quadratic forms `x'Qx + l'x + k`.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};

/// Quadratic form `x'Qx + l'x + k` with symmetric `Q`.
///
/// Every transformation returns a new instance.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticForm {
    matrix: DMatrix<f64>,
    linear: DVector<f64>,
    constant: f64,
}

impl QuadraticForm {
    /// Build a form, symmetrizing `matrix`.
    pub fn new(matrix: DMatrix<f64>, linear: DVector<f64>, constant: f64) -> SolverResult<Self> {
        if !matrix.is_square() {
            return Err(SolverError::Dimension {
                what: format!(
                    "quadratic matrix must be square, got {}x{}",
                    matrix.nrows(),
                    matrix.ncols()
                ),
            });
        }
        if linear.len() != matrix.nrows() {
            return Err(SolverError::Dimension {
                what: format!(
                    "linear term has length {} but matrix is {}x{}",
                    linear.len(),
                    matrix.nrows(),
                    matrix.ncols()
                ),
            });
        }
        if !constant.is_finite() || matrix.iter().chain(linear.iter()).any(|v| !v.is_finite()) {
            return Err(SolverError::Numeric {
                what: "quadratic form has non-finite entries".to_string(),
            });
        }
        Ok(Self::from_parts(matrix, linear, constant))
    }

    /// `(Q, 0, 0)`.
    pub fn pure(matrix: DMatrix<f64>) -> SolverResult<Self> {
        let n = matrix.nrows();
        Self::new(matrix, DVector::zeros(n), 0.0)
    }

    /// The equation `x'Qx = level` written as the zero set of `(Q, 0, -level)`.
    pub fn level_set(matrix: DMatrix<f64>, level: f64) -> SolverResult<Self> {
        let n = matrix.nrows();
        Self::new(matrix, DVector::zeros(n), -level)
    }

    fn from_parts(matrix: DMatrix<f64>, linear: DVector<f64>, constant: f64) -> Self {
        let matrix = (&matrix + matrix.transpose()) * 0.5;
        Self {
            matrix,
            linear,
            constant,
        }
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn linear(&self) -> &DVector<f64> {
        &self.linear
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Value of the form at `x`.
    pub fn evaluate(&self, x: &DVector<f64>) -> f64 {
        x.dot(&(&self.matrix * x)) + self.linear.dot(x) + self.constant
    }

    /// Re-express the form about `shift`: the result `h` satisfies
    /// `h(z) = self(z + shift)`.
    pub fn translate(&self, shift: &DVector<f64>) -> Self {
        let q_shift = &self.matrix * shift;
        let linear = &self.linear + &q_shift * 2.0;
        let constant = self.constant + shift.dot(&q_shift) + self.linear.dot(shift);
        Self {
            matrix: self.matrix.clone(),
            linear,
            constant,
        }
    }

    /// Substitute `x = Rᵗy`: the result is `(RQRᵗ, Rl, k)` in `y`.
    ///
    /// `r` may be rectangular (`p × n`), mapping onto a `p`-dimensional
    /// subspace.
    pub fn rotate(&self, r: &DMatrix<f64>) -> Self {
        let matrix = r * &self.matrix * r.transpose();
        let linear = r * &self.linear;
        Self::from_parts(matrix, linear, self.constant)
    }

    /// Multiply the whole form by -1 (same zero set).
    pub fn negate(&self) -> Self {
        Self {
            matrix: -&self.matrix,
            linear: -&self.linear,
            constant: -self.constant,
        }
    }

    /// Replace the quadratic matrix, keeping linear and constant terms.
    pub(crate) fn with_matrix(&self, matrix: DMatrix<f64>) -> Self {
        Self::from_parts(matrix, self.linear.clone(), self.constant)
    }

    /// Replace the linear term, keeping matrix and constant.
    pub(crate) fn with_linear(&self, linear: DVector<f64>) -> Self {
        Self {
            matrix: self.matrix.clone(),
            linear,
            constant: self.constant,
        }
    }
}
