//! At-pole / off-pole block split and Schur reduction of the objective.

use crate::diagonalize::Diagonalization;
use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use ti_core::numeric::round_to;

/// Objective blocks after eliminating the at-pole coordinates.
///
/// With `w = [w1; w2]` split into at-pole (`w1`) and off-pole (`w2`)
/// coordinates and objective `w'Bw + b'w + k`:
/// `schur = B22 - B12ᵗ B11⁻¹ B12`, `schur_linear = b2 - B12ᵗ B11⁻¹ b1`.
#[derive(Debug, Clone)]
pub struct BlockReduction {
    pub at_pole: Vec<usize>,
    pub off_pole: Vec<usize>,
    pub b11_inv: DMatrix<f64>,
    pub b12: DMatrix<f64>,
    pub b1: DVector<f64>,
    pub schur: DMatrix<f64>,
    pub schur_linear: DVector<f64>,
    /// Linear thermal term on the at-pole coordinates
    pub thermal_linear: DVector<f64>,
    /// Constant of the thermal form
    pub thermal_constant: f64,
}

impl BlockReduction {
    /// Whether the thermal form has no linear term on the at-pole block.
    pub fn thermal_is_quadratic(&self, tol: f64) -> bool {
        self.thermal_linear.iter().all(|g| g.abs() <= tol)
    }

    /// At-pole coordinates minimizing the objective for fixed `w2`:
    /// `w1 = -B11⁻¹ (B12 w2 + b1/2)`.
    pub fn at_pole_response(&self, w2: &DVector<f64>) -> DVector<f64> {
        -(&self.b11_inv * (&self.b12 * w2 + &self.b1 * 0.5))
    }

    /// Scatter `w1` and `w2` back into reduced-coordinate order.
    pub fn assemble(&self, w1: &DVector<f64>, w2: &DVector<f64>) -> DVector<f64> {
        let mut w = DVector::zeros(self.at_pole.len() + self.off_pole.len());
        for (k, &i) in self.at_pole.iter().enumerate() {
            w[i] = w1[k];
        }
        for (k, &i) in self.off_pole.iter().enumerate() {
            w[i] = w2[k];
        }
        w
    }

    /// Stationary point when the thermal form is linear in `w1` and there are
    /// no off-pole coordinates: minimize `w1'B11w1 + b1'w1` on the hyperplane
    /// `g1'w1 + k = 0`.
    ///
    /// Returns `(w1, multiplier)`.
    pub fn linear_thermal_point(&self, tol: f64) -> SolverResult<(DVector<f64>, f64)> {
        let g = &self.thermal_linear;
        let mg = &self.b11_inv * g;
        let curvature = g.dot(&mg);
        if curvature.abs() <= tol {
            return Err(SolverError::DegenerateBlock {
                what: "thermal hyperplane normal is null for the at-pole objective".to_string(),
            });
        }
        let mb = &self.b11_inv * &self.b1;
        let multiplier = (0.5 * g.dot(&mb) - self.thermal_constant) / (0.5 * curvature);
        let w1 = -(mb - mg * multiplier) * 0.5;
        Ok((w1, multiplier))
    }
}

/// Split the diagonalized objective into blocks and form the Schur complement.
pub fn reduce_blocks(diag: &Diagonalization, tol: f64) -> SolverResult<BlockReduction> {
    let b = diag.objective.matrix();
    let lin = diag.objective.linear();
    let at = &diag.at_pole;
    let off = &diag.off_pole;

    let b11 = b.select_rows(at.iter()).select_columns(at.iter());
    let b12 = b.select_rows(at.iter()).select_columns(off.iter());
    let b22 = b.select_rows(off.iter()).select_columns(off.iter());
    let b1 = lin.select_rows(at.iter());
    let b2 = lin.select_rows(off.iter());

    let b11_inv = invert_block(b11, tol)?;

    let coupling = b12.transpose() * &b11_inv;
    let schur = (b22 - &coupling * &b12).map(|v| round_to(v, tol));
    let schur_linear = (b2 - &coupling * &b1).map(|v| round_to(v, tol));
    let schur = (&schur + schur.transpose()) * 0.5;

    Ok(BlockReduction {
        at_pole: at.clone(),
        off_pole: off.clone(),
        b11_inv,
        b12,
        b1,
        schur,
        schur_linear,
        thermal_linear: diag.thermal.linear().select_rows(at.iter()),
        thermal_constant: diag.thermal.constant(),
    })
}

fn invert_block(b11: DMatrix<f64>, tol: f64) -> SolverResult<DMatrix<f64>> {
    if b11.is_empty() {
        return Ok(DMatrix::zeros(0, 0));
    }
    let singular = b11.clone().svd(false, false).singular_values;
    let largest = singular.max();
    let smallest = singular.min();
    if smallest <= tol * largest.max(1.0) {
        return Err(SolverError::DegenerateBlock {
            what: format!(
                "at-pole objective block is singular (smallest singular value {smallest:.3e})"
            ),
        });
    }
    b11.try_inverse().ok_or_else(|| SolverError::DegenerateBlock {
        what: "at-pole objective block could not be inverted".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagonalize::diagonalize;
    use crate::quadratic::QuadraticForm;

    fn diag_of(objective: &[f64], linear: &[f64], thermal_diag: &[f64]) -> Diagonalization {
        let n = linear.len();
        let obj = QuadraticForm::new(
            DMatrix::from_row_slice(n, n, objective),
            DVector::from_row_slice(linear),
            0.0,
        )
        .unwrap();
        let th = QuadraticForm::level_set(
            DMatrix::from_diagonal(&DVector::from_row_slice(thermal_diag)),
            1.0,
        )
        .unwrap();
        diagonalize(&obj, &th, 1e-10).unwrap()
    }

    #[test]
    fn schur_complement_matches_hand_computation() {
        // Thermal weight only on the second coordinate: at-pole = {0}.
        let d = diag_of(&[2.0, 1.0, 1.0, 3.0], &[4.0, 1.0], &[0.0, 1.0]);
        let r = reduce_blocks(&d, 1e-10).unwrap();
        assert_eq!(r.at_pole.len(), 1);
        assert_eq!(r.off_pole.len(), 1);
        // B22 - B12^2/B11 = 3 - 1/2, b2 - B12 b1/B11 = 1 - 4/2 (up to eigenvector sign)
        assert!((r.schur[(0, 0)] - 2.5).abs() < 1e-9);
        assert!((r.schur_linear[0].abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn at_pole_response_is_stationary() {
        let d = diag_of(&[2.0, 1.0, 1.0, 3.0], &[4.0, 1.0], &[0.0, 1.0]);
        let r = reduce_blocks(&d, 1e-10).unwrap();
        let w2 = DVector::from_vec(vec![0.7]);
        let w1 = r.at_pole_response(&w2);
        let w = r.assemble(&w1, &w2);
        // gradient of the objective along the at-pole coordinate vanishes
        let grad = d.objective.matrix() * &w * 2.0 + d.objective.linear();
        assert!(grad[r.at_pole[0]].abs() < 1e-9);
    }

    #[test]
    fn singular_at_pole_block_is_degenerate() {
        let d = diag_of(&[0.0, 0.0, 0.0, 1.0], &[0.0, 0.0], &[0.0, 1.0]);
        assert!(matches!(
            reduce_blocks(&d, 1e-10),
            Err(SolverError::DegenerateBlock { .. })
        ));
    }

    #[test]
    fn no_at_pole_coordinates_keeps_objective() {
        let d = diag_of(&[2.0, 0.0, 0.0, 2.0], &[1.0, 1.0], &[1.0, 1.0]);
        let r = reduce_blocks(&d, 1e-10).unwrap();
        assert!(r.at_pole.is_empty());
        assert!((r.schur - DMatrix::identity(2, 2) * 2.0).amax() < 1e-9);
    }
}
