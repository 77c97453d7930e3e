//! Simultaneous reduction of the thermal form to a sum of squares.
//!
//! In null-space coordinates `y`, the thermal matrix is factored as `U D Uᵗ`.
//! Substituting `y = U K⁻¹ w` with `K = diag(√|D|)` (1 on the null directions)
//! turns it into `diag(1, …, 1, 0, …, 0)`. The objective is carried through the
//! same substitution. A final shift `w → w + w0` removes the linear thermal
//! term on the off-pole coordinates.

use crate::error::{SolverError, SolverResult};
use crate::quadratic::QuadraticForm;
use nalgebra::{DMatrix, DVector};
use ti_core::numeric::round_to;
use tracing::debug;

/// Both forms in the scaled eigen-coordinates `w`.
#[derive(Debug, Clone)]
pub struct Diagonalization {
    /// Thermal eigenvectors `U`, one per column
    pub eigenvectors: DMatrix<f64>,
    /// Scaling `K`
    pub scales: DVector<f64>,
    /// Square-completion shift `w0`
    pub shift: DVector<f64>,
    /// +1, or -1 when the thermal equation was negated to make it
    /// positive semidefinite
    pub orientation: f64,
    /// Coordinates with zero thermal weight
    pub at_pole: Vec<usize>,
    /// Coordinates with unit thermal weight
    pub off_pole: Vec<usize>,
    pub objective: QuadraticForm,
    pub thermal: QuadraticForm,
}

impl Diagonalization {
    pub fn dim(&self) -> usize {
        self.scales.len()
    }
}

/// Diagonalize `thermal` and apply the same substitution to `objective`.
///
/// Eigenvalues are rounded to `tol`. Mixed-sign spectra are rejected; an
/// all-negative spectrum negates the thermal equation first.
pub fn diagonalize(
    objective: &QuadraticForm,
    thermal: &QuadraticForm,
    tol: f64,
) -> SolverResult<Diagonalization> {
    let r = thermal.dim();
    if objective.dim() != r {
        return Err(SolverError::Dimension {
            what: format!(
                "objective has dimension {} but thermal form has {}",
                objective.dim(),
                r
            ),
        });
    }
    if r == 0 {
        return Ok(Diagonalization {
            eigenvectors: DMatrix::zeros(0, 0),
            scales: DVector::zeros(0),
            shift: DVector::zeros(0),
            orientation: 1.0,
            at_pole: Vec::new(),
            off_pole: Vec::new(),
            objective: objective.clone(),
            thermal: thermal.clone(),
        });
    }

    let eig = thermal.matrix().clone().symmetric_eigen();
    let mut values = eig.eigenvalues.map(|v| round_to(v, tol));

    let positives = values.iter().filter(|&&v| v > 0.0).count();
    let negatives = values.iter().filter(|&&v| v < 0.0).count();
    if positives > 0 && negatives > 0 {
        return Err(SolverError::IndefiniteThermalForm {
            what: format!(
                "thermal form has {positives} positive and {negatives} negative directions on the feasible set"
            ),
        });
    }

    let (thermal, orientation) = if negatives > 0 {
        values.neg_mut();
        (thermal.negate(), -1.0)
    } else {
        (thermal.clone(), 1.0)
    };

    let scales = values.map(|v| if v > 0.0 { v.sqrt() } else { 1.0 });
    let u = eig.eigenvectors;
    // Substitution matrix K⁻¹Uᵗ, so that y = (K⁻¹Uᵗ)ᵗ w.
    let sub = DMatrix::from_fn(r, r, |i, j| u[(j, i)] / scales[i]);

    let (off_pole, at_pole): (Vec<usize>, Vec<usize>) = (0..r).partition(|&i| values[i] > 0.0);
    let unit = DVector::from_fn(r, |i, _| if values[i] > 0.0 { 1.0 } else { 0.0 });

    let rotated_thermal = thermal.rotate(&sub);
    let snap_error = (rotated_thermal.matrix() - DMatrix::from_diagonal(&unit)).amax();
    let thermal = rotated_thermal
        .with_matrix(DMatrix::from_diagonal(&unit))
        .with_linear(rotated_thermal.linear().map(|v| round_to(v, tol)));
    let objective = objective.rotate(&sub);

    // Complete the square on the off-pole coordinates.
    let mut shift = DVector::zeros(r);
    for &i in &off_pole {
        shift[i] = -0.5 * thermal.linear()[i];
    }
    let objective = objective.translate(&shift);
    let thermal = thermal.translate(&shift);
    let mut linear = thermal.linear().clone();
    for &i in &off_pole {
        linear[i] = 0.0;
    }
    let thermal = thermal.with_linear(linear);

    debug!(
        dim = r,
        off_pole = off_pole.len(),
        at_pole = at_pole.len(),
        orientation,
        snap_error,
        "thermal form diagonalized"
    );

    Ok(Diagonalization {
        eigenvectors: u,
        scales,
        shift,
        orientation,
        at_pole,
        off_pole,
        objective,
        thermal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(rows: usize, data: &[f64], linear: &[f64], k: f64) -> QuadraticForm {
        QuadraticForm::new(
            DMatrix::from_row_slice(rows, rows, data),
            DVector::from_row_slice(linear),
            k,
        )
        .unwrap()
    }

    #[test]
    fn thermal_becomes_unit_diagonal() {
        let thermal = form(2, &[4.0, 0.0, 0.0, 9.0], &[0.0, 0.0], -1.0);
        let objective = form(2, &[1.0, 0.0, 0.0, 1.0], &[0.0, 0.0], 0.0);
        let d = diagonalize(&objective, &thermal, 1e-10).unwrap();
        assert_eq!(d.off_pole.len(), 2);
        assert!(d.at_pole.is_empty());
        assert_eq!(d.thermal.matrix(), &DMatrix::identity(2, 2));
        let mut scales: Vec<f64> = d.scales.iter().copied().collect();
        scales.sort_by(f64::total_cmp);
        assert!((scales[0] - 2.0).abs() < 1e-12);
        assert!((scales[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn null_directions_are_at_pole() {
        let thermal = form(2, &[1.0, 0.0, 0.0, 0.0], &[0.0, 0.0], -1.0);
        let objective = form(2, &[1.0, 0.0, 0.0, 1.0], &[0.0, 0.0], 0.0);
        let d = diagonalize(&objective, &thermal, 1e-10).unwrap();
        assert_eq!(d.off_pole.len(), 1);
        assert_eq!(d.at_pole.len(), 1);
        assert_eq!(d.scales[d.at_pole[0]], 1.0);
    }

    #[test]
    fn mixed_signs_are_rejected() {
        let thermal = form(2, &[1.0, 0.0, 0.0, -1.0], &[0.0, 0.0], 0.0);
        let objective = form(2, &[1.0, 0.0, 0.0, 1.0], &[0.0, 0.0], 0.0);
        assert!(matches!(
            diagonalize(&objective, &thermal, 1e-10),
            Err(SolverError::IndefiniteThermalForm { .. })
        ));
    }

    #[test]
    fn negative_definite_thermal_is_negated() {
        let thermal = form(1, &[-4.0], &[0.0], 1.0);
        let objective = form(1, &[1.0], &[0.0], 0.0);
        let d = diagonalize(&objective, &thermal, 1e-10).unwrap();
        assert_eq!(d.orientation, -1.0);
        assert_eq!(d.thermal.matrix()[(0, 0)], 1.0);
        assert!((d.thermal.constant() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn square_completion_removes_off_pole_linear_term() {
        let thermal = form(1, &[1.0], &[2.0], 0.0);
        let objective = form(1, &[1.0], &[0.0], 0.0);
        let d = diagonalize(&objective, &thermal, 1e-10).unwrap();
        assert_eq!(d.thermal.linear()[0], 0.0);
        // (w + 1)^2 - 1 about w0 = -1 leaves constant -1
        assert!((d.shift[0] + 1.0).abs() < 1e-12);
        assert!((d.thermal.constant() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn substitution_preserves_both_forms() {
        let thermal = form(2, &[2.0, 1.0, 1.0, 2.0], &[0.5, -0.25], -3.0);
        let objective = form(2, &[3.0, -1.0, -1.0, 1.0], &[1.0, 2.0], 0.5);
        let d = diagonalize(&objective, &thermal, 1e-10).unwrap();
        let w = DVector::from_vec(vec![0.3, -0.8]);
        let total = &w + &d.shift;
        let y = &d.eigenvectors * total.component_div(&d.scales);
        assert!((d.objective.evaluate(&w) - objective.evaluate(&y)).abs() < 1e-9);
        assert!((d.thermal.evaluate(&w) - thermal.evaluate(&y)).abs() < 1e-9);
    }
}
