//! Minimum-norm translation point and re-centering of both quadratics.

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::partition::Partition;
use crate::problem::LinearSystem;
use crate::quadratic::QuadraticForm;
use nalgebra::DVector;
use tracing::debug;

/// Objective and thermal forms re-expressed about the translation point.
#[derive(Debug, Clone)]
pub struct Translation {
    pub point: DVector<f64>,
    pub objective: QuadraticForm,
    pub thermal: QuadraticForm,
}

/// Minimum-Euclidean-norm solution of the constraints restricted to the free
/// (weighted + passive) columns, with every thermal column pinned to zero.
///
/// Solved through the normal equations `Z (ZᵗZ)⁻¹ b`, `Z` being the transpose of
/// the free column block.
pub fn translation_point(
    system: &LinearSystem,
    partition: &Partition,
    config: &SolverConfig,
) -> SolverResult<DVector<f64>> {
    let n = system.cols();
    if partition.len() != n {
        return Err(SolverError::Dimension {
            what: format!(
                "partition covers {} columns, constraints have {}",
                partition.len(),
                n
            ),
        });
    }

    let mut point = DVector::zeros(n);
    if system.rows() == 0 {
        return Ok(point);
    }

    let free = partition.free();
    let block = system.matrix().select_columns(free.iter());
    let gram = &block * block.transpose();
    let chol = gram.cholesky().ok_or_else(|| SolverError::IllPosed {
        what: "free columns do not span the constraint rows".to_string(),
    })?;

    let pivots = chol.l().diagonal();
    if pivots.iter().any(|p| !p.is_finite()) {
        return Err(SolverError::IllPosed {
            what: "normal equations produced non-finite pivots".to_string(),
        });
    }
    let largest = pivots.max();
    let smallest = pivots.min();
    if smallest <= config.tolerance.sqrt() * largest {
        return Err(SolverError::IllPosed {
            what: format!(
                "constraint rows are numerically dependent (pivot ratio {:.3e})",
                smallest / largest
            ),
        });
    }

    let coeffs = chol.solve(system.rhs());
    let sub = block.transpose() * coeffs;
    for (k, &j) in free.iter().enumerate() {
        point[j] = sub[k];
    }

    let residual = system.residual_norm(&point);
    if !(residual <= config.verify_tol * system.rhs().norm().max(1.0)) {
        return Err(SolverError::IllPosed {
            what: format!("translation point misses the constraints by {residual:.3e}"),
        });
    }

    debug!(
        norm = point.norm(),
        residual, "translation point computed"
    );
    Ok(point)
}

/// Re-center both forms about `point`.
pub fn translate_forms(
    objective: &QuadraticForm,
    thermal: &QuadraticForm,
    point: DVector<f64>,
) -> Translation {
    Translation {
        objective: objective.translate(&point),
        thermal: thermal.translate(&point),
        point,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition_columns;
    use nalgebra::DMatrix;

    #[test]
    fn pins_thermal_columns_and_satisfies_constraints() {
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let sys = LinearSystem::new(a, DVector::from_vec(vec![1.0])).unwrap();
        let q = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 0.0]));
        let part = partition_columns(&q, 1, 1e-10).unwrap();
        let x = translation_point(&sys, &part, &SolverConfig::default()).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert_eq!(x[1], 0.0);
    }

    #[test]
    fn picks_minimum_norm_among_free_columns() {
        let a = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]);
        let sys = LinearSystem::new(a, DVector::from_vec(vec![2.0])).unwrap();
        let q = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 0.0, 0.0]));
        let part = partition_columns(&q, 1, 1e-10).unwrap();
        let x = translation_point(&sys, &part, &SolverConfig::default()).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
        assert_eq!(x[2], 0.0);
    }

    #[test]
    fn dependent_rows_are_ill_posed() {
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 0.0, 2.0, 2.0, 0.0]);
        let sys = LinearSystem::new(a, DVector::from_vec(vec![1.0, 2.0])).unwrap();
        let q = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 1.0, 0.0]));
        let part = partition_columns(&q, 1, 1e-10).unwrap();
        let err = translation_point(&sys, &part, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::IllPosed { .. }));
    }

    #[test]
    fn rows_only_reachable_through_thermal_columns_are_ill_posed() {
        let a = DMatrix::from_row_slice(1, 2, &[0.0, 1.0]);
        let sys = LinearSystem::new(a, DVector::from_vec(vec![1.0])).unwrap();
        let q = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 0.0]));
        let part = partition_columns(&q, 1, 1e-10).unwrap();
        assert!(translation_point(&sys, &part, &SolverConfig::default()).is_err());
    }
}
