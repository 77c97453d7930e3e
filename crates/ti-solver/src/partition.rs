//! Column partition of the constraint matrix.

use crate::error::{SolverError, SolverResult};
use nalgebra::DMatrix;

/// Disjoint ordered column index sets covering `0..n` exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Non-thermal columns with nonzero objective weight
    pub weighted: Vec<usize>,
    /// Non-thermal columns with zero objective weight
    pub passive: Vec<usize>,
    /// The trailing `horizon` thermal columns
    pub thermal: Vec<usize>,
}

impl Partition {
    /// Weighted columns followed by passive columns.
    pub fn free(&self) -> Vec<usize> {
        self.weighted
            .iter()
            .chain(self.passive.iter())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.weighted.len() + self.passive.len() + self.thermal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split columns by the objective diagonal. A diagonal entry counts as
/// nonzero when its magnitude exceeds `tol`.
pub fn partition_columns(
    objective: &DMatrix<f64>,
    horizon: usize,
    tol: f64,
) -> SolverResult<Partition> {
    let n = objective.nrows();
    if horizon > n {
        return Err(SolverError::Dimension {
            what: format!("horizon {horizon} exceeds {n} unknowns"),
        });
    }
    let (weighted, passive): (Vec<usize>, Vec<usize>) =
        (0..n - horizon).partition(|&j| objective[(j, j)].abs() > tol);
    Ok(Partition {
        weighted,
        passive,
        thermal: (n - horizon..n).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_by_objective_diagonal() {
        let q = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![
            1.0, 0.0, 2.0, 0.0, 5.0, 5.0,
        ]));
        let p = partition_columns(&q, 2, 1e-10).unwrap();
        assert_eq!(p.weighted, vec![0, 2]);
        assert_eq!(p.passive, vec![1, 3]);
        assert_eq!(p.thermal, vec![4, 5]);
        assert_eq!(p.free(), vec![0, 2, 1, 3]);
        assert_eq!(p.len(), 6);
    }

    #[test]
    fn covers_every_column_once() {
        let q = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![0.0, 3.0, 1e-12, 4.0]));
        let p = partition_columns(&q, 1, 1e-10).unwrap();
        let mut all: Vec<usize> = p.free();
        all.extend(&p.thermal);
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3]);
        assert_eq!(p.passive, vec![0, 2]);
    }

    #[test]
    fn zero_horizon_has_no_thermal_columns() {
        let p = partition_columns(&DMatrix::identity(3, 3), 0, 1e-10).unwrap();
        assert!(p.thermal.is_empty());
        assert_eq!(p.weighted, vec![0, 1, 2]);
    }

    #[test]
    fn horizon_too_large_is_an_error() {
        assert!(partition_columns(&DMatrix::identity(2, 2), 3, 1e-10).is_err());
    }
}
