//! Orthonormal null-space basis of the constraint matrix.

use crate::error::{SolverError, SolverResult};
use nalgebra::DMatrix;

/// Orthonormal basis `N` (`n × (n - m)`) of `{x : A x = 0}`.
///
/// Taken from the trailing columns of the full orthogonal factor of the
/// Householder QR factorization of `Aᵗ`. A diagonal entry of `R` at or below
/// `tol` relative to the largest one means `A` is rank deficient.
pub fn null_space_basis(a: &DMatrix<f64>, tol: f64) -> SolverResult<DMatrix<f64>> {
    let (m, n) = a.shape();
    if m == 0 {
        return Ok(DMatrix::identity(n, n));
    }
    if m > n {
        return Err(SolverError::IllPosed {
            what: format!("{m} constraints on {n} unknowns"),
        });
    }

    let qr = a.transpose().qr();
    let r_diag = qr.r().diagonal().map(f64::abs);
    let largest = r_diag.max();
    if largest == 0.0 || r_diag.min() <= tol * largest {
        return Err(SolverError::IllPosed {
            what: "constraint matrix is rank deficient".to_string(),
        });
    }

    // qr.q() is thin (n x m); apply Qᵗ to the identity to get the full factor.
    let mut q_tr = DMatrix::identity(n, n);
    qr.q_tr_mul(&mut q_tr);
    let q_full = q_tr.transpose();
    Ok(q_full.columns(m, n - m).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_is_orthonormal_and_annihilated() {
        let a = DMatrix::from_row_slice(2, 4, &[1.0, 2.0, 0.0, -1.0, 0.0, 1.0, 1.0, 3.0]);
        let n = null_space_basis(&a, 1e-10).unwrap();
        assert_eq!(n.shape(), (4, 2));
        assert!((&a * &n).amax() < 1e-12);
        let gram = n.transpose() * &n;
        assert!((gram - DMatrix::identity(2, 2)).amax() < 1e-12);
    }

    #[test]
    fn no_constraints_gives_identity() {
        let a = DMatrix::<f64>::zeros(0, 3);
        assert_eq!(null_space_basis(&a, 1e-10).unwrap(), DMatrix::identity(3, 3));
    }

    #[test]
    fn square_full_rank_has_empty_kernel() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 1.0]);
        let n = null_space_basis(&a, 1e-10).unwrap();
        assert_eq!(n.shape(), (2, 0));
    }

    #[test]
    fn rank_deficient_rows_are_ill_posed() {
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 0.0, 2.0, 2.0, 0.0]);
        assert!(matches!(
            null_space_basis(&a, 1e-10),
            Err(SolverError::IllPosed { .. })
        ));
    }
}
