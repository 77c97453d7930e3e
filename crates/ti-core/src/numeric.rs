use crate::TiError;

/// Floating point type used throughout system
pub type Real = f64;

/// Default rounding tolerance applied to eigenvalues and reduced operators.
pub const DEFAULT_ROUNDING_TOL: Real = 1e-10;

/// Absolute/relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TiError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TiError::NonFinite { what, value: v })
    }
}

/// Round `v` to the nearest multiple of `tol`.
///
/// Values whose quotient exceeds the f64 integer range are returned unchanged,
/// as are non-positive tolerances.
pub fn round_to(v: Real, tol: Real) -> Real {
    if tol <= 0.0 || !v.is_finite() {
        return v;
    }
    let scaled = v / tol;
    if scaled.abs() >= 4.5e15 {
        return v;
    }
    let rounded = scaled.round() * tol;
    // keep the sign of zero canonical
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Whether `v` rounds to zero at `tol`.
pub fn is_negligible(v: Real, tol: Real) -> bool {
    v.abs() <= tol
}

/// Sort values ascending and merge entries closer than `tol` to the first
/// member of their run.
pub fn dedup_sorted(values: &[Real], tol: Real) -> Vec<Real> {
    let mut sorted: Vec<Real> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut out: Vec<Real> = Vec::with_capacity(sorted.len());
    for v in sorted {
        match out.last() {
            Some(&last) if (v - last).abs() <= tol => {}
            _ => out.push(v),
        }
    }
    out
}
