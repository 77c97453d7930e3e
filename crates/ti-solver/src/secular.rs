//! Secular equation `Σᵢ (dᵢ / (v - Dᵢ))² = c` and its real roots.
//!
//! Between two consecutive active poles the residual
//! `f(v) = Σᵢ (dᵢ / (v - Dᵢ))² - c` is strictly convex, so it has zero, one
//! (tangent) or two roots there; the stationary point is located by bisection
//! on `f'`. Outside the outermost poles `f` is monotone and every root lies
//! within `‖d‖ / √c` of the nearest pole. Poles whose weights vanish are
//! removable and contribute the hard-case points at `v = Dᵢ`.

use crate::config::{SolverConfig, StallCriterion};
use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use ti_core::numeric::dedup_sorted;
use tracing::{debug, warn};

/// A scalar secular equation in eigen-coordinates.
#[derive(Debug, Clone)]
pub struct SecularEquation {
    poles: DVector<f64>,
    weights: DVector<f64>,
    target: f64,
}

/// How a root was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Bisection inside a sign-change bracket
    Bracketed,
    /// Double root at the minimum of a convex gap
    Tangent,
    /// Hard-case point at a removable pole
    Removable,
}

/// One root of the secular equation with its point `w(v)`.
#[derive(Debug, Clone)]
pub struct SecularRoot {
    pub value: f64,
    pub point: DVector<f64>,
    pub residual: f64,
    pub iterations: usize,
    pub kind: RootKind,
}

/// Every root found plus the number of abandoned brackets.
#[derive(Debug, Clone, Default)]
pub struct SecularReport {
    pub roots: Vec<SecularRoot>,
    pub stalls: usize,
}

/// Poles merged within tolerance, with the summed squared weight of members.
#[derive(Debug, Clone)]
struct PoleCluster {
    value: f64,
    members: Vec<usize>,
    weight: f64,
}

/// Converged bisection point.
struct Hit {
    value: f64,
    residual: f64,
    iterations: usize,
}

impl SecularEquation {
    pub fn new(poles: DVector<f64>, weights: DVector<f64>, target: f64) -> SolverResult<Self> {
        if poles.len() != weights.len() {
            return Err(SolverError::Dimension {
                what: format!(
                    "secular equation has {} poles but {} weights",
                    poles.len(),
                    weights.len()
                ),
            });
        }
        Ok(Self {
            poles,
            weights,
            target,
        })
    }

    /// Build from the reduced operator `schur`, its linear term and the
    /// thermal constant `k` (so that the target is `c = -k`).
    ///
    /// Returns the equation and the eigenvector matrix `P` mapping root points
    /// back to off-pole coordinates.
    pub fn from_reduced(
        schur: &DMatrix<f64>,
        schur_linear: &DVector<f64>,
        thermal_constant: f64,
    ) -> SolverResult<(Self, DMatrix<f64>)> {
        if !schur.is_square() || schur.nrows() != schur_linear.len() {
            return Err(SolverError::Dimension {
                what: format!(
                    "reduced operator is {}x{} with linear term of length {}",
                    schur.nrows(),
                    schur.ncols(),
                    schur_linear.len()
                ),
            });
        }
        let eig = schur.clone().symmetric_eigen();
        let weights = eig.eigenvectors.transpose() * schur_linear * 0.5;
        let eq = Self::new(eig.eigenvalues, weights, -thermal_constant)?;
        Ok((eq, eig.eigenvectors))
    }

    pub fn poles(&self) -> &DVector<f64> {
        &self.poles
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// `w(v)ᵢ = dᵢ / (v - Dᵢ)`. Zero-weight components stay zero.
    pub fn point(&self, v: f64) -> DVector<f64> {
        DVector::from_fn(self.poles.len(), |i, _| {
            let d = self.weights[i];
            if d == 0.0 { 0.0 } else { d / (v - self.poles[i]) }
        })
    }

    /// `f(v) = ‖w(v)‖² - c`.
    pub fn residual(&self, v: f64) -> f64 {
        self.point(v).norm_squared() - self.target
    }

    /// `f'(v) = -2 Σᵢ dᵢ² / (v - Dᵢ)³`.
    pub fn derivative(&self, v: f64) -> f64 {
        self.poles
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, d)| **d != 0.0)
            .map(|(p, d)| -2.0 * d * d / (v - p).powi(3))
            .sum()
    }

    fn clusters(&self, tol: f64) -> Vec<PoleCluster> {
        let values = dedup_sorted(self.poles.as_slice(), tol);
        let mut clusters: Vec<PoleCluster> = values
            .into_iter()
            .map(|value| PoleCluster {
                value,
                members: Vec::new(),
                weight: 0.0,
            })
            .collect();
        for (i, &p) in self.poles.iter().enumerate() {
            let nearest = clusters
                .iter_mut()
                .min_by(|a, b| (a.value - p).abs().total_cmp(&(b.value - p).abs()));
            if let Some(cluster) = nearest {
                cluster.members.push(i);
                cluster.weight += self.weights[i] * self.weights[i];
            }
        }
        clusters
    }

    /// Copy of the equation with the weights of removable clusters zeroed.
    fn without_removable(&self, removable: &[&PoleCluster]) -> Self {
        let mut weights = self.weights.clone();
        for cluster in removable {
            for &i in &cluster.members {
                weights[i] = 0.0;
            }
        }
        Self {
            poles: self.poles.clone(),
            weights,
            target: self.target,
        }
    }
}

/// Find every real root of `eq`, sorted by value.
pub fn solve_secular(eq: &SecularEquation, config: &SolverConfig) -> SecularReport {
    let tol = config.tolerance;
    let clusters = eq.clusters(tol);
    let (active, removable): (Vec<&PoleCluster>, Vec<&PoleCluster>) =
        clusters.iter().partition(|c| c.weight > tol * tol);
    let eq = eq.without_removable(&removable);
    let c = eq.target;

    let mut report = SecularReport::default();

    if c > 0.0 && !active.is_empty() {
        let reach = eq.weights.norm() / c.sqrt();
        let first = active[0].value;
        let last = active[active.len() - 1].value;

        push_bisection(&eq, first - reach, first, true, config, &mut report);
        for pair in active.windows(2) {
            solve_gap(&eq, pair[0].value, pair[1].value, config, &mut report);
        }
        push_bisection(&eq, last, last + reach, false, config, &mut report);
    }

    for cluster in &removable {
        push_removable(&eq, cluster, config, &mut report);
    }

    report.roots.sort_by(|a, b| a.value.total_cmp(&b.value));
    debug!(
        roots = report.roots.len(),
        stalls = report.stalls,
        active_poles = active.len(),
        removable_poles = removable.len(),
        target = c,
        "secular equation solved"
    );
    report
}

fn solve_gap(
    eq: &SecularEquation,
    left: f64,
    right: f64,
    config: &SolverConfig,
    report: &mut SecularReport,
) {
    let Some(v_min) = gap_minimizer(eq, left, right, config) else {
        warn!(left, right, "secular gap minimizer did not settle");
        report.stalls += 1;
        return;
    };
    let f_min = eq.residual(v_min);
    let scale = residual_scale(eq, config);
    if f_min > scale {
        return;
    }
    if f_min.abs() <= scale {
        report.roots.push(SecularRoot {
            value: v_min,
            point: eq.point(v_min),
            residual: f_min,
            iterations: 0,
            kind: RootKind::Tangent,
        });
        return;
    }
    push_bisection(eq, left, v_min, false, config, report);
    push_bisection(eq, v_min, right, true, config, report);
}

/// Stationary point of the convex residual between two poles, by bisection on
/// the sign of `f'`.
fn gap_minimizer(
    eq: &SecularEquation,
    mut lo: f64,
    mut hi: f64,
    config: &SolverConfig,
) -> Option<f64> {
    for _ in 0..config.max_bisection_iters {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            return Some(mid);
        }
        let slope = eq.derivative(mid);
        if slope == 0.0 {
            return Some(mid);
        }
        if slope < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let mid = 0.5 * (lo + hi);
    // An unfinished search still leaves a usable point once the bracket is
    // narrow relative to the gap.
    if (hi - lo) <= f64::EPSILON.sqrt() * (1.0 + mid.abs()) {
        Some(mid)
    } else {
        None
    }
}

fn push_bisection(
    eq: &SecularEquation,
    lo: f64,
    hi: f64,
    increasing: bool,
    config: &SolverConfig,
    report: &mut SecularReport,
) {
    match bisect(eq, lo, hi, increasing, config) {
        Some(hit) => report.roots.push(SecularRoot {
            value: hit.value,
            point: eq.point(hit.value),
            residual: hit.residual,
            iterations: hit.iterations,
            kind: RootKind::Bracketed,
        }),
        None => {
            warn!(
                lo,
                hi,
                criterion = config.stall_criterion.as_str(),
                "secular bisection stalled; root skipped"
            );
            report.stalls += 1;
        }
    }
}

/// Absolute residual threshold for `eq`, relative to the target radius.
fn residual_scale(eq: &SecularEquation, config: &SolverConfig) -> f64 {
    config.residual_tol * eq.target.abs().max(1.0)
}

/// Sign-directed bisection on a bracket where `f` is monotone.
///
/// A bracket that collapses to adjacent floats still straddles the sign
/// change, so its midpoint is returned and left to the candidate check.
/// Returns `None` on a stall.
fn bisect(
    eq: &SecularEquation,
    mut lo: f64,
    mut hi: f64,
    increasing: bool,
    config: &SolverConfig,
) -> Option<Hit> {
    let scale = residual_scale(eq, config);
    let mut previous: Option<f64> = None;
    for iteration in 1..=config.max_bisection_iters {
        let mid = 0.5 * (lo + hi);
        let f = eq.residual(mid);
        if f.abs() < scale {
            return Some(Hit {
                value: mid,
                residual: f,
                iterations: iteration,
            });
        }
        let stalled = match config.stall_criterion {
            StallCriterion::BracketCollapse => {
                if mid <= lo || mid >= hi {
                    debug!(iteration, mid, residual = f, "bracket collapsed");
                    return Some(Hit {
                        value: mid,
                        residual: f,
                        iterations: iteration,
                    });
                }
                false
            }
            StallCriterion::RepeatedResidual => previous == Some(f),
        };
        if stalled {
            debug!(iteration, mid, residual = f, "bisection stall");
            return None;
        }
        previous = Some(f);

        // Non-finite residuals only occur on a pole, where f is +inf.
        let above = !f.is_finite() || f > 0.0;
        if above == increasing {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    None
}

/// Hard-case points at a removable pole `p`: off-cluster coordinates follow
/// `w(p)`, one cluster coordinate absorbs the remaining radius.
fn push_removable(
    eq: &SecularEquation,
    cluster: &PoleCluster,
    config: &SolverConfig,
    report: &mut SecularReport,
) {
    let Some(&pivot) = cluster.members.first() else {
        return;
    };
    let mut point = eq.point(cluster.value);
    for &i in &cluster.members {
        point[i] = 0.0;
    }
    let scale = residual_scale(eq, config);
    let remaining = eq.target - point.norm_squared();
    if remaining < -scale {
        return;
    }

    let radius = remaining.max(0.0).sqrt();
    let signs: &[f64] = if remaining > scale {
        &[1.0, -1.0]
    } else {
        &[1.0]
    };
    for &sign in signs {
        let mut p = point.clone();
        p[pivot] = sign * radius;
        let residual = p.norm_squared() - eq.target;
        report.roots.push(SecularRoot {
            value: cluster.value,
            point: p,
            residual,
            iterations: 0,
            kind: RootKind::Removable,
        });
    }
}
