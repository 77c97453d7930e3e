//! QCQP pipeline: partition, translate, rotate, diagonalize, reduce, solve the
//! secular equation and map candidates back.

use crate::backmap::{Candidate, TransformChain, select_minimum};
use crate::config::SolverConfig;
use crate::diagonalize::{Diagonalization, diagonalize};
use crate::error::{SolverError, SolverResult};
use crate::kernel::null_space_basis;
use crate::partition::{Partition, partition_columns};
use crate::problem::InstantonProblem;
use crate::schur::{BlockReduction, reduce_blocks};
use crate::secular::{SecularEquation, solve_secular};
use crate::translate::{translate_forms, translation_point};
use nalgebra::DVector;
use ti_core::timing::{Timer, solver_timing};
use tracing::{debug, warn};

/// A problem carried through every affine stage, ready for root finding.
#[derive(Debug, Clone)]
pub struct ReducedProblem {
    pub partition: Partition,
    pub chain: TransformChain,
    pub diagonal: Diagonalization,
}

/// Counters describing one solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveDiagnostics {
    pub reduced_dim: usize,
    pub at_pole: usize,
    pub off_pole: usize,
    pub roots: usize,
    pub stalls: usize,
    pub rejected: usize,
    pub candidates: usize,
}

/// Minimum-objective point of one QCQP.
///
/// `score` is `+∞` and `x` is empty when no real stationary point exists.
#[derive(Debug, Clone)]
pub struct QcqpSolution {
    pub score: f64,
    pub x: DVector<f64>,
    /// Secular root or multiplier of the selected candidate
    pub multiplier: Option<f64>,
    /// Every verified candidate, in root order
    pub candidates: Vec<Candidate>,
    pub diagnostics: SolveDiagnostics,
}

impl QcqpSolution {
    fn no_instanton(diagnostics: SolveDiagnostics) -> Self {
        Self {
            score: f64::INFINITY,
            x: DVector::zeros(0),
            multiplier: None,
            candidates: Vec::new(),
            diagnostics,
        }
    }

    pub fn has_instanton(&self) -> bool {
        self.score.is_finite()
    }
}

/// Run the affine stages: everything up to and including the diagonalization
/// and square completion.
pub fn reduce(problem: &InstantonProblem, config: &SolverConfig) -> SolverResult<ReducedProblem> {
    let tol = config.tolerance;
    let partition = partition_columns(problem.objective.matrix(), problem.horizon, tol)?;

    let timer = Timer::start("translate");
    let point = translation_point(&problem.constraints, &partition, config)?;
    let translated = translate_forms(&problem.objective, &problem.thermal, point);
    timer.stop_into(&solver_timing::TRANSLATE);

    let timer = Timer::start("kernel");
    let basis = null_space_basis(problem.constraints.matrix(), tol)?;
    let to_kernel = basis.transpose();
    let objective = translated.objective.rotate(&to_kernel);
    let thermal = translated.thermal.rotate(&to_kernel);
    timer.stop_into(&solver_timing::KERNEL);

    let timer = Timer::start("diagonalize");
    let diagonal = diagonalize(&objective, &thermal, tol)?;
    timer.stop_into(&solver_timing::DIAGONALIZE);

    let chain = TransformChain {
        origin: translated.point,
        basis,
        eigenvectors: diagonal.eigenvectors.clone(),
        scales: diagonal.scales.clone(),
        shift: diagonal.shift.clone(),
    };

    debug!(
        n = problem.dim(),
        m = problem.constraints.rows(),
        reduced = chain.reduced_dim(),
        weighted = partition.weighted.len(),
        passive = partition.passive.len(),
        "problem reduced"
    );

    Ok(ReducedProblem {
        partition,
        chain,
        diagonal,
    })
}

/// Solve one QCQP to its minimum-objective verified stationary point.
///
/// Stalled secular brackets are skipped; only when stalls leave no candidate
/// at all is [`SolverError::StalledRoot`] returned.
pub fn solve(problem: &InstantonProblem, config: &SolverConfig) -> SolverResult<QcqpSolution> {
    let reduced = reduce(problem, config)?;
    let tol = config.tolerance;
    let chain = &reduced.chain;
    let diagonal = &reduced.diagonal;

    let mut diagnostics = SolveDiagnostics {
        reduced_dim: chain.reduced_dim(),
        at_pole: diagonal.at_pole.len(),
        off_pole: diagonal.off_pole.len(),
        ..SolveDiagnostics::default()
    };

    // (multiplier, reduced point) pairs
    let mut stationary: Vec<(f64, DVector<f64>)> = Vec::new();

    if chain.reduced_dim() == 0 {
        // The constraints pin a single point.
        stationary.push((0.0, DVector::zeros(0)));
    } else {
        let timer = Timer::start("schur");
        let blocks = reduce_blocks(diagonal, tol)?;
        timer.stop_into(&solver_timing::SCHUR);

        if blocks.off_pole.is_empty() {
            stationary.extend(linear_branch(&blocks, config)?);
        } else if !blocks.thermal_is_quadratic(tol) {
            return Err(SolverError::IndefiniteThermalForm {
                what: "thermal form mixes a linear at-pole term with off-pole squares".to_string(),
            });
        } else {
            let timer = Timer::start("secular");
            let (equation, rotation) = SecularEquation::from_reduced(
                &blocks.schur,
                &blocks.schur_linear,
                blocks.thermal_constant,
            )?;
            let report = solve_secular(&equation, config);
            timer.stop_into(&solver_timing::SECULAR);

            diagnostics.roots = report.roots.len();
            diagnostics.stalls = report.stalls;
            for root in report.roots {
                let w2 = &rotation * &root.point;
                let w1 = blocks.at_pole_response(&w2);
                stationary.push((root.value, blocks.assemble(&w1, &w2)));
            }
        }
    }

    let timer = Timer::start("backmap");
    let mut candidates = Vec::with_capacity(stationary.len());
    for (multiplier, w) in stationary {
        let candidate = Candidate::new(problem, chain, w, multiplier);
        if candidate.is_feasible(problem, config) {
            debug!(
                multiplier,
                score = candidate.score,
                thermal_residual = candidate.thermal_residual,
                "candidate accepted"
            );
            candidates.push(candidate);
        } else {
            warn!(
                multiplier,
                thermal_residual = candidate.thermal_residual,
                linear_residual = candidate.linear_residual,
                "candidate rejected by residual check"
            );
            diagnostics.rejected += 1;
        }
    }
    diagnostics.candidates = candidates.len();
    let best = select_minimum(&candidates).cloned();
    timer.stop_into(&solver_timing::BACKMAP);

    match best {
        Some(best) => Ok(QcqpSolution {
            score: best.score,
            x: best.x,
            multiplier: Some(best.multiplier),
            candidates,
            diagnostics,
        }),
        None if diagnostics.stalls > 0 => Err(SolverError::StalledRoot {
            stalls: diagnostics.stalls,
        }),
        None => Ok(QcqpSolution::no_instanton(diagnostics)),
    }
}

/// Stationary points when no coordinate carries a squared thermal term.
fn linear_branch(
    blocks: &BlockReduction,
    config: &SolverConfig,
) -> SolverResult<Vec<(f64, DVector<f64>)>> {
    let empty = DVector::zeros(0);
    if blocks.thermal_is_quadratic(config.tolerance) {
        // Thermal form is the constant k on the whole feasible set.
        if blocks.thermal_constant.abs() <= config.residual_tol {
            let w1 = blocks.at_pole_response(&empty);
            return Ok(vec![(0.0, blocks.assemble(&w1, &empty))]);
        }
        return Ok(Vec::new());
    }
    let (w1, multiplier) = blocks.linear_thermal_point(config.tolerance)?;
    Ok(vec![(multiplier, blocks.assemble(&w1, &empty))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::LinearSystem;
    use crate::quadratic::QuadraticForm;
    use nalgebra::DMatrix;

    fn diag(values: &[f64]) -> DMatrix<f64> {
        DMatrix::from_diagonal(&DVector::from_row_slice(values))
    }

    fn problem(level: f64) -> InstantonProblem {
        let sys = LinearSystem::new(
            DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
            DVector::from_vec(vec![1.0]),
        )
        .unwrap();
        InstantonProblem::new(
            QuadraticForm::pure(diag(&[1.0, 0.0])).unwrap(),
            QuadraticForm::level_set(diag(&[0.0, 1.0]), level).unwrap(),
            sys,
            1,
        )
        .unwrap()
    }

    #[test]
    fn reachable_level_picks_nearer_branch() {
        let sol = solve(&problem(0.5), &SolverConfig::default()).unwrap();
        let expected = (1.0 - 0.5f64.sqrt()).powi(2);
        assert!((sol.score - expected).abs() < 1e-7);
        assert!((sol.x[1] - 0.5f64.sqrt()).abs() < 1e-6);
        assert_eq!(sol.diagnostics.candidates, 2);
        assert_eq!(sol.diagnostics.off_pole, 1);
    }

    #[test]
    fn negative_level_has_no_instanton() {
        let sol = solve(&problem(-1.0), &SolverConfig::default()).unwrap();
        assert!(!sol.has_instanton());
        assert_eq!(sol.score, f64::INFINITY);
        assert_eq!(sol.x.len(), 0);
        assert_eq!(sol.diagnostics.stalls, 0);
    }

    #[test]
    fn reduce_exposes_round_trippable_chain() {
        let reduced = reduce(&problem(0.5), &SolverConfig::default()).unwrap();
        let x = DVector::from_vec(vec![0.3, 0.7]);
        let w = reduced.chain.to_reduced(&x);
        let back = reduced.chain.to_original(&w);
        assert!((back - x).amax() < 1e-12);
    }

    #[test]
    fn fully_pinned_system_checks_the_single_point() {
        let sys = LinearSystem::new(DMatrix::identity(2, 2), DVector::from_vec(vec![0.0, 2.0]))
            .unwrap();
        let make = |level: f64| {
            InstantonProblem::new(
                QuadraticForm::pure(diag(&[1.0, 0.0])).unwrap(),
                QuadraticForm::level_set(diag(&[0.0, 1.0]), level).unwrap(),
                sys.clone(),
                0,
            )
            .unwrap()
        };
        let hit = solve(&make(4.0), &SolverConfig::default()).unwrap();
        assert!(hit.has_instanton());
        assert!(hit.score.abs() < 1e-12);
        let miss = solve(&make(3.0), &SolverConfig::default()).unwrap();
        assert!(!miss.has_instanton());
        assert_eq!(miss.diagnostics.rejected, 1);
    }
}
