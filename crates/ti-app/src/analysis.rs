//! Per-line instanton analysis over a compiled network.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use nalgebra::DVector;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use ti_network::{InstantonProfile, Line, Network, NetworkInstance};
use ti_results::LineOutcome;
use ti_solver::{SolverConfig, SolverError, solve};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::progress::{LineProgress, RunProgressEvent};
use crate::results::{InstantonResults, LineResult};

/// How the lines of one network are scheduled.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Solve lines on the rayon pool instead of one after another
    pub parallel: bool,
    /// Dedicated pool size; `None` uses the global pool
    pub threads: Option<usize>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Solve the instanton of every non-degenerate line.
///
/// Results are in line order regardless of scheduling. A line whose solve
/// fails is recorded as [`LineOutcome::Failed`] with score `+∞`; it never
/// aborts the batch. `progress` is invoked once per analyzed line.
pub fn analyze_lines(
    network: &Network,
    config: &SolverConfig,
    options: &AnalysisOptions,
    progress: Option<&mut (dyn FnMut(RunProgressEvent) + Send + '_)>,
) -> AppResult<InstantonResults> {
    let started = Instant::now();
    let instance = NetworkInstance::assemble(network);

    let (active, skipped): (Vec<&Line>, Vec<&Line>) =
        network.lines().iter().partition(|line| !line.is_degenerate());
    for line in &skipped {
        info!(line = %line.name, "zero-length line skipped");
    }

    let total = active.len();
    let completed = AtomicUsize::new(0);
    let progress = progress.map(Mutex::new);

    let run_line = |line: &&Line| -> LineResult {
        let result = solve_line(&instance, line, config);
        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(cb) = &progress
            && let Ok(mut cb) = cb.lock()
        {
            (*cb)(RunProgressEvent::line(
                started.elapsed().as_secs_f64(),
                LineProgress {
                    line: line.id,
                    name: line.name.clone(),
                    completed: done,
                    total,
                    score: result.score,
                },
            ));
        }
        result
    };

    let solved: Vec<LineResult> = if options.parallel {
        let run = || active.par_iter().map(run_line).collect::<Vec<_>>();
        match options.threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads.clamp(1, total.max(1)))
                    .build()
                    .map_err(|e| AppError::Backend {
                        message: format!("failed to build analysis thread pool: {e}"),
                    })?;
                pool.install(run)
            }
            None => run(),
        }
    } else {
        active.iter().map(run_line).collect()
    };

    let mut results: InstantonResults = solved.into_iter().collect();
    results.skipped = skipped.iter().map(|line| line.id).collect();

    let summary = results.summary();
    info!(
        analyzed = summary.analyzed,
        skipped = summary.skipped,
        solved = summary.solved,
        no_instanton = summary.no_instanton,
        failed = summary.failed,
        elapsed_s = started.elapsed().as_secs_f64(),
        "line analysis finished"
    );
    Ok(results)
}

/// Solve one line against the shared network instance.
pub fn solve_line(instance: &NetworkInstance, line: &Line, config: &SolverConfig) -> LineResult {
    let solved = instance
        .line_problem(line)
        .map_err(|e| (e.to_string(), 0))
        .and_then(|problem| {
            solve(&problem, config).map_err(|e| {
                let stalls = match &e {
                    SolverError::StalledRoot { stalls } => *stalls,
                    _ => 0,
                };
                (e.to_string(), stalls)
            })
        });

    match solved {
        Ok(solution) if solution.has_instanton() => {
            let profile = instance
                .layout
                .decompose(&solution.x)
                .unwrap_or_else(InstantonProfile::empty);
            debug!(
                line = %line.name,
                score = solution.score,
                candidates = solution.diagnostics.candidates,
                "instanton found"
            );
            LineResult {
                line: line.id,
                name: line.name.clone(),
                outcome: LineOutcome::Solved,
                score: solution.score,
                multiplier: solution.multiplier,
                profile,
                x: solution.x,
                stalls: solution.diagnostics.stalls,
            }
        }
        Ok(solution) => {
            debug!(line = %line.name, "thermal limit unreachable");
            unsolved(line, LineOutcome::NoInstanton, solution.diagnostics.stalls)
        }
        Err((reason, stalls)) => {
            warn!(line = %line.name, %reason, "line solve failed");
            unsolved(line, LineOutcome::Failed { reason }, stalls)
        }
    }
}

fn unsolved(line: &Line, outcome: LineOutcome, stalls: usize) -> LineResult {
    LineResult {
        line: line.id,
        name: line.name.clone(),
        outcome,
        score: f64::INFINITY,
        multiplier: None,
        profile: InstantonProfile::empty(),
        x: DVector::zeros(0),
        stalls,
    }
}
