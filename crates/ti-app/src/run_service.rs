//! Run execution and caching service.

use std::path::Path;
use std::time::Instant;

use ti_case::CaseFile;
use ti_core::timing::PerfStats;
use ti_results::{LineRecord, RunManifest, RunStore};
use tracing::info;

use crate::analysis::{AnalysisOptions, analyze_lines};
use crate::case_service;
use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};

/// Options for running an analysis.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
    pub analysis: AnalysisOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
            analysis: AnalysisOptions::default(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub case_path: &'a Path,
    pub options: RunOptions,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub records: Vec<LineRecord>,
    pub loaded_from_cache: bool,
    pub timing: PerfStats,
    pub total_time_s: f64,
}

fn emit_progress(
    progress_cb: &mut Option<&mut (dyn FnMut(RunProgressEvent) + Send + '_)>,
    stage: RunStage,
    started: Instant,
    message: &str,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            Some(message.to_string()),
        ));
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut (dyn FnMut(RunProgressEvent) + Send + '_)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = PerfStats::default();

    emit_progress(&mut progress_cb, RunStage::LoadingCase, started, "Loading case");
    let case = case_service::load_case(request.case_path)?;
    timing.load_time_s = started.elapsed().as_secs_f64();

    emit_progress(&mut progress_cb, RunStage::CheckingCache, started, "Checking run cache");
    let run_id = ti_results::compute_run_id(&case, &request.options.solver_version);
    let store = RunStore::for_case(request.case_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            "Loading cached run",
        );
        let manifest = store.load_manifest(&run_id)?;
        let records = store.load_lines(&run_id)?;
        emit_progress(&mut progress_cb, RunStage::Completed, started, "Loaded cached run");
        info!(run_id = %run_id, "run loaded from cache");

        return Ok(RunResponse {
            run_id,
            manifest,
            records,
            loaded_from_cache: true,
            timing,
            total_time_s: started.elapsed().as_secs_f64(),
        });
    }

    let (manifest, records) = execute_run(
        &case,
        &store,
        &run_id,
        &request.options,
        &mut progress_cb,
        started,
        &mut timing,
    )?;

    emit_progress(&mut progress_cb, RunStage::Completed, started, "Run completed");

    Ok(RunResponse {
        run_id,
        manifest,
        records,
        loaded_from_cache: false,
        timing,
        total_time_s: started.elapsed().as_secs_f64(),
    })
}

fn execute_run(
    case: &CaseFile,
    store: &RunStore,
    run_id: &str,
    options: &RunOptions,
    progress_cb: &mut Option<&mut (dyn FnMut(RunProgressEvent) + Send + '_)>,
    started: Instant,
    timing: &mut PerfStats,
) -> AppResult<(RunManifest, Vec<LineRecord>)> {
    emit_progress(progress_cb, RunStage::CompilingNetwork, started, "Compiling network");
    let compile_started = Instant::now();
    let compiled = case_service::compile_case(case)?;
    let config = case_service::solver_config(case)?;
    timing.assemble_time_s = compile_started.elapsed().as_secs_f64();

    emit_progress(progress_cb, RunStage::AnalyzingLines, started, "Analyzing lines");
    let analysis_started = Instant::now();
    let results = analyze_lines(
        &compiled.network,
        &config,
        &options.analysis,
        progress_cb.as_deref_mut(),
    )?;
    timing.analysis_time_s = analysis_started.elapsed().as_secs_f64();
    timing.lines_solved = results.len();

    emit_progress(progress_cb, RunStage::SavingResults, started, "Saving results");
    let save_started = Instant::now();
    let records = results.to_records(&compiled);
    let manifest = RunManifest {
        run_id: run_id.to_string(),
        case_name: case.name.clone(),
        timestamp: ti_results::timestamp_now(),
        solver_version: options.solver_version.clone(),
        horizon: case.horizon,
        summary: results.summary(),
    };
    store.save_run(&manifest, &records)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();

    info!(
        run_id = %run_id,
        case = %case.name,
        lines = records.len(),
        "run saved"
    );
    Ok((manifest, records))
}

/// List stored runs of the case at `case_path`, most recent first.
pub fn list_runs(case_path: &Path) -> AppResult<Vec<RunManifest>> {
    let case = case_service::load_case(case_path)?;
    let store = RunStore::for_case(case_path)?;
    Ok(store.list_runs(&case.name)?)
}

/// Load a specific run.
pub fn load_run(case_path: &Path, run_id: &str) -> AppResult<(RunManifest, Vec<LineRecord>)> {
    let store = RunStore::for_case(case_path)?;

    let manifest = store.load_manifest(run_id)?;
    let records = store.load_lines(run_id)?;

    Ok((manifest, records))
}

/// Load one line's record from a stored run.
pub fn load_line(case_path: &Path, run_id: &str, line_id: &str) -> AppResult<LineRecord> {
    let store = RunStore::for_case(case_path)?;
    Ok(store.load_line(run_id, line_id)?)
}

/// Delete a stored run.
pub fn delete_run(case_path: &Path, run_id: &str) -> AppResult<()> {
    let store = RunStore::for_case(case_path)?;
    Ok(store.delete_run(run_id)?)
}
