use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use ti_app::{
    AnalysisOptions, AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, case_service,
    query, run_service,
};
use ti_results::{LineOutcome, LineRecord, RunSummary};

#[derive(Parser)]
#[command(name = "ti-cli")]
#[command(about = "Temporal instanton analysis of transmission line thermal limits", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate case file syntax and structure
    Validate {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
    },
    /// List lines in a case with their thermal levels
    Lines {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
    },
    /// Analyze every line of a case
    Run {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Solve lines one after another
        #[arg(long)]
        serial: bool,
        /// Size of a dedicated thread pool
        #[arg(long)]
        threads: Option<usize>,
        /// Number of most vulnerable lines to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// List cached runs for a case
    Runs {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
        /// Run ID to display
        run_id: String,
        /// Number of lines to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Delete a cached run
    DeleteRun {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
        /// Run ID to delete
        run_id: String,
    },
    /// Export the per-step instanton of one line as CSV
    Export {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Line ID
        line_id: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Lines { case_path } => cmd_lines(&case_path),
        Commands::Run {
            case_path,
            no_cache,
            serial,
            threads,
            top,
        } => cmd_run(
            &case_path,
            RunOptions {
                use_cache: !no_cache,
                analysis: AnalysisOptions {
                    parallel: !serial,
                    threads,
                },
                ..RunOptions::default()
            },
            top,
        ),
        Commands::Runs { case_path } => cmd_runs(&case_path),
        Commands::ShowRun {
            case_path,
            run_id,
            top,
        } => cmd_show_run(&case_path, &run_id, top),
        Commands::DeleteRun { case_path, run_id } => {
            run_service::delete_run(&case_path, &run_id)?;
            println!("✓ Deleted run {}", run_id);
            Ok(())
        }
        Commands::Export {
            case_path,
            run_id,
            line_id,
            output,
        } => cmd_export(&case_path, &run_id, &line_id, output.as_deref()),
    }
}

fn cmd_validate(case_path: &Path) -> AppResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = case_service::load_case(case_path)?;
    case_service::validate_case(&case)?;
    let compiled = case_service::compile_case(&case)?;
    case_service::solver_config(&case)?;
    println!(
        "✓ Case is valid ({} buses, {} lines, {} wind farms, {} steps)",
        compiled.network.buses().len(),
        compiled.network.lines().len(),
        compiled.network.farms().len(),
        compiled.network.horizon()
    );
    Ok(())
}

fn cmd_lines(case_path: &Path) -> AppResult<()> {
    let case = case_service::load_case(case_path)?;
    let lines = case_service::list_lines(&case);

    if lines.is_empty() {
        println!("No lines found in case");
    } else {
        println!("Lines in case '{}':", case.name);
        for line in lines {
            let note = if line.skipped { "  (zero length, skipped)" } else { "" };
            println!(
                "  {} - {} ({} -> {}, {:.1} m, level {:.4}){}",
                line.id, line.name, line.from, line.to, line.length_m, line.level, note
            );
        }
    }
    Ok(())
}

fn cmd_run(case_path: &Path, options: RunOptions, top: usize) -> AppResult<()> {
    println!("Running instanton analysis: {}", case_path.display());

    let request = RunRequest { case_path, options };

    let mut last_emit = Instant::now();
    let mut last_stage = String::new();
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let stage_key = event.stage.label().to_string();
            let emit_now = stage_key != last_stage
                || event.line.is_some()
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = stage_key;
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Analysis completed: {}", response.run_id);
    }

    print_summary(&response.manifest.summary);
    println!("  Total time: {:.3}s", response.total_time_s);
    response.timing.print_summary();
    if ti_core::timing::is_enabled() {
        ti_core::timing::solver_timing::print_summary();
    }

    print_ranking(&response.records, top);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.line) {
        (RunStage::AnalyzingLines, Some(line)) => {
            let width = 28usize;
            let fraction = line.fraction_complete();
            let filled = ((fraction * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  line {}/{}  {}  score={:.4e}  elapsed={:.1}s",
                bar,
                fraction * 100.0,
                line.completed,
                line.total,
                line.name,
                line.score,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\nRun summary:");
    println!(
        "  Lines:        {} ({} analyzed, {} skipped)",
        summary.lines_total, summary.analyzed, summary.skipped
    );
    println!("  Instantons:   {}", summary.solved);
    println!("  Unreachable:  {}", summary.no_instanton);
    println!("  Failed:       {}", summary.failed);
    if summary.stalls > 0 {
        println!("  Root stalls:  {}", summary.stalls);
    }
}

fn print_ranking(records: &[LineRecord], top: usize) {
    let ranked = query::top_k(records, top);
    if ranked.is_empty() {
        println!("\nNo line can reach its thermal limit");
        return;
    }
    println!("\nMost vulnerable lines:");
    for (rank, record) in ranked.iter().enumerate() {
        println!(
            "  {:>3}. {:<16} {:<24} score={:.6e}",
            rank + 1,
            record.line_id,
            record.name,
            record.score_or_inf()
        );
    }
    for record in records {
        if let LineOutcome::Failed { reason } = &record.outcome {
            println!("  ! {} failed: {}", record.line_id, reason);
        }
    }
}

fn cmd_runs(case_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(case_path)?;

    if runs.is_empty() {
        println!("No cached runs found for case: {}", case_path.display());
    } else {
        println!("Cached runs for case '{}':", case_path.display());
        for manifest in runs {
            println!(
                "  {} ({}, solver {}, {} instantons)",
                manifest.run_id, manifest.timestamp, manifest.solver_version, manifest.summary.solved
            );
        }
    }
    Ok(())
}

fn cmd_show_run(case_path: &Path, run_id: &str, top: usize) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, records) = run_service::load_run(case_path, run_id)?;

    println!("  Case:      {}", manifest.case_name);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Solver:    {}", manifest.solver_version);
    println!("  Horizon:   {} steps", manifest.horizon);
    print_summary(&manifest.summary);
    print_ranking(&records, top);

    Ok(())
}

fn cmd_export(
    case_path: &Path,
    run_id: &str,
    line_id: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let case = case_service::load_case(case_path)?;
    let compiled = case_service::compile_case(&case)?;
    let record = run_service::load_line(case_path, run_id, line_id)?;
    let csv = query::line_series_csv(&record, &compiled.farm_keys, &compiled.bus_keys)?;

    if let Some(path) = output {
        std::fs::write(path, &csv)?;
        println!(
            "✓ Exported {} time steps of line {} to {}",
            record.mismatches.len(),
            line_id,
            path.display()
        );
    } else {
        print!("{}", csv);
    }

    Ok(())
}
