//! Per-line analysis over compiled cases.

use ti_app::{
    AnalysisOptions, AppError, RunProgressEvent, RunStage, analyze_lines, compile_case,
    list_lines, solver_config,
};
use ti_case::*;
use ti_network::decay_weights;
use ti_results::LineOutcome;
use ti_solver::{SolverConfig, StallCriterion};

fn thermal(limit_c: f64) -> ThermalDef {
    ThermalDef {
        gain: 0.2,
        decay: 0.5,
        forced_c: 73.0,
        limit_c,
    }
}

fn bus(id: &str, load: Vec<f64>) -> BusDef {
    BusDef {
        id: id.to_string(),
        name: id.to_uppercase(),
        load,
    }
}

fn line(id: &str, from: &str, to: &str, reactance: f64, length_m: f64) -> LineDef {
    LineDef {
        id: id.to_string(),
        name: id.to_uppercase(),
        from: from.to_string(),
        to: to.to_string(),
        reactance,
        length_m,
        thermal: thermal(75.0),
    }
}

fn two_bus() -> CaseFile {
    CaseFile {
        version: 1,
        name: "two-bus".to_string(),
        horizon: 2,
        time_step_s: 1.0,
        reference_bus: "load".to_string(),
        buses: vec![bus("wind", vec![0.0, 0.0]), bus("load", vec![1.0, 1.0])],
        lines: vec![line("tie", "wind", "load", 1.0, 1000.0)],
        wind_farms: vec![WindFarmDef {
            id: "farm".to_string(),
            name: None,
            bus: "wind".to_string(),
            forecast: vec![1.0, 1.0],
            sigma: 1.0,
        }],
        generators: vec![GeneratorDef {
            id: "gen".to_string(),
            name: None,
            bus: "load".to_string(),
            participation: 1.0,
            output: vec![0.0, 0.0],
        }],
        solver: None,
    }
}

fn three_bus() -> CaseFile {
    let mut case = two_bus();
    case.name = "three-bus".to_string();
    case.buses.push(bus("mid", vec![0.3, 0.2]));
    case.lines = vec![
        line("a", "wind", "mid", 0.5, 800.0),
        line("b", "mid", "load", 0.4, 900.0),
        line("c", "wind", "load", 0.8, 1500.0),
        line("busbar", "wind", "load", 2.0, 0.0),
    ];
    case.generators.push(GeneratorDef {
        id: "peaker".to_string(),
        name: Some("Peaker".to_string()),
        bus: "mid".to_string(),
        participation: 0.0,
        output: vec![0.5, 0.5],
    });
    case.generators[0].output = vec![0.0, -0.3];
    case
}

fn serial() -> AnalysisOptions {
    AnalysisOptions {
        parallel: false,
        threads: None,
    }
}

#[test]
fn two_bus_instanton_matches_ellipse_search() {
    let compiled = compile_case(&two_bus()).expect("compile");
    let results = analyze_lines(&compiled.network, &SolverConfig::default(), &serial(), None)
        .expect("analysis");
    assert_eq!(results.len(), 1);
    assert_eq!(results.outcomes[0], LineOutcome::Solved);

    let weights = decay_weights(0.5, ti_core::units::s(1.0), 2);
    let radius = (0.2_f64 / 0.5 * 2.0).sqrt();
    let steps = 200_000;
    let reference = (0..steps)
        .map(|i| {
            let phi = std::f64::consts::TAU * i as f64 / steps as f64;
            let d0 = radius * phi.cos() / weights[0] - 1.0;
            let d1 = radius * phi.sin() / weights[1] - 1.0;
            d0 * d0 + d1 * d1
        })
        .fold(f64::INFINITY, f64::min);
    assert!((results.scores[0] - reference).abs() < 1e-6);
    assert_eq!(results.deviations[0].len(), 2);
    assert_eq!(results.solutions[0].len(), 10);
}

#[test]
fn zero_length_lines_are_skipped() {
    let compiled = compile_case(&three_bus()).expect("compile");
    let results = analyze_lines(&compiled.network, &SolverConfig::default(), &serial(), None)
        .expect("analysis");
    assert_eq!(results.len(), 3);
    assert_eq!(results.skipped.len(), 1);
    assert_eq!(compiled.line_key(results.skipped[0]), "busbar");
    assert!(results.names.iter().all(|n| n != "BUSBAR"));

    let summary = results.summary();
    assert_eq!(summary.lines_total, 4);
    assert_eq!(summary.analyzed, 3);

    let records = results.to_records(&compiled);
    assert!(records.iter().all(|r| r.line_id != "busbar"));
}

#[test]
fn serial_and_parallel_agree() {
    let compiled = compile_case(&three_bus()).expect("compile");
    let config = SolverConfig::default();
    let a = analyze_lines(&compiled.network, &config, &serial(), None).expect("serial");
    let b = analyze_lines(
        &compiled.network,
        &config,
        &AnalysisOptions {
            parallel: true,
            threads: Some(2),
        },
        None,
    )
    .expect("parallel");

    assert_eq!(a.line_ids, b.line_ids);
    assert_eq!(a.outcomes, b.outcomes);
    for (x, y) in a.scores.iter().zip(&b.scores) {
        assert!(x == y || (x - y).abs() < 1e-12);
    }
}

#[test]
fn progress_is_reported_once_per_analyzed_line() {
    let compiled = compile_case(&three_bus()).expect("compile");
    let mut events: Vec<RunProgressEvent> = Vec::new();
    let results = analyze_lines(
        &compiled.network,
        &SolverConfig::default(),
        &AnalysisOptions::default(),
        Some(&mut |event| events.push(event)),
    )
    .expect("analysis");

    assert_eq!(events.len(), results.len());
    assert!(events.iter().all(|e| e.stage == RunStage::AnalyzingLines));
    let mut completed: Vec<usize> = events
        .iter()
        .filter_map(|e| e.line.as_ref().map(|l| l.completed))
        .collect();
    completed.sort_unstable();
    assert_eq!(completed, vec![1, 2, 3]);
    assert!(events.iter().all(|e| e.line.as_ref().is_some_and(|l| l.total == 3)));
}

#[test]
fn ranking_orders_by_score() {
    let compiled = compile_case(&three_bus()).expect("compile");
    let results = analyze_lines(&compiled.network, &SolverConfig::default(), &serial(), None)
        .expect("analysis");
    let ranking = results.ranking();
    assert_eq!(ranking.len(), 3);
    for pair in ranking.windows(2) {
        assert!(results.scores[pair[0]] <= results.scores[pair[1]]);
    }
}

#[test]
fn unreachable_limit_has_no_instanton() {
    let mut case = two_bus();
    // the limit sits below the forced temperature: the level is negative
    case.lines[0].thermal.limit_c = 70.0;
    let compiled = compile_case(&case).expect("compile");
    let results = analyze_lines(&compiled.network, &SolverConfig::default(), &serial(), None)
        .expect("analysis");
    assert_eq!(results.outcomes[0], LineOutcome::NoInstanton);
    assert!(results.scores[0].is_infinite());
    assert!(results.solutions[0].is_empty());
    assert!(results.to_records(&compiled)[0].score.is_none());
}

#[test]
fn line_listing_reports_levels_and_skips() {
    let lines = list_lines(&three_bus());
    assert_eq!(lines.len(), 4);
    assert!((lines[0].level - 0.8).abs() < 1e-9);
    assert!(lines[3].skipped);
    assert!(!lines[0].skipped);
}

#[test]
fn solver_overrides_are_applied() {
    let mut case = two_bus();
    case.solver = Some(SolverDef {
        max_bisection_iters: Some(100),
        stall_criterion: Some("repeated_residual".to_string()),
        ..SolverDef::default()
    });
    let config = solver_config(&case).expect("config");
    assert_eq!(config.max_bisection_iters, 100);
    assert_eq!(config.stall_criterion, StallCriterion::RepeatedResidual);
    assert_eq!(config.tolerance, SolverConfig::default().tolerance);

    case.solver = Some(SolverDef {
        stall_criterion: Some("secant".to_string()),
        ..SolverDef::default()
    });
    assert!(matches!(
        solver_config(&case),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn unknown_line_key_is_reported() {
    let compiled = compile_case(&two_bus()).expect("compile");
    assert!(compiled.find_line("tie").is_ok());
    assert!(matches!(
        compiled.find_line("nope"),
        Err(AppError::LineNotFound(_))
    ));
}
