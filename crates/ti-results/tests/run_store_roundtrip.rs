use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ti_results::{LineOutcome, LineRecord, ResultsError, RunManifest, RunStore, RunSummary};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn manifest(run_id: &str, timestamp: &str) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        case_name: "grid".to_string(),
        timestamp: timestamp.to_string(),
        solver_version: "0.1.0".to_string(),
        horizon: 2,
        summary: RunSummary {
            lines_total: 2,
            analyzed: 2,
            solved: 1,
            no_instanton: 1,
            ..RunSummary::default()
        },
    }
}

fn records() -> Vec<LineRecord> {
    vec![
        LineRecord {
            line_id: "l1".to_string(),
            name: "Tie".to_string(),
            outcome: LineOutcome::Solved,
            score: Some(0.42),
            multiplier: Some(-1.5),
            deviations: vec![vec![0.1], vec![0.2]],
            angles: vec![vec![0.3, 0.0], vec![0.4, 0.0]],
            mismatches: vec![0.1, 0.2],
            angle_diffs: vec![0.05, 0.07],
            stalls: 0,
        },
        LineRecord {
            line_id: "l2".to_string(),
            name: "Spur".to_string(),
            outcome: LineOutcome::NoInstanton,
            score: None,
            multiplier: None,
            deviations: vec![],
            angles: vec![],
            mismatches: vec![],
            angle_diffs: vec![],
            stalls: 0,
        },
    ]
}

#[test]
fn save_list_load_roundtrip() {
    let case_dir = unique_temp_dir("ti_results_case");
    fs::create_dir_all(&case_dir).expect("failed to create temp case dir");
    let case_path = case_dir.join("grid.yaml");
    fs::write(&case_path, "version: 1\nname: grid\n").expect("failed to write case file");

    let store = RunStore::for_case(&case_path).expect("failed to create run store");
    assert!(store.root_dir().ends_with(".instanton/runs"));

    store
        .save_run(&manifest("run-123", "2026-02-26T00:00:00Z"), &records())
        .expect("failed to save run");
    assert!(store.has_run("run-123"));

    let runs = store.list_runs("grid").expect("failed to list runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].summary.solved, 1);
    assert!(store.list_runs("other").expect("list").is_empty());

    let loaded = store.load_lines("run-123").expect("failed to load lines");
    assert_eq!(loaded, records());
    assert_eq!(loaded[1].score_or_inf(), f64::INFINITY);
}

#[test]
fn runs_are_listed_most_recent_first() {
    let store = RunStore::new(unique_temp_dir("ti_results_order")).expect("store");
    store
        .save_run(&manifest("old", "2026-01-01T00:00:00Z"), &[])
        .expect("save");
    store
        .save_run(&manifest("new", "2026-03-01T00:00:00Z"), &[])
        .expect("save");

    let runs = store.list_runs("grid").expect("list");
    let ids: Vec<_> = runs.iter().map(|m| m.run_id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[test]
fn deleted_run_is_not_found() {
    let store = RunStore::new(unique_temp_dir("ti_results_delete")).expect("store");
    store
        .save_run(&manifest("gone", "2026-01-01T00:00:00Z"), &records())
        .expect("save");
    store.delete_run("gone").expect("delete");
    assert!(!store.has_run("gone"));
    assert!(matches!(
        store.load_manifest("gone"),
        Err(ResultsError::RunNotFound { .. })
    ));
    assert!(matches!(
        store.load_lines("gone"),
        Err(ResultsError::RunNotFound { .. })
    ));
}

#[test]
fn failed_outcome_keeps_reason() {
    let record = LineRecord {
        outcome: LineOutcome::Failed {
            reason: "degenerate block".to_string(),
        },
        score: None,
        ..records()[1].clone()
    };
    let json = serde_json::to_string(&record).expect("serialize");
    assert!(json.contains("\"type\":\"Failed\""));
    let back: LineRecord = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.outcome.label(), "failed");
}

#[test]
fn single_line_is_loaded_by_id() {
    let store = RunStore::new(unique_temp_dir("ti_results_line")).expect("store");
    store
        .save_run(&manifest("run-1", "2026-01-01T00:00:00Z"), &records())
        .expect("save");

    let spur = store.load_line("run-1", "l2").expect("load line");
    assert_eq!(spur, records()[1]);
    assert!(matches!(
        store.load_line("run-1", "l9"),
        Err(ResultsError::LineNotFound { line_id, .. }) if line_id == "l9"
    ));
    assert!(matches!(
        store.load_line("missing", "l1"),
        Err(ResultsError::RunNotFound { .. })
    ));
}

#[test]
fn duplicate_line_ids_are_rejected() {
    let store = RunStore::new(unique_temp_dir("ti_results_dup")).expect("store");
    let mut recs = records();
    recs[1].line_id = "l1".to_string();
    assert!(matches!(
        store.save_run(&manifest("dup", "2026-01-01T00:00:00Z"), &recs),
        Err(ResultsError::DuplicateLine { line_id, .. }) if line_id == "l1"
    ));
    assert!(!store.has_run("dup"));
}

#[test]
fn run_without_manifest_is_ignored() {
    let root = unique_temp_dir("ti_results_partial");
    let store = RunStore::new(root.clone()).expect("store");
    fs::create_dir_all(root.join("partial")).expect("mkdir");
    let line = serde_json::to_string(&records()[0]).expect("serialize");
    fs::write(root.join("partial").join("lines.jsonl"), line).expect("write");

    assert!(!store.has_run("partial"));
    assert!(store.list_runs("grid").expect("list").is_empty());
    assert!(matches!(
        store.load_lines("partial"),
        Err(ResultsError::RunNotFound { .. })
    ));
}
