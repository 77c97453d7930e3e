//! On-disk run cache.
//!
//! Each run lives in `<root>/<run_id>/` as `lines.jsonl` (one [`LineRecord`]
//! per line) plus `manifest.json`. The manifest is written last, so a run
//! directory without one is an interrupted run and is ignored.

use crate::types::{LineRecord, RunManifest};
use crate::{ResultsError, ResultsResult};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "manifest.json";
const LINES_FILE: &str = "lines.jsonl";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store under `<case dir>/.instanton/runs`.
    pub fn for_case(case_path: &Path) -> ResultsResult<Self> {
        let case_dir = case_path.parent().ok_or_else(|| ResultsError::InvalidPath {
            message: format!("case path {} has no parent directory", case_path.display()),
        })?;
        Self::new(case_dir.join(".instanton").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST_FILE).exists()
    }

    /// Persist a run. Line ids must be unique within the run.
    pub fn save_run(&self, manifest: &RunManifest, records: &[LineRecord]) -> ResultsResult<()> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.line_id.as_str()) {
                return Err(ResultsError::DuplicateLine {
                    run_id: manifest.run_id.clone(),
                    line_id: record.line_id.clone(),
                });
            }
        }

        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let mut writer = BufWriter::new(File::create(run_dir.join(LINES_FILE))?);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST_FILE), manifest_json)?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.run_dir(run_id).join(MANIFEST_FILE);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every line record of a run, in stored order.
    pub fn load_lines(&self, run_id: &str) -> ResultsResult<Vec<LineRecord>> {
        let mut records = Vec::new();
        self.scan_lines(run_id, |record| {
            records.push(record);
            false
        })?;
        Ok(records)
    }

    /// One line's record, read without materializing the rest of the run.
    pub fn load_line(&self, run_id: &str, line_id: &str) -> ResultsResult<LineRecord> {
        let mut found = None;
        self.scan_lines(run_id, |record| {
            if record.line_id == line_id {
                found = Some(record);
                true
            } else {
                false
            }
        })?;
        found.ok_or_else(|| ResultsError::LineNotFound {
            run_id: run_id.to_string(),
            line_id: line_id.to_string(),
        })
    }

    /// Feed records of `lines.jsonl` to `visit` until it returns `true`.
    fn scan_lines<F>(&self, run_id: &str, mut visit: F) -> ResultsResult<()>
    where
        F: FnMut(LineRecord) -> bool,
    {
        if !self.has_run(run_id) {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let reader = BufReader::new(File::open(self.run_dir(run_id).join(LINES_FILE))?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if visit(serde_json::from_str(&line)?) {
                break;
            }
        }
        Ok(())
    }

    /// Manifests of every stored run for `case_name`, most recent first.
    pub fn list_runs(&self, case_name: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().to_string();
            if let Ok(manifest) = self.load_manifest(&run_id)
                && manifest.case_name == case_name
            {
                runs.push(manifest);
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
