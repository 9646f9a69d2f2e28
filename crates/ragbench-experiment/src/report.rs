use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use ragbench_core::types::TopicRef;

use crate::result::ExperimentResult;

/// A finished experiment. Built once by the harness and only read afterwards.
#[derive(Debug, Serialize)]
pub struct Run {
    experiment_date: DateTime<Local>,
    test_categories: Vec<TopicRef>,
    results: Vec<ExperimentResult>,
}

impl Run {
    pub(crate) fn new(experiment_date: DateTime<Local>, test_categories: Vec<TopicRef>, results: Vec<ExperimentResult>) -> Self {
        Self { experiment_date, test_categories, results }
    }

    pub fn experiment_date(&self) -> DateTime<Local> { self.experiment_date }
    pub fn test_categories(&self) -> &[TopicRef] { &self.test_categories }
    pub fn results(&self) -> &[ExperimentResult] { &self.results }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.error().is_some()).count()
    }
}

/// Serialize `run` to `path` as pretty JSON.
///
/// The document is written to a temporary file next to `path` and renamed
/// into place, so readers never observe a partial report.
pub fn write_report(run: &Run, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating report directory {}", dir.display()))?;

    let tmp = NamedTempFile::new_in(dir).with_context(|| format!("creating temporary report in {}", dir.display()))?;
    let mut writer = BufWriter::new(tmp);
    serde_json::to_writer_pretty(&mut writer, run).context("serializing report")?;
    writer.write_all(b"\n")?;
    let tmp = writer.into_inner().map_err(|e| e.into_error()).context("flushing report")?;
    tmp.persist(path).with_context(|| format!("writing report to {}", path.display()))?;

    tracing::info!(path = %path.display(), records = run.results.len(), failures = run.failures(), "report written");
    Ok(())
}
