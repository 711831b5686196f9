//! # Batch Driver Module
//!
//! Processes every survey file of a directory concurrently. Each survey runs
//! on the blocking pool; completed totals are appended to the shared cohort
//! accumulator under one async mutex. A failing survey is logged and counted,
//! and the batch moves on.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::cohort::CohortAccumulator;
use crate::nutrition_errors::NutritionError;
use crate::survey_processor::{survey_name, SurveyProcessor};

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Surveys processed successfully, sorted by name
    pub processed: Vec<String>,
    /// Failed surveys with the reason, sorted by name
    pub failed: Vec<(String, String)>,
    pub cohort: CohortAccumulator,
}

/// List survey files: `*.json`, sorted, ignoring `~` lock files
pub fn discover_surveys(surveys_dir: &Path) -> Result<Vec<PathBuf>, NutritionError> {
    let mut surveys: Vec<PathBuf> = std::fs::read_dir(surveys_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('~'))
        })
        .collect();
    surveys.sort();
    Ok(surveys)
}

/// Process every survey of `surveys_dir`, writing results into `results_dir`
pub async fn run_batch(
    processor: Arc<SurveyProcessor>,
    surveys_dir: &Path,
    results_dir: &Path,
) -> Result<BatchReport> {
    let surveys = discover_surveys(surveys_dir)
        .with_context(|| format!("Failed to list surveys in {}", surveys_dir.display()))?;
    if surveys.is_empty() {
        warn!(dir = %surveys_dir.display(), "No survey files found");
        return Ok(BatchReport::default());
    }
    info!(count = surveys.len(), "Found survey files to process");

    let cohort = Arc::new(Mutex::new(CohortAccumulator::new()));
    let mut tasks = JoinSet::new();

    for path in surveys {
        let processor = Arc::clone(&processor);
        let cohort = Arc::clone(&cohort);
        let results_dir = results_dir.to_path_buf();

        tasks.spawn(async move {
            let name = survey_name(&path);
            let worker = tokio::task::spawn_blocking(move || processor.process_file(&path, &results_dir));
            match worker.await {
                Ok(Ok(summary)) => {
                    cohort.lock().await.record(summary.sex, summary.totals);
                    Ok(name)
                }
                Ok(Err(e)) => Err((name, e)),
                Err(join_err) => Err((name, NutritionError::Io(format!("worker failed: {join_err}")))),
            }
        });
    }

    let mut report = BatchReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(name)) => {
                info!(survey = %name, "Survey processed");
                report.processed.push(name);
            }
            Ok(Err((name, e))) if e.is_fatal_for_batch() => {
                tasks.abort_all();
                return Err(anyhow::Error::new(e).context(format!("Aborting batch at survey {name}")));
            }
            Ok(Err((name, e))) => {
                error!(survey = %name, error = %e, "Survey failed, continuing with next");
                report.failed.push((name, e.to_string()));
            }
            Err(e) => error!(error = %e, "Survey task did not complete"),
        }
    }

    report.processed.sort();
    report.failed.sort();
    report.cohort = cohort.lock().await.clone();

    info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        "Batch finished"
    );
    Ok(report)
}
