//! # Report Module
//!
//! Per-survey result documents and the cohort statistics report.
//!
//! Each processed survey produces `<stem>_nutrition_summary.json` (machine
//! readable, reloaded by the analysis step) and `<stem>_nutrition_summary.txt`.
//! The analysis step writes `nutritional_statistics.txt` and
//! `nutritional_statistics.json`.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cohort::{CohortAccumulator, CohortStatistics, NutrientStatistics, SexGroupStatistics};
use crate::comparison::ComparisonReport;
use crate::nutrition_errors::NutritionError;
use crate::survey_types::{NutrientTotals, Sex};
use crate::tabular_io;

pub const SUMMARY_SUFFIX: &str = "_nutrition_summary";
pub const STATISTICS_FILE_STEM: &str = "nutritional_statistics";

/// Nutrients listed first in the statistics report
pub const KEY_NUTRIENTS: &[&str] = &[
    "proteines",
    "lipides",
    "glucides",
    "fibres",
    "sucres",
    "calcium",
    "fer",
    "vitamine_c",
];

/// Result document of one survey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionSummary {
    pub survey: String,
    pub sex: Sex,
    pub generated_at: DateTime<Utc>,
    pub matched_items: usize,
    pub total_items: usize,
    pub totals: NutrientTotals,
    pub comparison: ComparisonReport,
}

impl NutritionSummary {
    pub fn match_rate(&self) -> f64 {
        if self.total_items == 0 {
            0.0
        } else {
            self.matched_items as f64 / self.total_items as f64 * 100.0
        }
    }
}

/// Human-readable rendering of a survey summary
pub fn render_survey_summary(summary: &NutritionSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== NUTRITION SUMMARY: {} ===", summary.survey);
    let _ = writeln!(out, "Sex: {}", summary.sex);
    let _ = writeln!(out, "Generated: {}", summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        "Matched food items: {}/{} ({:.1}%)",
        summary.matched_items,
        summary.total_items,
        summary.match_rate()
    );

    let _ = writeln!(out, "\nTOTAL WEEKLY NUTRITIONAL INTAKE:");
    for (nutrient, value) in summary.totals.iter() {
        let _ = writeln!(out, "{nutrient}: {value:.2}");
    }

    let comparison = &summary.comparison;
    let _ = writeln!(
        out,
        "\nCOMPARISON WITH REFERENCE ({}):",
        comparison.reference_label
    );
    let _ = writeln!(
        out,
        "{:<40} {:>16} {:>12} {:>10}",
        "Nutrient", "Reference", "Observed", "Diff (%)"
    );
    for row in &comparison.rows {
        let _ = writeln!(
            out,
            "{:<40} {:>16} {:>12.2} {:>10.1}",
            row.nutrient, row.reference_text, row.observed, row.deviation_pct
        );
    }
    out
}

/// Write the JSON and text summaries of one survey
///
/// Returns the path of the JSON document.
pub fn write_survey_summary(
    summary: &NutritionSummary,
    results_dir: &Path,
) -> Result<PathBuf, NutritionError> {
    fs::create_dir_all(results_dir)?;
    let stem = format!("{}{}", summary.survey, SUMMARY_SUFFIX);

    let json_path = results_dir.join(format!("{stem}.json"));
    tabular_io::write_json(&json_path, summary)?;
    fs::write(results_dir.join(format!("{stem}.txt")), render_survey_summary(summary))?;

    info!("Results saved to {}", json_path.display());
    Ok(json_path)
}

/// Reload every survey summary of a results directory into a cohort
///
/// Unreadable summaries are logged and skipped.
pub fn load_summaries(results_dir: &Path) -> Result<CohortAccumulator, NutritionError> {
    let suffix = format!("{SUMMARY_SUFFIX}.json");
    let mut paths: Vec<PathBuf> = fs::read_dir(results_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&suffix))
        })
        .collect();
    paths.sort();

    let mut cohort = CohortAccumulator::new();
    for path in &paths {
        let parsed = fs::read_to_string(path)
            .map_err(NutritionError::from)
            .and_then(|json| serde_json::from_str::<NutritionSummary>(&json).map_err(NutritionError::from));
        match parsed {
            Ok(summary) => cohort.record(summary.sex, summary.totals),
            Err(e) => warn!("Skipping summary {}: {}", path.display(), e),
        }
    }

    info!(
        "Loaded {}/{} survey summaries from {}",
        cohort.len(),
        paths.len(),
        results_dir.display()
    );
    Ok(cohort)
}

/// Nutrient names of a group: key nutrients first, then the rest alphabetically
fn report_order(group: &SexGroupStatistics) -> Vec<&str> {
    let mut order: Vec<&str> = KEY_NUTRIENTS
        .iter()
        .copied()
        .filter(|n| group.nutrients.contains_key(*n))
        .collect();
    order.extend(
        group
            .nutrients
            .keys()
            .map(String::as_str)
            .filter(|n| !KEY_NUTRIENTS.contains(n)),
    );
    order
}

fn format_std(stats: &NutrientStatistics) -> String {
    stats
        .std_dev
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Text rendering of cohort statistics
pub fn render_statistics_report(stats: &CohortStatistics, analysis_date: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== NUTRITIONAL ANALYSIS SUMMARY ===");
    let _ = writeln!(out, "\nAnalysis date: {}", analysis_date.format("%Y-%m-%d %H:%M:%S"));

    let total: usize = stats.groups.iter().map(|g| g.survey_count).sum();
    let _ = writeln!(out, "Number of surveys analyzed: {total}");
    for group in &stats.groups {
        let _ = writeln!(out, "  {}: {}", group.sex, group.survey_count);
    }

    for group in &stats.groups {
        let order = report_order(group);
        let _ = writeln!(out, "\n--- Sex {} ({} surveys) ---", group.sex, group.survey_count);

        let _ = writeln!(out, "\nMean values:");
        for nutrient in &order {
            if let Some(s) = group.nutrient(nutrient) {
                let _ = writeln!(out, "{nutrient}: {:.2}", s.mean);
            }
        }

        let _ = writeln!(out, "\nStandard deviations:");
        for nutrient in &order {
            if let Some(s) = group.nutrient(nutrient) {
                let _ = writeln!(out, "{nutrient}: {}", format_std(s));
            }
        }

        let _ = writeln!(out, "\nMedian / min / max (count):");
        for nutrient in &order {
            if let Some(s) = group.nutrient(nutrient) {
                let _ = writeln!(
                    out,
                    "{nutrient}: {:.2} / {:.2} / {:.2} ({})",
                    s.median, s.min, s.max, s.count
                );
            }
        }
    }
    out
}

/// Write `nutritional_statistics.txt` and `.json` into the reports directory
///
/// Returns the path of the text report.
pub fn write_statistics_report(
    stats: &CohortStatistics,
    reports_dir: &Path,
) -> Result<PathBuf, NutritionError> {
    fs::create_dir_all(reports_dir)?;
    let text_path = reports_dir.join(format!("{STATISTICS_FILE_STEM}.txt"));
    fs::write(&text_path, render_statistics_report(stats, Utc::now()))?;
    tabular_io::write_json(&reports_dir.join(format!("{STATISTICS_FILE_STEM}.json")), stats)?;

    info!("Statistics report written to {}", text_path.display());
    Ok(text_path)
}
