//! # Survey Processor Module
//!
//! Runs one questionnaire through the whole engine: sex marker, frequency
//! resolution, aggregation against the catalog and comparison with the
//! reference intake for that sex.

use chrono::Utc;
use log::info;
use std::path::Path;

use crate::aggregation::{AggregationEngine, AggregationOutcome};
use crate::comparison::{ComparisonReport, ComparisonReporter, ReferenceIntakes};
use crate::food_matcher::FoodMatcher;
use crate::frequency_resolver::FrequencyResolver;
use crate::nutrition_config::EngineConfig;
use crate::nutrition_errors::NutritionError;
use crate::reference_catalog::ReferenceCatalog;
use crate::report::{self, NutritionSummary};
use crate::survey_types::{Sex, SurveyLine, SurveySheet};
use crate::tabular_io;

/// Everything computed for one survey
#[derive(Debug, Clone)]
pub struct SurveyOutcome {
    pub sex: Sex,
    pub lines: Vec<SurveyLine>,
    pub aggregation: AggregationOutcome,
    pub comparison: ComparisonReport,
}

impl SurveyOutcome {
    /// Result document for this survey, stamped with the current time
    pub fn to_summary(&self, survey: &str) -> NutritionSummary {
        NutritionSummary {
            survey: survey.to_string(),
            sex: self.sex,
            generated_at: Utc::now(),
            matched_items: self.aggregation.matches.matched(),
            total_items: self.aggregation.matches.total(),
            totals: self.aggregation.totals.clone(),
            comparison: self.comparison.clone(),
        }
    }
}

/// Immutable per-run engine state shared by every survey
pub struct SurveyProcessor {
    config: EngineConfig,
    catalog: ReferenceCatalog,
    matcher: FoodMatcher,
    reporter: ComparisonReporter,
    references: ReferenceIntakes,
}

impl SurveyProcessor {
    pub fn new(config: EngineConfig, catalog: ReferenceCatalog, references: ReferenceIntakes) -> Self {
        let matcher = FoodMatcher::new(&config.matcher);
        Self {
            config,
            catalog,
            matcher,
            reporter: ComparisonReporter::default(),
            references,
        }
    }

    /// Load the catalog and both reference templates
    ///
    /// Failing here is a resource error for the whole run.
    pub fn load(
        config: EngineConfig,
        catalog_path: &Path,
        male_reference: &Path,
        female_reference: &Path,
    ) -> Result<Self, NutritionError> {
        let catalog = ReferenceCatalog::load(catalog_path, &config.catalog)?;
        let references = ReferenceIntakes::load(male_reference, female_reference)?;
        Ok(Self::new(config, catalog, references))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Compute totals and the reference comparison for one survey sheet
    pub fn process(&self, sheet: &SurveySheet) -> Result<SurveyOutcome, NutritionError> {
        let sex = sheet.sex(&self.config.layout.sex_cell)?;

        let resolver = FrequencyResolver::new(&self.config.frequency, &self.config.layout);
        let lines = resolver.resolve_table(&sheet.table)?;

        let engine = AggregationEngine::new(&self.catalog, &self.matcher);
        let aggregation = engine.aggregate(&lines);

        let comparison = self
            .reporter
            .compare(&aggregation.totals, self.references.for_sex(sex))?;

        Ok(SurveyOutcome {
            sex,
            lines,
            aggregation,
            comparison,
        })
    }

    /// Read, process and write the result documents of one survey file
    pub fn process_file(&self, path: &Path, results_dir: &Path) -> Result<NutritionSummary, NutritionError> {
        let survey = survey_name(path);
        info!("Processing survey: {}", survey);

        let sheet = tabular_io::read_survey_sheet(path)?;
        let outcome = self.process(&sheet)?;
        let summary = outcome.to_summary(&survey);
        report::write_survey_summary(&summary, results_dir)?;
        Ok(summary)
    }
}

/// Survey name used in result file names: the file stem
pub fn survey_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ReferenceIntake;
    use crate::frequency_resolver::FrequencyMapping;
    use crate::survey_types::{Cell, Table};

    fn processor() -> SurveyProcessor {
        let config = EngineConfig::new(FrequencyMapping::questionnaire_v1());

        let mut catalog = Table::new(&["groupe_ffq", "proteines"]);
        catalog.push_row(vec![Cell::text("Pomme"), 0.3.into()]);
        let catalog = ReferenceCatalog::from_table(&catalog, &config.catalog).unwrap();

        let reference = |sex| {
            let mut table = Table::new(&["Nutriment", "Référence", "Valeurs obtenues"]);
            table.push_row(vec![Cell::text("Protéines"), Cell::text("50 g")]);
            ReferenceIntake::new(sex, "ref", table)
        };
        let references = ReferenceIntakes {
            male: reference(Sex::Male),
            female: reference(Sex::Female),
        };
        SurveyProcessor::new(config, catalog, references)
    }

    fn sheet(sex: &str) -> SurveySheet {
        let mut table = Table::new(&["ALIMENT", "PETITE", "MOYENNE", "GROSSE", "1 SEMAINE"]);
        table.push_row(vec![
            Cell::text("Pomme"),
            100.0.into(),
            150.0.into(),
            200.0.into(),
            Cell::text("x"),
        ]);
        SurveySheet::new(table).with_cell("K2", Cell::text(sex))
    }

    #[test]
    fn test_process_small_portion_check_mark() {
        let outcome = processor().process(&sheet("F")).unwrap();
        assert_eq!(outcome.sex, Sex::Female);
        assert_eq!(outcome.lines[0].weekly_grams, 100.0);
        assert!((outcome.aggregation.totals.get("proteines").unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(outcome.comparison.rows[0].reference_value, Some(50.0));
    }

    #[test]
    fn test_invalid_sex_fails_the_survey() {
        let err = processor().process(&sheet("?")).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidSex(_)));
        assert!(!err.is_fatal_for_batch());
    }

    #[test]
    fn test_summary_counts_matches() {
        let summary = processor().process(&sheet("M")).unwrap().to_summary("survey_07");
        assert_eq!(summary.survey, "survey_07");
        assert_eq!(summary.matched_items, 1);
        assert_eq!(summary.total_items, 1);
    }
}
