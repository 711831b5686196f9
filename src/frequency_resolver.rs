//! # Frequency Resolver Module
//!
//! Turns the per-frequency response cells of a questionnaire row into a
//! consumption mass per week.
//!
//! ## Cell encoding
//!
//! Each frequency column holds `0`/blank when not selected, or a portion
//! indicator when selected: `1` small, `2` medium, `3` large, anything else
//! medium. Check marks (`x`, `✓`) are rewritten to `1` before numeric
//! coercion; anything that still fails to parse counts as `0`.
//!
//! ## Frequency mappings
//!
//! Questionnaire templates disagree on column labels and on the period their
//! counts are expressed in, so the code → occurrences table is an explicit
//! [`FrequencyMapping`] chosen per template rather than a built-in constant.

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::nutrition_config::SurveyLayout;
use crate::nutrition_errors::NutritionError;
use crate::survey_types::{Cell, FrequencyCode, PortionSize, PortionWeights, SurveyLine, Table};

/// Average number of days in a month used by the questionnaire templates
const DAYS_PER_MONTH: f64 = 30.5;

/// Period in which a mapping file expresses its occurrence counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingPeriod {
    Day,
    Week,
}

impl MappingPeriod {
    fn to_weekly(self, occurrences: f64) -> f64 {
        match self {
            MappingPeriod::Day => occurrences * 7.0,
            MappingPeriod::Week => occurrences,
        }
    }
}

/// One frequency column of a questionnaire template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    /// Column header as it appears in the survey sheet
    pub column: String,
    pub code: FrequencyCode,
    pub weekly_occurrences: f64,
}

impl FrequencyEntry {
    pub fn new(column: &str, code: FrequencyCode, weekly_occurrences: f64) -> Self {
        Self {
            column: column.trim().to_string(),
            code,
            weekly_occurrences,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MappingFile {
    name: String,
    period: MappingPeriod,
    codes: Vec<MappingFileEntry>,
}

#[derive(Debug, Deserialize)]
struct MappingFileEntry {
    column: String,
    code: FrequencyCode,
    occurrences: f64,
}

/// Ordered frequency columns of one questionnaire template
///
/// Entry order matters: when several columns are selected on the same row,
/// the portion of the last selected entry wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyMapping {
    name: String,
    entries: Vec<FrequencyEntry>,
}

impl FrequencyMapping {
    /// Build a mapping, rejecting empty tables, repeated columns and
    /// negative or non-finite counts
    pub fn new(name: &str, entries: Vec<FrequencyEntry>) -> Result<Self, NutritionError> {
        if entries.is_empty() {
            return Err(NutritionError::InvalidMapping(format!(
                "mapping '{name}' has no frequency columns"
            )));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.column.as_str()) {
                return Err(NutritionError::InvalidMapping(format!(
                    "mapping '{name}' lists column '{}' twice",
                    entry.column
                )));
            }
            if !entry.weekly_occurrences.is_finite() || entry.weekly_occurrences < 0.0 {
                return Err(NutritionError::InvalidMapping(format!(
                    "mapping '{name}' has invalid count {} for column '{}'",
                    entry.weekly_occurrences, entry.column
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            entries,
        })
    }

    /// First questionnaire template (`JAMAIS` … `TOUS`)
    pub fn questionnaire_v1() -> Self {
        Self::preset(
            "v1",
            [
                "JAMAIS",
                "1-3 MOIS",
                "1 SEMAINE",
                "2-4 SEMAINE",
                "5-6 SEMAINES",
                "TOUS",
            ],
        )
    }

    /// Second questionnaire template (`JAMAIS` … `TOUS LES JOURS`)
    pub fn questionnaire_v2() -> Self {
        Self::preset(
            "v2",
            [
                "JAMAIS",
                "1-3 FOIS MOIS",
                "1 FOIS SEMAINE",
                "2/4 FOIS SEMAINE",
                "5/6 FOIS SEMAINE",
                "TOUS LES JOURS",
            ],
        )
    }

    fn preset(name: &str, columns: [&str; 6]) -> Self {
        let weekly = [
            (FrequencyCode::Never, 0.0),
            (FrequencyCode::OneToThreePerMonth, 2.0 * 7.0 / DAYS_PER_MONTH),
            (FrequencyCode::OncePerWeek, 1.0),
            (FrequencyCode::TwoToFourPerWeek, 3.0),
            (FrequencyCode::FiveToSixPerWeek, 5.5),
            (FrequencyCode::Daily, 7.0),
        ];
        let entries = columns
            .iter()
            .zip(weekly)
            .map(|(column, (code, count))| FrequencyEntry::new(column, code, count))
            .collect();
        Self {
            name: name.to_string(),
            entries,
        }
    }

    /// Parse a JSON mapping file, normalising daily counts to weekly ones
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ffq_nutrition::frequency_resolver::FrequencyMapping;
    /// use ffq_nutrition::survey_types::FrequencyCode;
    ///
    /// let json = r#"{
    ///     "name": "daily-template",
    ///     "period": "day",
    ///     "codes": [
    ///         { "column": "JAMAIS", "code": "never", "occurrences": 0 },
    ///         { "column": "TOUS", "code": "daily", "occurrences": 1 }
    ///     ]
    /// }"#;
    /// let mapping = FrequencyMapping::from_json_str(json)?;
    /// assert_eq!(mapping.weekly_occurrences(FrequencyCode::Daily), Some(7.0));
    /// # Ok::<(), ffq_nutrition::nutrition_errors::NutritionError>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, NutritionError> {
        let file: MappingFile = serde_json::from_str(json)
            .map_err(|e| NutritionError::InvalidMapping(e.to_string()))?;
        let entries = file
            .codes
            .into_iter()
            .map(|c| FrequencyEntry::new(&c.column, c.code, file.period.to_weekly(c.occurrences)))
            .collect();
        Self::new(&file.name, entries)
    }

    pub fn from_file(path: &Path) -> Result<Self, NutritionError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            NutritionError::InvalidMapping(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Resolve a template selector: `v1`, `v2`, or the path of a mapping file
    pub fn select(template: &str) -> Result<Self, NutritionError> {
        match template.trim().to_lowercase().as_str() {
            "v1" => Ok(Self::questionnaire_v1()),
            "v2" => Ok(Self::questionnaire_v2()),
            _ => Self::from_file(Path::new(template.trim())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    /// Weekly count configured for a code (first entry carrying it)
    pub fn weekly_occurrences(&self, code: FrequencyCode) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.weekly_occurrences)
    }
}

/// Resolves questionnaire rows into [`SurveyLine`]s
pub struct FrequencyResolver<'a> {
    mapping: &'a FrequencyMapping,
    layout: &'a SurveyLayout,
}

impl<'a> FrequencyResolver<'a> {
    pub fn new(mapping: &'a FrequencyMapping, layout: &'a SurveyLayout) -> Self {
        Self { mapping, layout }
    }

    /// Coerce a frequency cell to its numeric value
    ///
    /// Check marks become `1`; blanks and unparseable content become `0`.
    pub fn coerce_frequency_cell(&self, cell: &Cell) -> f64 {
        match cell {
            Cell::Empty | Cell::Bool(_) => 0.0,
            Cell::Number(n) if n.is_finite() => *n,
            Cell::Number(_) => 0.0,
            Cell::Text(raw) => {
                let rewritten: String = raw
                    .chars()
                    .map(|c| if self.layout.check_marks.contains(&c) { '1' } else { c })
                    .collect();
                match rewritten.trim().parse::<f64>() {
                    Ok(value) if value.is_finite() => value,
                    _ => {
                        if !raw.trim().is_empty() {
                            debug!("Frequency cell '{}' is not numeric, treated as 0", raw);
                        }
                        0.0
                    }
                }
            }
        }
    }

    /// Resolve one row from its frequency values
    ///
    /// `responses[i]` is the coerced value of `mapping.entries()[i]`; missing
    /// trailing values count as not selected.
    pub fn resolve_line(&self, food_item: &str, responses: &[f64], weights: &PortionWeights) -> SurveyLine {
        let mut weekly_frequency = 0.0;
        let mut portion = None;
        let mut portion_grams = 0.0;
        let mut selected = 0;

        for (entry, &value) in self.mapping.entries().iter().zip(responses) {
            if value > 0.0 {
                let size = PortionSize::from_indicator(value);
                weekly_frequency += entry.weekly_occurrences;
                portion = Some(size);
                portion_grams = weights.weight_for(size);
                selected += 1;
            }
        }

        if selected > 1 {
            debug!(
                "'{}' has {} frequency columns selected; keeping the last portion ({:?})",
                food_item, selected, portion
            );
        }

        let line = SurveyLine {
            food_item: food_item.to_string(),
            portion,
            portion_grams,
            weekly_frequency,
            weekly_grams: weekly_frequency * portion_grams,
        };
        trace!("Resolved line: {:?}", line);
        line
    }

    /// Resolve every row of a survey table
    ///
    /// Rows without a food description are dropped. A missing food column is
    /// structural and fails the survey; missing frequency or portion columns
    /// only degrade to zero.
    pub fn resolve_table(&self, table: &Table) -> Result<Vec<SurveyLine>, NutritionError> {
        let food_column = table
            .column_index(&self.layout.food_item_column)
            .ok_or_else(|| NutritionError::MissingColumn(self.layout.food_item_column.clone()))?;

        let frequency_columns: Vec<Option<usize>> = self
            .mapping
            .entries()
            .iter()
            .map(|entry| table.column_index(&entry.column))
            .collect();
        let present = frequency_columns.iter().flatten().count();
        if present == 0 {
            warn!(
                "No frequency column of mapping '{}' found in survey; every line resolves to 0 g",
                self.mapping.name()
            );
        } else {
            debug!(
                "Found {}/{} frequency columns of mapping '{}'",
                present,
                frequency_columns.len(),
                self.mapping.name()
            );
        }

        let portion_columns = [
            &self.layout.portion_small_column,
            &self.layout.portion_medium_column,
            &self.layout.portion_large_column,
        ]
        .map(|name| {
            let index = table.column_index(name);
            if index.is_none() {
                warn!("Portion column '{}' missing; its weight is treated as 0 g", name);
            }
            index
        });

        let mut lines = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let food_cell = table.cell(row, food_column);
            if food_cell.is_blank() {
                trace!("Skipping row {} without a food item", row);
                continue;
            }

            let responses: Vec<f64> = frequency_columns
                .iter()
                .map(|column| match column {
                    Some(index) => self.coerce_frequency_cell(table.cell(row, *index)),
                    None => 0.0,
                })
                .collect();

            let [small, medium, large] = portion_columns.map(|column| {
                column
                    .and_then(|index| table.cell(row, index).to_number())
                    .unwrap_or(0.0)
            });

            lines.push(self.resolve_line(
                &food_cell.to_string(),
                &responses,
                &PortionWeights::new(small, medium, large),
            ));
        }

        info!("After cleaning: {} valid food items", lines.len());
        Ok(lines)
    }
}
