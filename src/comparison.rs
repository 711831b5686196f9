//! # Comparison Reporter Module
//!
//! Compares a survey's nutrient totals against a sex-specific reference
//! intake template.
//!
//! The template is a table whose first column holds the nutrient display
//! name, whose second column holds the reference value (possibly annotated
//! with units, e.g. `"50 g/j"`), and which has a column whose header contains
//! `Valeurs obtenues` to receive the observed value.
//!
//! Display names are mapped to nutrient keys through [`NUTRIENT_ALIASES`]:
//! the first alias contained in the lowercased display name decides the key.
//! More specific aliases are listed before the aliases they contain
//! (`vitamine b12` before `vitamine b1`, `selenium` before `sel`).

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::nutrition_config::OBSERVED_VALUE_COLUMN;
use crate::nutrition_errors::NutritionError;
use crate::survey_types::{Cell, NutrientTotals, Sex, Table};
use crate::tabular_io;

/// Ordered (display-name fragment, nutrient key) pairs
pub const NUTRIENT_ALIASES: &[(&str, &str)] = &[
    ("protéines", "proteines"),
    ("glucides", "glucides"),
    ("lipides", "lipides"),
    ("sucres", "sucres"),
    ("fibres", "fibres"),
    ("ag saturés", "ags"),
    ("matières grasses", "lipides"),
    ("sélénium", "selenium"),
    ("selenium", "selenium"),
    ("sel", "sel"),
    ("vitamine a", "retinol"),
    ("vitamine b12", "vitamine_b12"),
    ("vitamine b1", "vitamine_b1"),
    ("vitamine b2", "vitamine_b2"),
    ("vitamine b3", "vitamine_b3"),
    ("vitamine b5", "vitamine_b5"),
    ("vitamine b6", "vitamine_b6"),
    ("vitamine b9", "vitamine_b9"),
    ("vitamine c", "vitamine_c"),
    ("vitamine d", "vitamine_d"),
    ("vitamine e", "vitamine_e"),
    ("vitamine k", "vitamine_k2"),
    ("calcium", "calcium"),
    ("cuivre", "cuivre"),
    ("fer", "fer"),
    ("iode", "iode"),
    ("magnésium", "magnesium"),
    ("magnesium", "magnesium"),
    ("phosphore", "phosphore"),
    ("potassium", "potassium"),
    ("sodium", "sodium"),
    ("zinc", "zinc"),
];

lazy_static! {
    static ref REFERENCE_VALUE_REGEX: Regex =
        Regex::new(r"(\d+\.?\d*)").expect("Reference value pattern should be valid");
}

/// Extract the first number written in a reference cell
///
/// ```rust
/// use ffq_nutrition::comparison::extract_reference_value;
/// use ffq_nutrition::survey_types::Cell;
///
/// assert_eq!(extract_reference_value(&Cell::text("50 g/j")), Some(50.0));
/// assert_eq!(extract_reference_value(&Cell::text("2.4 µg")), Some(2.4));
/// assert_eq!(extract_reference_value(&Cell::Number(900.0)), Some(900.0));
/// assert_eq!(extract_reference_value(&Cell::text("non défini")), None);
/// ```
pub fn extract_reference_value(cell: &Cell) -> Option<f64> {
    let text = cell.to_string();
    REFERENCE_VALUE_REGEX
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// `(observed - reference) / reference * 100`, rounded to one decimal
///
/// Returns 0 unless the reference is a positive finite number.
pub fn percentage_deviation(observed: f64, reference: Option<f64>) -> f64 {
    match reference {
        Some(reference) if reference.is_finite() && reference > 0.0 => {
            let deviation = (observed - reference) / reference * 100.0;
            if deviation.is_finite() {
                (deviation * 10.0).round() / 10.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Sex-specific reference intake template
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceIntake {
    pub sex: Sex,
    /// Display label, typically the template file name
    pub label: String,
    pub table: Table,
}

impl ReferenceIntake {
    pub fn new(sex: Sex, label: &str, table: Table) -> Self {
        Self {
            sex,
            label: label.to_string(),
            table,
        }
    }

    /// Load a template from a JSON table file
    ///
    /// Only the file itself is checked here; column layout is checked when
    /// comparing, so a malformed template fails the surveys using it.
    pub fn load(path: &Path, sex: Sex) -> Result<Self, NutritionError> {
        let table = tabular_io::read_table(path).map_err(|e| {
            NutritionError::CatalogUnavailable(format!("{}: {e}", path.display()))
        })?;
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| sex.to_string());
        info!("Loaded reference intake '{}' for sex {} ({} nutrients)", label, sex, table.len());
        Ok(Self::new(sex, &label, table))
    }
}

/// Reference templates for both sexes
#[derive(Debug, Clone)]
pub struct ReferenceIntakes {
    pub male: ReferenceIntake,
    pub female: ReferenceIntake,
}

impl ReferenceIntakes {
    pub fn load(male_path: &Path, female_path: &Path) -> Result<Self, NutritionError> {
        Ok(Self {
            male: ReferenceIntake::load(male_path, Sex::Male)?,
            female: ReferenceIntake::load(female_path, Sex::Female)?,
        })
    }

    pub fn for_sex(&self, sex: Sex) -> &ReferenceIntake {
        match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }
}

/// One nutrient row of a comparison report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Display name from the template
    pub nutrient: String,
    /// Nutrient key the display name resolved to
    pub nutrient_key: Option<String>,
    /// Reference cell as written in the template
    pub reference_text: String,
    pub reference_value: Option<f64>,
    pub observed: f64,
    pub deviation_pct: f64,
}

/// Per-nutrient comparison of one survey against its reference template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub sex: Sex,
    pub reference_label: String,
    pub rows: Vec<ComparisonRow>,
}

/// Compares nutrient totals with reference intakes
#[derive(Debug, Clone)]
pub struct ComparisonReporter {
    aliases: Vec<(String, String)>,
}

impl Default for ComparisonReporter {
    fn default() -> Self {
        Self::with_aliases(NUTRIENT_ALIASES)
    }
}

impl ComparisonReporter {
    /// Use a custom ordered alias table
    pub fn with_aliases(aliases: &[(&str, &str)]) -> Self {
        Self {
            aliases: aliases
                .iter()
                .map(|(fragment, key)| (fragment.to_lowercase(), key.to_string()))
                .collect(),
        }
    }

    /// Nutrient key for a display name: first alias contained in it wins
    pub fn resolve_alias(&self, display_name: &str) -> Option<&str> {
        let lowered = display_name.to_lowercase();
        self.aliases
            .iter()
            .find(|(fragment, _)| lowered.contains(fragment.as_str()))
            .map(|(_, key)| key.as_str())
    }

    /// Compare totals against a reference template
    ///
    /// Fails when the template has fewer than two columns or no observed
    /// value column; every data-quality problem degrades to 0 instead.
    pub fn compare(
        &self,
        totals: &NutrientTotals,
        reference: &ReferenceIntake,
    ) -> Result<ComparisonReport, NutritionError> {
        let table = &reference.table;
        if table.columns.len() < 2 {
            return Err(NutritionError::InvalidTable(format!(
                "reference '{}' needs a nutrient and a reference column",
                reference.label
            )));
        }
        if table.find_column_containing(OBSERVED_VALUE_COLUMN).is_none() {
            return Err(NutritionError::MissingColumn(format!(
                "'{OBSERVED_VALUE_COLUMN}' not found in reference '{}'",
                reference.label
            )));
        }

        let mut rows = Vec::with_capacity(table.len());
        let mut unresolved = 0usize;
        for row in 0..table.len() {
            let nutrient = table.cell(row, 0).to_string();
            let reference_cell = table.cell(row, 1);
            let reference_value = extract_reference_value(reference_cell);

            let nutrient_key = self.resolve_alias(&nutrient).map(str::to_string);
            let observed = match nutrient_key.as_deref().and_then(|key| totals.get(key)) {
                Some(value) => value,
                None => {
                    unresolved += 1;
                    debug!("No observed value for reference row '{}'", nutrient);
                    0.0
                }
            };

            rows.push(ComparisonRow {
                deviation_pct: percentage_deviation(observed, reference_value),
                nutrient,
                nutrient_key,
                reference_text: reference_cell.to_string(),
                reference_value,
                observed,
            });
        }

        if unresolved > 0 {
            warn!(
                "{}/{} reference rows of '{}' have no observed value",
                unresolved,
                rows.len(),
                reference.label
            );
        }

        Ok(ComparisonReport {
            sex: reference.sex,
            reference_label: reference.label.clone(),
            rows,
        })
    }
}
