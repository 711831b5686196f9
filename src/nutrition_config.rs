//! # Nutrition Configuration Module
//!
//! This module defines configuration structures for survey processing:
//! the survey sheet layout, food matching thresholds and overrides, the
//! catalog layout and the engine configuration that ties them together.

use std::collections::HashMap;

use crate::frequency_resolver::FrequencyMapping;

// Constants for survey processing
pub const DEFAULT_MIN_SCORE: u8 = 80;
pub const FOOD_ITEM_COLUMN: &str = "ALIMENT";
pub const PORTION_SMALL_COLUMN: &str = "PETITE";
pub const PORTION_MEDIUM_COLUMN: &str = "MOYENNE";
pub const PORTION_LARGE_COLUMN: &str = "GROSSE";
pub const SEX_MARKER_CELL: &str = "K2";
pub const CATALOG_KEY_COLUMN: &str = "groupe_ffq";
pub const OBSERVED_VALUE_COLUMN: &str = "Valeurs obtenues";

/// Characters read as "selected, small portion" in a frequency cell
pub const DEFAULT_CHECK_MARKS: &[char] = &['x', 'X', '✓', '✔'];

/// Catalog columns that never hold a nutrient amount
pub const STRUCTURAL_COLUMNS: &[&str] = &[
    CATALOG_KEY_COLUMN,
    "food_item",
    "matched_food_group",
    "weekly_frequency",
    "weekly_grams",
    "portion_grams",
    "portion_small",
    "portion_medium",
    "portion_large",
];

/// Survey descriptions that fuzzy matching gets wrong, with their catalog group
pub const DEFAULT_MANUAL_OVERRIDES: &[(&str, &str)] = &[(
    "Viande de porc (hors charcuterie): rôti, émincés, côte, filet mignon",
    "Viande de porc : rôti, émincés, côte, filet mignon",
)];

/// Column names and marker cells of a questionnaire sheet
#[derive(Debug, Clone)]
pub struct SurveyLayout {
    /// Free-text food description column
    pub food_item_column: String,
    /// Small portion weight column (grams)
    pub portion_small_column: String,
    /// Medium portion weight column (grams)
    pub portion_medium_column: String,
    /// Large portion weight column (grams)
    pub portion_large_column: String,
    /// Cell holding the respondent sex marker
    pub sex_cell: String,
    /// Check-mark characters rewritten to `1` before numeric coercion
    pub check_marks: Vec<char>,
}

impl Default for SurveyLayout {
    fn default() -> Self {
        Self {
            food_item_column: FOOD_ITEM_COLUMN.to_string(),
            portion_small_column: PORTION_SMALL_COLUMN.to_string(),
            portion_medium_column: PORTION_MEDIUM_COLUMN.to_string(),
            portion_large_column: PORTION_LARGE_COLUMN.to_string(),
            sex_cell: SEX_MARKER_CELL.to_string(),
            check_marks: DEFAULT_CHECK_MARKS.to_vec(),
        }
    }
}

/// Food matching configuration
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum similarity score (0-100) for a fuzzy match to be accepted
    pub min_score: u8,
    /// Drop non-ASCII characters before scoring
    pub force_ascii: bool,
    /// Exact survey text -> catalog group, applied regardless of score
    pub manual_overrides: HashMap<String, String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            force_ascii: true,
            manual_overrides: DEFAULT_MANUAL_OVERRIDES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

/// Layout of the nutrient reference catalog
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Column holding the canonical food-group name
    pub key_column: String,
    /// Columns excluded from nutrient sums
    pub excluded_columns: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            key_column: CATALOG_KEY_COLUMN.to_string(),
            excluded_columns: STRUCTURAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CatalogConfig {
    pub fn is_excluded(&self, column: &str) -> bool {
        column == self.key_column || self.excluded_columns.iter().any(|c| c == column)
    }
}

/// Full engine configuration
///
/// No `Default`: the frequency mapping depends on the questionnaire template
/// and must be chosen by the caller.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub layout: SurveyLayout,
    pub matcher: MatcherConfig,
    pub catalog: CatalogConfig,
    pub frequency: FrequencyMapping,
}

impl EngineConfig {
    /// Default layouts and matching rules for the given frequency mapping
    pub fn new(frequency: FrequencyMapping) -> Self {
        Self {
            layout: SurveyLayout::default(),
            matcher: MatcherConfig::default(),
            catalog: CatalogConfig::default(),
            frequency,
        }
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.matcher.min_score = min_score.min(100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matcher_carries_pork_override() {
        let config = MatcherConfig::default();
        assert_eq!(config.min_score, 80);
        assert_eq!(
            config
                .manual_overrides
                .get("Viande de porc (hors charcuterie): rôti, émincés, côte, filet mignon")
                .map(String::as_str),
            Some("Viande de porc : rôti, émincés, côte, filet mignon")
        );
    }

    #[test]
    fn test_catalog_key_is_never_a_nutrient() {
        let config = CatalogConfig::default();
        assert!(config.is_excluded("groupe_ffq"));
        assert!(config.is_excluded("portion_medium"));
        assert!(!config.is_excluded("proteines"));
    }

    #[test]
    fn test_min_score_is_capped() {
        let config = EngineConfig::new(FrequencyMapping::questionnaire_v1()).with_min_score(250);
        assert_eq!(config.matcher.min_score, 100);
    }
}
