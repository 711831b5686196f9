//! # Aggregation Engine Module
//!
//! Computes the nutrient totals of one survey:
//!
//! 1. rows sharing the same food description are merged (weekly grams summed)
//! 2. each distinct description is matched once against the catalog
//! 3. matched lines are joined to their food group
//! 4. every catalog nutrient is summed as `weekly_grams / 100 * amount_per_100g`
//!
//! Unmatched lines and non-numeric nutrient cells contribute exactly 0.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::food_matcher::{FoodMatcher, MatchResult, MatchSummary};
use crate::reference_catalog::ReferenceCatalog;
use crate::survey_types::{NutrientTotals, SurveyLine};

/// A distinct food description with the mass summed over its rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedLine {
    pub food_item: String,
    pub weekly_grams: f64,
    /// Number of survey rows merged into this line
    pub source_rows: usize,
}

/// Result of aggregating one survey
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationOutcome {
    pub totals: NutrientTotals,
    /// Merged lines in food-description order
    pub lines: Vec<GroupedLine>,
    /// Match for each entry of `lines`
    pub matches: MatchSummary,
}

impl AggregationOutcome {
    /// Matches that were accepted, paired with their merged line
    pub fn matched_lines(&self) -> impl Iterator<Item = (&GroupedLine, &MatchResult)> {
        self.lines
            .iter()
            .zip(&self.matches.results)
            .filter_map(|(line, result)| result.as_ref().map(|r| (line, r)))
    }
}

/// Sums nutrient contributions of survey lines against a catalog
pub struct AggregationEngine<'a> {
    catalog: &'a ReferenceCatalog,
    matcher: &'a FoodMatcher,
}

impl<'a> AggregationEngine<'a> {
    pub fn new(catalog: &'a ReferenceCatalog, matcher: &'a FoodMatcher) -> Self {
        Self { catalog, matcher }
    }

    /// Merge lines with identical food text, summing their weekly grams
    ///
    /// The output is ordered by food text.
    pub fn merge_duplicates(lines: &[SurveyLine]) -> Vec<GroupedLine> {
        let mut grouped: BTreeMap<&str, GroupedLine> = BTreeMap::new();
        for line in lines {
            grouped
                .entry(line.food_item.as_str())
                .and_modify(|g| {
                    g.weekly_grams += line.weekly_grams;
                    g.source_rows += 1;
                })
                .or_insert_with(|| GroupedLine {
                    food_item: line.food_item.clone(),
                    weekly_grams: line.weekly_grams,
                    source_rows: 1,
                });
        }

        let merged: Vec<GroupedLine> = grouped.into_values().collect();
        if merged.len() < lines.len() {
            debug!(
                "Merged {} survey lines into {} distinct food items",
                lines.len(),
                merged.len()
            );
        }
        merged
    }

    /// Aggregate a survey's lines into nutrient totals
    ///
    /// Every catalog nutrient appears in the totals, at 0 when nothing
    /// contributed to it.
    pub fn aggregate(&self, lines: &[SurveyLine]) -> AggregationOutcome {
        let grouped = Self::merge_duplicates(lines);
        let food_items: Vec<String> = grouped.iter().map(|g| g.food_item.clone()).collect();
        let matches = self.matcher.match_all(&food_items, self.catalog.names());

        let nutrients = self.catalog.nutrient_columns();
        let mut sums = vec![0.0_f64; nutrients.len()];

        for (line, result) in grouped.iter().zip(&matches.results) {
            let Some(result) = result else {
                continue;
            };
            let Some(group) = self.catalog.get(&result.food_group) else {
                warn!(
                    "'{}' maps to '{}', which is not in the catalog; contributes 0",
                    line.food_item, result.food_group
                );
                continue;
            };
            for (index, sum) in sums.iter_mut().enumerate() {
                if let Some(per_100g) = self.catalog.nutrient_amount(group, index) {
                    *sum += line.weekly_grams / 100.0 * per_100g;
                }
            }
        }

        let totals = nutrients
            .iter()
            .cloned()
            .zip(sums)
            .collect::<NutrientTotals>();

        AggregationOutcome {
            totals,
            lines: grouped,
            matches,
        }
    }
}
