//! # Food Matcher Module
//!
//! Fuzzy-matches free-text questionnaire descriptions to canonical catalog
//! food-group names.
//!
//! A match is accepted when the best [`weighted_ratio`] reaches the minimum
//! score (80 by default). Descriptions listed in the manual-override table are
//! mapped to their configured group unconditionally, whatever their score.
//! Unmatched descriptions are simply left out of the nutrient sums.

use log::{debug, info, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::fuzzy_score::weighted_ratio;
use crate::nutrition_config::MatcherConfig;

/// Association between a survey description and a catalog food group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub food_item: String,
    pub food_group: String,
    /// Similarity between the description and the chosen group (0-100)
    pub score: u8,
    /// Chosen through the manual-override table rather than by score
    pub overridden: bool,
}

/// Outcome of matching every distinct description of one survey
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchSummary {
    /// One slot per input description, in input order
    pub results: Vec<Option<MatchResult>>,
}

impl MatchSummary {
    pub fn matched(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Percentage of matched descriptions (0 when there is nothing to match)
    pub fn match_rate(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.matched() as f64 / self.total() as f64 * 100.0
        }
    }
}

/// Fuzzy food-group matcher with manual overrides
#[derive(Debug, Clone)]
pub struct FoodMatcher {
    min_score: u8,
    force_ascii: bool,
    overrides: HashMap<String, String>,
}

impl Default for FoodMatcher {
    fn default() -> Self {
        Self::new(&MatcherConfig::default())
    }
}

impl FoodMatcher {
    /// Create a matcher from configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ffq_nutrition::food_matcher::FoodMatcher;
    /// use ffq_nutrition::nutrition_config::MatcherConfig;
    ///
    /// let matcher = FoodMatcher::new(&MatcherConfig::default());
    /// let catalog = vec!["Pomme".to_string(), "Poire".to_string()];
    ///
    /// let result = matcher.match_item("Pomme", &catalog).unwrap();
    /// assert_eq!(result.food_group, "Pomme");
    /// assert_eq!(result.score, 100);
    /// ```
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            min_score: config.min_score,
            force_ascii: config.force_ascii,
            overrides: config.manual_overrides.clone(),
        }
    }

    /// Add or replace a manual override
    pub fn with_override(mut self, food_item: &str, food_group: &str) -> Self {
        self.overrides.insert(food_item.to_string(), food_group.to_string());
        self
    }

    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    /// Highest-scoring candidate, without any threshold; ties keep the first
    pub fn best_match<'c>(&self, food_item: &str, candidates: &'c [String]) -> Option<(&'c str, u8)> {
        let mut best: Option<(&'c str, u8)> = None;
        for candidate in candidates {
            let score = weighted_ratio(food_item, candidate, self.force_ascii);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate.as_str(), score));
                if score == 100 {
                    break;
                }
            }
        }
        best
    }

    /// Match against the configured minimum score
    pub fn match_item(&self, food_item: &str, candidates: &[String]) -> Option<MatchResult> {
        self.match_with_threshold(food_item, candidates, self.min_score)
    }

    /// Match against an explicit minimum score
    ///
    /// The override table is consulted by exact text; an override always wins.
    pub fn match_with_threshold(
        &self,
        food_item: &str,
        candidates: &[String],
        min_score: u8,
    ) -> Option<MatchResult> {
        if let Some(target) = self.overrides.get(food_item) {
            let score = weighted_ratio(food_item, target, self.force_ascii);
            debug!("Manual override: '{}' -> '{}' (score {})", food_item, target, score);
            return Some(MatchResult {
                food_item: food_item.to_string(),
                food_group: target.clone(),
                score,
                overridden: true,
            });
        }

        match self.best_match(food_item, candidates) {
            Some((group, score)) if score >= min_score => {
                trace!("Matched '{}' -> '{}' (score {})", food_item, group, score);
                Some(MatchResult {
                    food_item: food_item.to_string(),
                    food_group: group.to_string(),
                    score,
                    overridden: false,
                })
            }
            Some((group, score)) => {
                debug!(
                    "No match for '{}': best candidate '{}' scored {} < {}",
                    food_item, group, score, min_score
                );
                None
            }
            None => {
                warn!("No catalog candidates to match '{}' against", food_item);
                None
            }
        }
    }

    /// Match every description against the catalog names in parallel
    pub fn match_all(&self, food_items: &[String], candidates: &[String]) -> MatchSummary {
        let results: Vec<Option<MatchResult>> = food_items
            .par_iter()
            .map(|item| self.match_item(item, candidates))
            .collect();
        let summary = MatchSummary { results };

        info!(
            "Matched {}/{} food items ({:.1}%)",
            summary.matched(),
            summary.total(),
            summary.match_rate()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<String> {
        ["Pomme", "Poire", "Ananas", "Pomme de terre frite"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_exact_member_scores_100() {
        let matcher = FoodMatcher::default();
        for name in catalog() {
            let result = matcher.match_with_threshold(&name, &catalog(), 80).unwrap();
            assert_eq!(result.food_group, name);
            assert_eq!(result.score, 100);
            assert!(!result.overridden);
        }
    }

    #[test]
    fn test_below_threshold_is_rejected() {
        let matcher = FoodMatcher::default();
        let candidates = vec!["Ananas".to_string()];

        assert_eq!(matcher.best_match("Banane", &candidates), Some(("Ananas", 67)));
        assert!(matcher.match_with_threshold("Banane", &candidates, 80).is_none());
        assert!(matcher.match_with_threshold("Banane", &candidates, 60).is_some());
    }

    #[test]
    fn test_override_bypasses_score() {
        let matcher = FoodMatcher::default().with_override("Chips", "Pomme de terre frite");
        let candidates = catalog();

        assert!(FoodMatcher::default().match_item("Chips", &candidates).is_none());

        let result = matcher.match_item("Chips", &candidates).unwrap();
        assert_eq!(result.food_group, "Pomme de terre frite");
        assert!(result.overridden);
        assert!(result.score < 80);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let matcher = FoodMatcher::default();
        let candidates = vec!["Lait".to_string(), "lait".to_string()];
        assert_eq!(matcher.best_match("LAIT", &candidates), Some(("Lait", 100)));
    }

    #[test]
    fn test_match_all_preserves_order_and_counts() {
        let matcher = FoodMatcher::default();
        let items = vec!["Poire".to_string(), "Chocolat".to_string(), "Pomme".to_string()];
        let summary = matcher.match_all(&items, &catalog());

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.matched(), 2);
        assert_eq!(summary.results[0].as_ref().unwrap().food_group, "Poire");
        assert!(summary.results[1].is_none());
        assert_eq!(summary.results[2].as_ref().unwrap().food_group, "Pomme");
    }

    #[test]
    fn test_empty_catalog_matches_nothing() {
        let matcher = FoodMatcher::default();
        assert!(matcher.match_item("Pomme", &[]).is_none());
        assert_eq!(MatchSummary::default().match_rate(), 0.0);
    }
}
