//! # FFQ Nutrition
//!
//! Converts food-frequency questionnaire responses into estimated weekly
//! nutrient intake: frequency answers become grams per week, free-text food
//! descriptions are fuzzy-matched to a nutrient reference catalog, nutrient
//! contributions are summed per survey and compared with sex-specific
//! reference intakes, and cohort statistics are computed per sex.

pub mod aggregation;
pub mod batch;
pub mod cohort;
pub mod comparison;
pub mod food_matcher;
pub mod frequency_resolver;
pub mod fuzzy_score;
pub mod nutrition_config;
pub mod nutrition_errors;
pub mod reference_catalog;
pub mod report;
pub mod survey_processor;
pub mod survey_types;
pub mod tabular_io;
