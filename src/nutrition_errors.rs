//! # Nutrition Error Types Module
//!
//! This module defines the error types raised by the questionnaire engine.
//! Data-quality problems never surface here: they are degraded to zero
//! contributions and logged where they happen. Only structural, resource and
//! configuration failures become a `NutritionError`.

/// Custom error types for survey processing
#[derive(Debug, Clone, PartialEq)]
pub enum NutritionError {
    /// A required column is absent from a survey or reference table
    MissingColumn(String),
    /// The respondent sex marker is missing or not `M`/`F`
    InvalidSex(String),
    /// A table does not have the shape the engine expects
    InvalidTable(String),
    /// The nutrient catalog or a reference-intake file cannot be loaded
    CatalogUnavailable(String),
    /// Filesystem errors while reading surveys or writing results
    Io(String),
    /// A frequency mapping is empty, duplicated or otherwise unusable
    InvalidMapping(String),
    /// Two catalog rows share the same canonical food-group name
    DuplicateFoodGroup(String),
    /// Malformed JSON payloads
    Serialization(String),
}

impl NutritionError {
    /// Whether this error must stop the whole batch rather than a single survey
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(
            self,
            NutritionError::CatalogUnavailable(_) | NutritionError::DuplicateFoodGroup(_)
        )
    }
}

impl std::fmt::Display for NutritionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NutritionError::MissingColumn(msg) => write!(f, "Missing column: {msg}"),
            NutritionError::InvalidSex(msg) => write!(f, "Invalid sex marker: {msg}"),
            NutritionError::InvalidTable(msg) => write!(f, "Invalid table: {msg}"),
            NutritionError::CatalogUnavailable(msg) => write!(f, "Reference data unavailable: {msg}"),
            NutritionError::Io(msg) => write!(f, "I/O error: {msg}"),
            NutritionError::InvalidMapping(msg) => write!(f, "Invalid frequency mapping: {msg}"),
            NutritionError::DuplicateFoodGroup(msg) => write!(f, "Duplicate food group: {msg}"),
            NutritionError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for NutritionError {}

impl From<std::io::Error> for NutritionError {
    fn from(err: std::io::Error) -> Self {
        NutritionError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for NutritionError {
    fn from(err: serde_json::Error) -> Self {
        NutritionError::Serialization(err.to_string())
    }
}
