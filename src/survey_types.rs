//! # Survey Types Module
//!
//! This module defines the core types shared by the questionnaire engine:
//! spreadsheet-like tabular records, survey sheets, resolved survey lines,
//! respondent sex and per-survey nutrient totals.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::nutrition_errors::NutritionError;

static EMPTY_CELL: Cell = Cell::Empty;

/// A single cell of a tabular record
///
/// Cells are untyped the way a spreadsheet cell is: the engine coerces them
/// to numbers or text at the point of use.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Blank cell (JSON `null`)
    #[default]
    Empty,
    /// Boolean cell
    Bool(bool),
    /// Numeric cell
    Number(f64),
    /// Text cell
    Text(String),
}

impl Cell {
    /// Build a text cell
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    /// `true` for empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion: numbers pass through, text is parsed after trimming.
    ///
    /// Returns `None` for blanks, booleans, unparseable text and non-finite values.
    pub fn to_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A header row plus data rows, as read from one worksheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Column headers
    pub columns: Vec<String>,
    /// Data rows; a row may be shorter than the header
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given headers
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a data row
    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Strip surrounding whitespace from every header
    pub fn normalize_headers(&mut self) {
        for column in &mut self.columns {
            let trimmed = column.trim();
            if trimmed.len() != column.len() {
                *column = trimmed.to_string();
            }
        }
    }

    /// Index of the column whose trimmed header equals `name` (also trimmed)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// Index of the first column whose header contains `fragment`
    pub fn find_column_containing(&self, fragment: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.contains(fragment))
    }

    /// Cell at (`row`, `column`); missing trailing cells read as empty
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One questionnaire worksheet: the food table plus free-standing cells
///
/// Free-standing cells are addressed by spreadsheet coordinates (e.g. `K2`,
/// which holds the respondent's sex in the questionnaire templates).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SurveySheet {
    #[serde(flatten)]
    pub table: Table,
    #[serde(default)]
    pub cells: HashMap<String, Cell>,
}

impl SurveySheet {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            cells: HashMap::new(),
        }
    }

    /// Set a free-standing cell
    pub fn with_cell(mut self, address: &str, value: Cell) -> Self {
        self.cells.insert(address.to_string(), value);
        self
    }

    /// Read the respondent sex from the given cell address
    pub fn sex(&self, address: &str) -> Result<Sex, NutritionError> {
        let cell = self.cells.get(address).unwrap_or(&EMPTY_CELL);
        Sex::from_marker(cell).map_err(|err| match err {
            NutritionError::InvalidSex(msg) => {
                NutritionError::InvalidSex(format!("cell {address}: {msg}"))
            }
            other => other,
        })
    }
}

/// Respondent sex, selecting the reference-intake table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// Parse an `M`/`F` marker (case-insensitive, surrounding blanks ignored)
    pub fn from_marker(cell: &Cell) -> Result<Self, NutritionError> {
        let Cell::Text(raw) = cell else {
            return Err(NutritionError::InvalidSex(
                "not specified, should be 'M' or 'F'".to_string(),
            ));
        };
        match raw.trim().to_uppercase().as_str() {
            "M" => Ok(Sex::Male),
            "F" => Ok(Sex::Female),
            other => Err(NutritionError::InvalidSex(format!(
                "'{other}' should be 'M' or 'F'"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portion size chosen for a food line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortionSize {
    Small,
    Medium,
    Large,
}

impl PortionSize {
    /// Portion implied by the value written in a frequency cell
    ///
    /// `1` is small, `2` medium, `3` large; any other value falls back to medium.
    pub fn from_indicator(value: f64) -> Self {
        if value == 1.0 {
            PortionSize::Small
        } else if value == 3.0 {
            PortionSize::Large
        } else {
            PortionSize::Medium
        }
    }
}

/// Gram weights of the three portion sizes offered on a survey line
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortionWeights {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl PortionWeights {
    pub fn new(small: f64, medium: f64, large: f64) -> Self {
        Self {
            small,
            medium,
            large,
        }
    }

    pub fn weight_for(&self, size: PortionSize) -> f64 {
        match size {
            PortionSize::Small => self.small,
            PortionSize::Medium => self.medium,
            PortionSize::Large => self.large,
        }
    }
}

/// Consumption-frequency answer categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyCode {
    Never,
    OneToThreePerMonth,
    OncePerWeek,
    TwoToFourPerWeek,
    FiveToSixPerWeek,
    Daily,
}

/// A questionnaire row after frequency resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyLine {
    /// Free-text food description as written in the survey
    pub food_item: String,
    /// Portion selected by the last non-zero frequency cell, if any
    pub portion: Option<PortionSize>,
    /// Gram weight of that portion
    pub portion_grams: f64,
    /// Occurrences per week, summed over every selected frequency code
    pub weekly_frequency: f64,
    /// `weekly_frequency * portion_grams`
    pub weekly_grams: f64,
}

/// Per-nutrient totals for one survey, keyed by catalog nutrient column
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutrientTotals(BTreeMap<String, f64>);

impl NutrientTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, nutrient: &str, value: f64) {
        self.0.insert(nutrient.to_string(), value);
    }

    /// Add to a nutrient, starting from zero
    pub fn add(&mut self, nutrient: &str, value: f64) {
        *self.0.entry(nutrient.to_string()).or_insert(0.0) += value;
    }

    pub fn get(&self, nutrient: &str) -> Option<f64> {
        self.0.get(nutrient).copied()
    }

    pub fn contains(&self, nutrient: &str) -> bool {
        self.0.contains_key(nutrient)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for NutrientTotals {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_numeric_coercion() {
        assert_eq!(Cell::Number(2.0).to_number(), Some(2.0));
        assert_eq!(Cell::text(" 150 ").to_number(), Some(150.0));
        assert_eq!(Cell::text("150g").to_number(), None);
        assert_eq!(Cell::text("nan").to_number(), None);
        assert_eq!(Cell::Empty.to_number(), None);
        assert_eq!(Cell::Bool(true).to_number(), None);
    }

    #[test]
    fn test_cell_display_matches_sheet_text() {
        assert_eq!(Cell::Number(120.0).to_string(), "120");
        assert_eq!(Cell::Number(0.8).to_string(), "0.8");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn test_cells_deserialize_untagged() {
        let row: Vec<Cell> = serde_json::from_str(r#"[null, 2, "x", true]"#).unwrap();
        assert_eq!(
            row,
            vec![Cell::Empty, Cell::Number(2.0), Cell::text("x"), Cell::Bool(true)]
        );
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let mut table = Table::new(&["ALIMENT", "PETITE"]);
        table.push_row(vec![Cell::text("Pomme")]);
        assert_eq!(table.cell(0, 1), &Cell::Empty);
        assert_eq!(table.cell(5, 0), &Cell::Empty);
    }

    #[test]
    fn test_header_normalization() {
        let mut table = Table::new(&[" ALIMENT", "JAMAIS "]);
        table.normalize_headers();
        assert_eq!(table.columns, vec!["ALIMENT", "JAMAIS"]);
        assert_eq!(table.column_index("JAMAIS "), Some(1));
    }

    #[test]
    fn test_sex_marker_parsing() {
        assert_eq!(Sex::from_marker(&Cell::text("m")).unwrap(), Sex::Male);
        assert_eq!(Sex::from_marker(&Cell::text(" F ")).unwrap(), Sex::Female);
        assert!(Sex::from_marker(&Cell::text("X")).is_err());
        assert!(Sex::from_marker(&Cell::Empty).is_err());
        assert!(Sex::from_marker(&Cell::Number(1.0)).is_err());
    }

    #[test]
    fn test_sheet_sex_error_names_the_cell() {
        let sheet = SurveySheet::new(Table::new(&["ALIMENT"]));
        let err = sheet.sex("K2").unwrap_err();
        assert!(err.to_string().contains("K2"));
    }

    #[test]
    fn test_portion_indicator() {
        assert_eq!(PortionSize::from_indicator(1.0), PortionSize::Small);
        assert_eq!(PortionSize::from_indicator(2.0), PortionSize::Medium);
        assert_eq!(PortionSize::from_indicator(3.0), PortionSize::Large);
        assert_eq!(PortionSize::from_indicator(11.0), PortionSize::Medium);
        assert_eq!(PortionSize::from_indicator(1.5), PortionSize::Medium);
    }

    #[test]
    fn test_nutrient_totals_accumulate() {
        let mut totals = NutrientTotals::new();
        totals.add("fer", 1.5);
        totals.add("fer", 2.0);
        assert_eq!(totals.get("fer"), Some(3.5));
        assert_eq!(totals.get("zinc"), None);
    }
}
