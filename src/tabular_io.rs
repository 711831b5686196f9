//! # Tabular IO Module
//!
//! Reads and writes the JSON flat files the engine works with: catalog and
//! reference-intake tables, survey sheets, and result documents.

use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::nutrition_errors::NutritionError;
use crate::survey_types::{SurveySheet, Table};

/// Parse a table from JSON text, stripping header whitespace
pub fn table_from_json_str(json: &str) -> Result<Table, NutritionError> {
    let mut table: Table = serde_json::from_str(json)?;
    table.normalize_headers();
    Ok(table)
}

/// Read a table file
pub fn read_table(path: &Path) -> Result<Table, NutritionError> {
    let json = fs::read_to_string(path)?;
    let table = table_from_json_str(&json)?;
    debug!(
        "Read table {} ({} columns, {} rows)",
        path.display(),
        table.columns.len(),
        table.len()
    );
    Ok(table)
}

/// Read a survey sheet file (table plus free-standing cells)
pub fn read_survey_sheet(path: &Path) -> Result<SurveySheet, NutritionError> {
    let json = fs::read_to_string(path)?;
    let mut sheet: SurveySheet = serde_json::from_str(&json)?;
    sheet.table.normalize_headers();
    debug!("Read survey {} ({} rows)", path.display(), sheet.table.len());
    Ok(sheet)
}

/// Write any serializable value as pretty JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), NutritionError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    debug!("Wrote {}", path.display());
    Ok(())
}
