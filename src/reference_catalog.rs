//! # Reference Catalog Module
//!
//! Loads and indexes the nutrient-per-100g reference table, keyed by the
//! canonical food-group name (`groupe_ffq`). The catalog is loaded once per
//! run and is read-only afterwards, so it can be shared across worker threads.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;

use crate::nutrition_config::CatalogConfig;
use crate::nutrition_errors::NutritionError;
use crate::survey_types::Table;
use crate::tabular_io;

/// A catalog entry: one food group and its nutrient amounts per 100 g
#[derive(Debug, Clone, PartialEq)]
pub struct FoodGroup {
    pub name: String,
    /// Amount per 100 g for each nutrient column; `None` when the cell is not numeric
    nutrients: Vec<Option<f64>>,
}

/// Indexed nutrient reference table
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    names: Vec<String>,
    groups: Vec<FoodGroup>,
    index: HashMap<String, usize>,
    nutrient_columns: Vec<String>,
}

impl ReferenceCatalog {
    /// Build a catalog from a table
    ///
    /// Rows without a food-group name are skipped. Duplicate names are
    /// rejected since they would make the catalog join ambiguous.
    pub fn from_table(table: &Table, config: &CatalogConfig) -> Result<Self, NutritionError> {
        let key_column = table
            .column_index(&config.key_column)
            .ok_or_else(|| NutritionError::MissingColumn(config.key_column.clone()))?;

        let nutrient_indices: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| !config.is_excluded(name.trim()))
            .map(|(i, _)| i)
            .collect();
        let nutrient_columns: Vec<String> = nutrient_indices
            .iter()
            .map(|&i| table.columns[i].trim().to_string())
            .collect();

        let mut names = Vec::with_capacity(table.len());
        let mut groups = Vec::with_capacity(table.len());
        let mut index = HashMap::with_capacity(table.len());
        let mut non_numeric = 0usize;

        for row in 0..table.len() {
            let key_cell = table.cell(row, key_column);
            if key_cell.is_blank() {
                warn!("Catalog row {} has no '{}' value, skipped", row, config.key_column);
                continue;
            }
            let name = key_cell.to_string();
            if index.contains_key(&name) {
                return Err(NutritionError::DuplicateFoodGroup(name));
            }

            let nutrients: Vec<Option<f64>> = nutrient_indices
                .iter()
                .map(|&column| {
                    let cell = table.cell(row, column);
                    let value = cell.to_number();
                    if value.is_none() && !cell.is_blank() {
                        non_numeric += 1;
                    }
                    value
                })
                .collect();

            index.insert(name.clone(), groups.len());
            names.push(name.clone());
            groups.push(FoodGroup { name, nutrients });
        }

        if non_numeric > 0 {
            debug!("{} non-numeric nutrient cells in catalog will contribute 0", non_numeric);
        }
        info!(
            "Loaded nutrition data with {} food groups and {} nutrients",
            groups.len(),
            nutrient_columns.len()
        );

        Ok(Self {
            names,
            groups,
            index,
            nutrient_columns,
        })
    }

    /// Load the catalog from a JSON table file
    ///
    /// Any failure here is a resource error: the run cannot proceed without it.
    pub fn load(path: &Path, config: &CatalogConfig) -> Result<Self, NutritionError> {
        let table = tabular_io::read_table(path).map_err(|e| {
            NutritionError::CatalogUnavailable(format!("{}: {e}", path.display()))
        })?;
        match Self::from_table(&table, config) {
            Err(NutritionError::MissingColumn(column)) => Err(NutritionError::CatalogUnavailable(
                format!("{}: missing column '{column}'", path.display()),
            )),
            other => other,
        }
    }

    /// Canonical food-group names in catalog order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&FoodGroup> {
        self.index.get(name).map(|&i| &self.groups[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Nutrient column names in catalog order
    pub fn nutrient_columns(&self) -> &[String] {
        &self.nutrient_columns
    }

    /// Amount per 100 g of the nutrient at `nutrient_index` for a group
    pub fn nutrient_amount(&self, group: &FoodGroup, nutrient_index: usize) -> Option<f64> {
        group.nutrients.get(nutrient_index).copied().flatten()
    }

    /// Amount per 100 g of a named nutrient for a group
    pub fn nutrient(&self, group_name: &str, nutrient: &str) -> Option<f64> {
        let group = self.get(group_name)?;
        let column = self.nutrient_columns.iter().position(|c| c == nutrient)?;
        self.nutrient_amount(group, column)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey_types::Cell;

    fn catalog_table() -> Table {
        let mut table = Table::new(&["groupe_ffq", "proteines", "fer", "commentaire"]);
        table.push_row(vec![Cell::text("Pomme"), 0.3.into(), 0.1.into(), Cell::text("frais")]);
        table.push_row(vec![Cell::text("Poire"), Cell::text("0,4"), 0.2.into()]);
        table.push_row(vec![Cell::Empty, 1.0.into(), 1.0.into()]);
        table
    }

    #[test]
    fn test_catalog_indexes_groups() {
        let catalog = ReferenceCatalog::from_table(&catalog_table(), &CatalogConfig::default()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names(), &["Pomme".to_string(), "Poire".to_string()]);
        assert!(catalog.contains("Poire"));
        assert_eq!(catalog.nutrient_columns(), &["proteines", "fer", "commentaire"]);
    }

    #[test]
    fn test_non_numeric_nutrients_read_as_none() {
        let catalog = ReferenceCatalog::from_table(&catalog_table(), &CatalogConfig::default()).unwrap();
        assert_eq!(catalog.nutrient("Pomme", "proteines"), Some(0.3));
        assert_eq!(catalog.nutrient("Poire", "proteines"), None);
        assert_eq!(catalog.nutrient("Pomme", "commentaire"), None);
        assert_eq!(catalog.nutrient("Poire", "commentaire"), None);
    }

    #[test]
    fn test_duplicate_group_is_rejected() {
        let mut table = catalog_table();
        table.push_row(vec![Cell::text("Pomme"), 0.5.into(), 0.5.into()]);
        let err = ReferenceCatalog::from_table(&table, &CatalogConfig::default()).unwrap_err();
        assert_eq!(err, NutritionError::DuplicateFoodGroup("Pomme".to_string()));
    }

    #[test]
    fn test_missing_key_column() {
        let table = Table::new(&["nom", "proteines"]);
        let err = ReferenceCatalog::from_table(&table, &CatalogConfig::default()).unwrap_err();
        assert_eq!(err, NutritionError::MissingColumn("groupe_ffq".to_string()));
    }

    #[test]
    fn test_missing_file_is_a_resource_error() {
        let err = ReferenceCatalog::load(Path::new("/nonexistent/nutrition_data.json"), &CatalogConfig::default())
            .unwrap_err();
        assert!(err.is_fatal_for_batch());
    }
}
