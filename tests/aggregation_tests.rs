use ffq_nutrition::aggregation::AggregationEngine;
use ffq_nutrition::food_matcher::FoodMatcher;
use ffq_nutrition::frequency_resolver::{FrequencyMapping, FrequencyResolver};
use ffq_nutrition::nutrition_config::{CatalogConfig, SurveyLayout};
use ffq_nutrition::reference_catalog::ReferenceCatalog;
use ffq_nutrition::survey_types::{Cell, Table};

fn catalog() -> ReferenceCatalog {
    let mut table = Table::new(&["groupe_ffq", "proteines", "glucides", "weekly_grams"]);
    table.push_row(vec![Cell::text("Pomme"), 0.3.into(), 11.6.into(), 999.0.into()]);
    table.push_row(vec![Cell::text("Pain complet"), 9.0.into(), Cell::text("-"), 999.0.into()]);
    ReferenceCatalog::from_table(&table, &CatalogConfig::default()).unwrap()
}

fn survey_table() -> Table {
    let mut table = Table::new(&["ALIMENT", "PETITE", "MOYENNE", "GROSSE", "1 SEMAINE", "TOUS"]);
    // weekly, medium portion
    table.push_row(vec![
        Cell::text("Pomme"),
        100.0.into(),
        150.0.into(),
        200.0.into(),
        2.0.into(),
        Cell::Empty,
    ]);
    // daily, large portion
    table.push_row(vec![
        Cell::text("Pomme"),
        100.0.into(),
        150.0.into(),
        200.0.into(),
        Cell::Empty,
        3.0.into(),
    ]);
    table
}

#[test]
fn test_duplicate_rows_merge_before_matching() {
    let mapping = FrequencyMapping::questionnaire_v1();
    let layout = SurveyLayout::default();
    let lines = FrequencyResolver::new(&mapping, &layout)
        .resolve_table(&survey_table())
        .unwrap();
    assert_eq!(lines.len(), 2);

    let catalog = catalog();
    let matcher = FoodMatcher::default();
    let outcome = AggregationEngine::new(&catalog, &matcher).aggregate(&lines);

    assert_eq!(outcome.lines.len(), 1);
    assert_eq!(outcome.lines[0].weekly_grams, 1550.0);
    assert_eq!(outcome.matches.total(), 1);
    assert_eq!(outcome.matches.matched(), 1);

    let proteines = outcome.totals.get("proteines").unwrap();
    assert!((proteines - 1550.0 / 100.0 * 0.3).abs() < 1e-9);
    let glucides = outcome.totals.get("glucides").unwrap();
    assert!((glucides - 1550.0 / 100.0 * 11.6).abs() < 1e-9);
}

#[test]
fn test_structural_columns_are_not_summed() {
    let catalog = catalog();
    assert!(!catalog.nutrient_columns().iter().any(|c| c == "weekly_grams"));

    let mapping = FrequencyMapping::questionnaire_v1();
    let layout = SurveyLayout::default();
    let lines = FrequencyResolver::new(&mapping, &layout)
        .resolve_table(&survey_table())
        .unwrap();
    let matcher = FoodMatcher::default();
    let outcome = AggregationEngine::new(&catalog, &matcher).aggregate(&lines);
    assert!(!outcome.totals.contains("weekly_grams"));
    assert_eq!(outcome.totals.len(), 2);
}

#[test]
fn test_non_numeric_nutrient_cell_contributes_zero() {
    let mapping = FrequencyMapping::questionnaire_v1();
    let layout = SurveyLayout::default();
    let resolver = FrequencyResolver::new(&mapping, &layout);

    let mut table = Table::new(&["ALIMENT", "MOYENNE", "TOUS"]);
    table.push_row(vec![Cell::text("Pain complet"), 50.0.into(), 2.0.into()]);
    table.push_row(vec![Cell::text("Gâteau au chocolat"), 80.0.into(), 2.0.into()]);
    let lines = resolver.resolve_table(&table).unwrap();

    let catalog = catalog();
    let matcher = FoodMatcher::default();
    let outcome = AggregationEngine::new(&catalog, &matcher).aggregate(&lines);

    assert_eq!(outcome.matched_lines().count(), 1);
    assert!((outcome.totals.get("proteines").unwrap() - 350.0 / 100.0 * 9.0).abs() < 1e-9);
    assert_eq!(outcome.totals.get("glucides"), Some(0.0));
}
