use ffq_nutrition::food_matcher::FoodMatcher;
use ffq_nutrition::fuzzy_score::weighted_ratio;
use ffq_nutrition::nutrition_config::MatcherConfig;

fn catalog() -> Vec<String> {
    [
        "Pain blanc",
        "Pain complet",
        "Lait demi-écrémé",
        "Yaourt nature",
        "Viande de porc : rôti, émincés, côte, filet mignon",
        "Pommes de terre",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[test]
fn test_exact_members_match_themselves() {
    let matcher = FoodMatcher::default();
    for name in catalog() {
        let result = matcher.match_item(&name, &catalog()).unwrap();
        assert_eq!(result.food_group, name);
        assert_eq!(result.score, 100);
    }
}

#[test]
fn test_punctuation_and_case_variants_match() {
    let matcher = FoodMatcher::default();
    let result = matcher.match_item("YAOURT NATURE.", &catalog()).unwrap();
    assert_eq!(result.food_group, "Yaourt nature");
    assert_eq!(result.score, 100);
}

#[test]
fn test_close_but_below_threshold_is_dropped() {
    let matcher = FoodMatcher::default();
    let candidates = vec!["Ananas".to_string()];

    // best candidate exists, but scores 67
    assert!(matcher.best_match("Banane", &candidates).is_some());
    assert!(matcher.match_item("Banane", &candidates).is_none());
}

#[test]
fn test_default_pork_override_is_applied() {
    let matcher = FoodMatcher::default();
    let survey_text = "Viande de porc (hors charcuterie): rôti, émincés, côte, filet mignon";

    let result = matcher.match_item(survey_text, &catalog()).unwrap();
    assert!(result.overridden);
    assert_eq!(result.food_group, "Viande de porc : rôti, émincés, côte, filet mignon");
}

#[test]
fn test_threshold_is_configurable() {
    let config = MatcherConfig {
        min_score: 60,
        ..MatcherConfig::default()
    };
    let matcher = FoodMatcher::new(&config);
    let candidates = vec!["Ananas".to_string()];

    assert_eq!(matcher.min_score(), 60);
    let result = matcher.match_item("Banane", &candidates).unwrap();
    assert_eq!(result.score, weighted_ratio("Banane", "Ananas", true));
}

#[test]
fn test_match_rate_counts_only_matched_items() {
    let matcher = FoodMatcher::default();
    let items = vec![
        "Pain complet".to_string(),
        "Chocolat".to_string(),
        "Lait demi-écrémé".to_string(),
        "Soda".to_string(),
    ];
    let summary = matcher.match_all(&items, &catalog());
    assert_eq!(summary.matched(), 2);
    assert_eq!(summary.total(), 4);
    assert_eq!(summary.match_rate(), 50.0);
}
