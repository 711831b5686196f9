use ffq_nutrition::cohort::{describe, CohortAccumulator};
use ffq_nutrition::survey_types::{NutrientTotals, Sex};

fn totals(values: &[(&str, f64)]) -> NutrientTotals {
    values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn test_single_member_convention() {
    let mut cohort = CohortAccumulator::new();
    cohort.record(Sex::Male, totals(&[("calcium", 950.0), ("fer", 11.0)]));

    let stats = cohort.statistics();
    let group = stats.group(Sex::Male).unwrap();
    assert_eq!(group.survey_count, 1);

    for (nutrient, value) in [("calcium", 950.0), ("fer", 11.0)] {
        let s = group.nutrient(nutrient).unwrap();
        assert_eq!((s.mean, s.median, s.min, s.max), (value, value, value, value));
        assert_eq!(s.count, 1);
        assert!(s.std_dev.is_none());
    }
}

#[test]
fn test_statistics_per_sex_are_not_combined() {
    let mut cohort = CohortAccumulator::new();
    for (sex, fer) in [(Sex::Female, 10.0), (Sex::Female, 12.0), (Sex::Female, 20.0), (Sex::Male, 8.0)] {
        cohort.record(sex, totals(&[("fer", fer)]));
    }

    let stats = cohort.statistics();
    assert_eq!(stats.groups.len(), 2);

    let female = stats.group(Sex::Female).unwrap().nutrient("fer").unwrap();
    assert_eq!(female.count, 3);
    assert_eq!(female.mean, 14.0);
    assert_eq!(female.median, 12.0);
    assert_eq!(female.min, 10.0);
    assert_eq!(female.max, 20.0);
    // sample variance: (16 + 4 + 36) / 2
    assert!((female.std_dev.unwrap() - 28.0_f64.sqrt()).abs() < 1e-9);

    let male = stats.group(Sex::Male).unwrap().nutrient("fer").unwrap();
    assert_eq!(male.mean, 8.0);
}

#[test]
fn test_empty_cohort_has_no_groups() {
    assert!(CohortAccumulator::new().statistics().is_empty());
    assert!(describe(&[]).is_none());
}

#[test]
fn test_even_sample_median_is_midpoint() {
    let stats = describe(&[1.0, 4.0, 2.0, 3.0]).unwrap();
    assert_eq!(stats.median, 2.5);
}
