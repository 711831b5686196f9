//! # Cohort Statistics Module
//!
//! Collects per-survey nutrient totals partitioned by respondent sex and
//! summarises them per nutrient (mean, median, sample standard deviation,
//! min, max, count).
//!
//! The accumulator is an explicit value: the batch driver owns it and appends
//! each completed survey under a single lock.
//!
//! Conventions:
//! - the standard deviation is `None` when a nutrient has a single sample
//! - a nutrient missing from some surveys is summarised over the surveys
//!   that carry it, and `count` says how many that was
//! - sex groups without members are not reported

use log::debug;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;

use crate::survey_types::{NutrientTotals, Sex};

/// Growing collection of nutrient totals keyed by sex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortAccumulator {
    members: BTreeMap<Sex, Vec<NutrientTotals>>,
}

impl CohortAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one survey's totals to its sex group
    pub fn record(&mut self, sex: Sex, totals: NutrientTotals) {
        let group = self.members.entry(sex).or_default();
        group.push(totals);
        debug!("Cohort {} now holds {} surveys", sex, group.len());
    }

    /// Totals recorded for one sex, in recording order
    pub fn members(&self, sex: Sex) -> &[NutrientTotals] {
        self.members.get(&sex).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of surveys recorded across both sexes
    pub fn len(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptive statistics per sex group
    pub fn statistics(&self) -> CohortStatistics {
        let groups = self
            .members
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(&sex, members)| SexGroupStatistics::from_members(sex, members))
            .collect();
        CohortStatistics { groups }
    }
}

/// Summary of one nutrient over one sex group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientStatistics {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1); `None` for a single sample
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Summarise a non-empty sample
///
/// ```rust
/// use ffq_nutrition::cohort::describe;
///
/// let stats = describe(&[2.0, 4.0, 9.0]).unwrap();
/// assert_eq!(stats.mean, 5.0);
/// assert_eq!(stats.median, 4.0);
/// assert_eq!(stats.count, 3);
/// assert!(describe(&[]).is_none());
/// ```
pub fn describe(values: &[f64]) -> Option<NutrientStatistics> {
    if values.is_empty() {
        return None;
    }
    let std_dev = if values.len() > 1 {
        Some(Statistics::std_dev(values.iter()))
    } else {
        None
    };
    Some(NutrientStatistics {
        mean: Statistics::mean(values.iter()),
        median: Data::new(values.to_vec()).median(),
        std_dev,
        min: Statistics::min(values.iter()),
        max: Statistics::max(values.iter()),
        count: values.len(),
    })
}

/// Per-nutrient statistics of one sex group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SexGroupStatistics {
    pub sex: Sex,
    pub survey_count: usize,
    pub nutrients: BTreeMap<String, NutrientStatistics>,
}

impl SexGroupStatistics {
    fn from_members(sex: Sex, members: &[NutrientTotals]) -> Self {
        let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for totals in members {
            for (nutrient, value) in totals.iter() {
                if value.is_finite() {
                    samples.entry(nutrient).or_default().push(value);
                }
            }
        }

        let nutrients = samples
            .into_iter()
            .filter_map(|(nutrient, values)| {
                describe(&values).map(|stats| (nutrient.to_string(), stats))
            })
            .collect();

        Self {
            sex,
            survey_count: members.len(),
            nutrients,
        }
    }

    pub fn nutrient(&self, name: &str) -> Option<&NutrientStatistics> {
        self.nutrients.get(name)
    }
}

/// Statistics for every non-empty sex group, in `M`, `F` order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CohortStatistics {
    pub groups: Vec<SexGroupStatistics>,
}

impl CohortStatistics {
    pub fn group(&self, sex: Sex) -> Option<&SexGroupStatistics> {
        self.groups.iter().find(|g| g.sex == sex)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
