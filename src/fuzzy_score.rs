//! # Fuzzy Score Module
//!
//! Token-based string similarity on a 0–100 scale, used to match free-text
//! questionnaire descriptions against catalog food-group names.
//!
//! ## Scorers
//!
//! - [`ratio`]: normalised indel similarity, `2 * LCS / (len_a + len_b)`
//! - [`partial_ratio`]: best [`ratio`] of the shorter string against any
//!   equally long window of the longer one
//! - [`token_sort_ratio`] / [`token_set_ratio`]: word-order and word-set
//!   insensitive variants, plus their partial counterparts
//! - [`weighted_ratio`]: the combination actually used for matching
//!
//! Scorers other than [`weighted_ratio`] expect already processed input
//! (see [`full_process`]).

use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.90;
const LONG_PARTIAL_SCALE: f64 = 0.60;
const PARTIAL_LENGTH_RATIO: f64 = 1.5;
const LONG_LENGTH_RATIO: f64 = 8.0;

/// Normalise a string for scoring
///
/// Optionally drops non-ASCII characters, replaces every non-alphanumeric
/// character with a space, lowercases and trims.
///
/// ```rust
/// use ffq_nutrition::fuzzy_score::full_process;
///
/// assert_eq!(full_process("Pain, complet!", true), "pain  complet");
/// assert_eq!(full_process("Pâtes", true), "ptes");
/// assert_eq!(full_process("Pâtes", false), "pâtes");
/// ```
pub fn full_process(text: &str, force_ascii: bool) -> String {
    let mut processed = String::with_capacity(text.len());
    for c in text.chars() {
        if force_ascii && !c.is_ascii() {
            continue;
        }
        if c.is_alphanumeric() {
            processed.extend(c.to_lowercase());
        } else {
            processed.push(' ');
        }
    }
    processed.trim().to_string()
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

fn chars_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

fn chars_partial_ratio(a: &[char], b: &[char]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len() as isize;
    let n = long.len() as isize;
    let mut best: f64 = 0.0;
    // Windows sliding from fully left of `long` to fully right, so partial
    // overlaps at both ends are scored too.
    for start in (1 - m)..n {
        let from = start.max(0) as usize;
        let to = (start + m).min(n) as usize;
        best = best.max(chars_ratio(short, &long[from..to]));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Normalised indel similarity
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    chars_ratio(&a, &b)
}

/// Best alignment of the shorter string inside the longer one
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    chars_partial_ratio(&a, &b)
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

pub fn partial_token_sort_ratio(a: &str, b: &str) -> f64 {
    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

struct TokenSets {
    intersection: String,
    only_a: String,
    only_b: String,
}

impl TokenSets {
    fn split(a: &str, b: &str) -> Option<Self> {
        let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
        let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
        if tokens_a.is_empty() || tokens_b.is_empty() {
            return None;
        }
        let join = |set: Vec<&str>| set.join(" ");
        Some(Self {
            intersection: join(tokens_a.intersection(&tokens_b).copied().collect()),
            only_a: join(tokens_a.difference(&tokens_b).copied().collect()),
            only_b: join(tokens_b.difference(&tokens_a).copied().collect()),
        })
    }

    fn combined(&self, rest: &str) -> String {
        match (self.intersection.is_empty(), rest.is_empty()) {
            (true, _) => rest.to_string(),
            (false, true) => self.intersection.clone(),
            (false, false) => format!("{} {}", self.intersection, rest),
        }
    }
}

/// Similarity of the shared words against each side's full word set
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let Some(sets) = TokenSets::split(a, b) else {
        return 0.0;
    };
    if !sets.intersection.is_empty() && (sets.only_a.is_empty() || sets.only_b.is_empty()) {
        return 100.0;
    }

    let combined_a = sets.combined(&sets.only_a);
    let combined_b = sets.combined(&sets.only_b);
    let mut best = ratio(&combined_a, &combined_b);
    if !sets.intersection.is_empty() {
        best = best
            .max(ratio(&sets.intersection, &combined_a))
            .max(ratio(&sets.intersection, &combined_b));
    }
    best
}

/// Any shared word scores 100; otherwise the partial ratio of the leftovers
pub fn partial_token_set_ratio(a: &str, b: &str) -> f64 {
    let Some(sets) = TokenSets::split(a, b) else {
        return 0.0;
    };
    if !sets.intersection.is_empty() {
        return 100.0;
    }
    partial_ratio(&sets.only_a, &sets.only_b)
}

/// Weighted combination of the scorers above, rounded to an integer 0–100
///
/// Strings of similar length (ratio < 1.5) are compared whole and by tokens;
/// longer/shorter pairs are also compared by partial alignment, scaled down
/// (0.9, or 0.6 when one string is more than 8 times longer).
///
/// ```rust
/// use ffq_nutrition::fuzzy_score::weighted_ratio;
///
/// assert_eq!(weighted_ratio("Pomme", "pomme", true), 100);
/// assert_eq!(weighted_ratio("Banane", "Ananas", true), 67);
/// assert_eq!(weighted_ratio("", "Ananas", true), 0);
/// ```
pub fn weighted_ratio(a: &str, b: &str, force_ascii: bool) -> u8 {
    let a = full_process(a, force_ascii);
    let b = full_process(b, force_ascii);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let length_ratio = len_a.max(len_b) / len_a.min(len_b);
    let base = ratio(&a, &b);

    let best = if length_ratio < PARTIAL_LENGTH_RATIO {
        base.max(token_sort_ratio(&a, &b) * UNBASE_SCALE)
            .max(token_set_ratio(&a, &b) * UNBASE_SCALE)
    } else {
        let partial_scale = if length_ratio > LONG_LENGTH_RATIO {
            LONG_PARTIAL_SCALE
        } else {
            PARTIAL_SCALE
        };
        base.max(partial_ratio(&a, &b) * partial_scale)
            .max(partial_token_sort_ratio(&a, &b) * UNBASE_SCALE * partial_scale)
            .max(partial_token_set_ratio(&a, &b) * UNBASE_SCALE * partial_scale)
    };

    best.round_ties_even().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identity_and_disjoint() {
        assert_eq!(ratio("pomme", "pomme"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_ratio_is_indel_based() {
        // LCS("banane", "ananas") = "anan"
        let score = ratio("banane", "ananas");
        assert!((score - 800.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("pomme", "pommes de terre"), 100.0);
        assert_eq!(partial_ratio("pommes de terre", "pomme"), 100.0);
        assert_eq!(partial_ratio("", "pomme"), 0.0);
    }

    #[test]
    fn test_token_sort_ignores_word_order() {
        assert_eq!(token_sort_ratio("lait entier", "entier lait"), 100.0);
    }

    #[test]
    fn test_token_set_subset_scores_full() {
        assert_eq!(token_set_ratio("viande de porc roti", "viande de porc"), 100.0);
        assert_eq!(partial_token_set_ratio("pain blanc", "pain complet"), 100.0);
        assert_eq!(token_set_ratio("", "pain"), 0.0);
    }

    #[test]
    fn test_weighted_ratio_exact_is_100() {
        assert_eq!(weighted_ratio("Fromage blanc", "Fromage blanc", true), 100);
    }

    #[test]
    fn test_weighted_ratio_uses_partial_for_unequal_lengths() {
        // length ratio 3: partial alignment is 100, scaled by 0.9
        assert_eq!(weighted_ratio("Pomme", "Pommes de terre", true), 90);
    }

    #[test]
    fn test_weighted_ratio_punctuation_insensitive() {
        assert_eq!(
            weighted_ratio("Yaourt nature.", "yaourt nature", true),
            100
        );
    }

    #[test]
    fn test_force_ascii_drops_accents() {
        assert_eq!(full_process("Crème fraîche", true), "crme frache");
        assert_eq!(weighted_ratio("Crème", "Creme", false), 80);
    }
}
