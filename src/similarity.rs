//! Text similarity scores used to decide whether two records name the same thing.
//!
//! Both scores live in `0.0..=100.0`. Thresholds are chosen at each call site:
//!
//! | Call site | Measure | Threshold |
//! |---|---|---|
//! | notify.moe search labels | [`token_score`] | 40 |
//! | LiveChart search titles | [`token_score`] | 50 |
//! | voice-actor clustering | [`token_score`] | 80 |
//! | Anime-Planet search titles, country names | [`edit_score`] | 90 |
//!
//! ```rust
//! use anicine::similarity::{edit_score, token_score};
//!
//! assert_eq!(token_score("a-b-c", "a-b-x"), 50.0);
//! assert_eq!(edit_score("cat", "cat"), 100.0);
//! assert_eq!(edit_score("", "x"), 0.0);
//! ```

/// Token separator of normalized titles.
pub const TOKEN_DELIMITER: char = '-';

/// Greedy token-overlap score of two dash-joined strings.
///
/// Every token of `a` counts one match when any token of `b` equals it. Matched
/// tokens of `b` stay available, so this is not a set measure; downstream
/// thresholds are tuned to exactly this behavior. The score is
/// `matches / (len(a) + len(b) - matches) * 100`, capped at 100 for inputs with
/// repeated tokens.
pub fn token_score(a: &str, b: &str) -> f64 {
    let left = tokens(a);
    let right = tokens(b);

    let matches = left
        .iter()
        .filter(|token| right.iter().any(|other| other == *token))
        .count();

    let union = left.len() + right.len() - matches;
    if union == 0 {
        return 0.0;
    }

    (matches as f64 / union as f64 * 100.0).min(100.0)
}

/// Levenshtein-based score: `100 * (max_len - distance) / max_len`.
///
/// Lengths and distance are measured in chars. Either input being empty scores
/// 0, including two empty inputs.
pub fn edit_score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    let distance = strsim::levenshtein(a, b);

    (max_len - distance) as f64 / max_len as f64 * 100.0
}

fn tokens(input: &str) -> Vec<&str> {
    if input.is_empty() {
        return Vec::new();
    }
    input.split(TOKEN_DELIMITER).collect()
}
