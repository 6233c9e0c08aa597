//! Lexical fallback used when the [`pricely_embeddings::EmbeddingClient`] is
//! unavailable (§4.6 "Fallback when embeddings are unavailable").
//!
//! Grounded on the original `comparison_algorithm.py`'s `calculate_similarity`
//! (`difflib.SequenceMatcher(None, a, b).ratio()`), generalized from
//! `SequenceMatcher`'s matching-blocks ratio to an explicit normalized
//! longest-common-subsequence ratio, matching §4.6's wording exactly.

/// Lowercase and strip punctuation, collapsing runs of whitespace — the
/// normalization step before computing [`lcs_ratio`].
fn normalize(input: &str) -> String {
    let stripped: String = input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized longest-common-subsequence ratio: `2 * lcs_len / (len_a +
/// len_b)`. Two empty strings are a perfect match (`1.0`).
fn lcs_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            table[i][j] = if a[i - 1] == b[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }

    let lcs_len = table[a.len()][b.len()];
    #[allow(clippy::cast_precision_loss)]
    let ratio = 2.0 * lcs_len as f64 / (a.len() + b.len()) as f64;
    ratio
}

/// Lexical similarity between two raw listing names: normalize, then score
/// with [`lcs_ratio`].
#[must_use]
pub fn lexical_similarity(a: &str, b: &str) -> f64 {
    lcs_ratio(&normalize(a), &normalize(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert!((lexical_similarity("Aashirvaad Atta", "Aashirvaad Atta") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn normalization_ignores_case_and_punctuation() {
        let score = lexical_similarity("Aashirvaad Atta, 5kg!", "aashirvaad atta 5kg");
        assert!((score - 1.0).abs() < f64::EPSILON, "score was {score}");
    }

    #[test]
    fn unrelated_strings_score_low() {
        let score = lexical_similarity("Aashirvaad Atta 5 kg", "Surf Excel Detergent 1 kg");
        assert!(score < 0.5, "score was {score}");
    }

    #[test]
    fn empty_strings_are_a_perfect_match() {
        assert!((lexical_similarity("", "") - 1.0).abs() < f64::EPSILON);
    }
}
