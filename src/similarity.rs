//! # Similarity Scoring Module
//!
//! Scores two already-normalized strings on a 0.0–1.0 scale.
//!
//! Empty input is scored `0.0`, including empty against empty. Sparse sheet
//! rows with a blank address must never look like a perfect match for a
//! blank query field.

use crate::match_config::SimilarityAlgorithm;

/// Similarity of two normalized strings using the given algorithm
///
/// Symmetric, `1.0` for identical non-empty input, `0.0` if either side is empty.
///
/// # Examples
///
/// ```rust
/// use hotel_claim_bot::match_config::SimilarityAlgorithm;
/// use hotel_claim_bot::similarity::similarity;
///
/// assert_eq!(similarity("batumi", "batumi", SimilarityAlgorithm::Levenshtein), 1.0);
/// assert_eq!(similarity("", "", SimilarityAlgorithm::Levenshtein), 0.0);
/// ```
pub fn similarity(a: &str, b: &str, algorithm: SimilarityAlgorithm) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let score = match algorithm {
        SimilarityAlgorithm::Levenshtein => strsim::normalized_levenshtein(a, b),
        SimilarityAlgorithm::JaroWinkler => strsim::jaro_winkler(a, b),
        SimilarityAlgorithm::SorensenDice => strsim::sorensen_dice(a, b),
    };
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALGORITHMS: [SimilarityAlgorithm; 3] = [
        SimilarityAlgorithm::Levenshtein,
        SimilarityAlgorithm::JaroWinkler,
        SimilarityAlgorithm::SorensenDice,
    ];

    #[test]
    fn test_empty_strings_score_zero() {
        for algorithm in ALGORITHMS {
            assert_eq!(similarity("", "", algorithm), 0.0);
            assert_eq!(similarity("hotel", "", algorithm), 0.0);
            assert_eq!(similarity("", "hotel", algorithm), 0.0);
        }
    }

    #[test]
    fn test_self_similarity() {
        for algorithm in ALGORITHMS {
            assert_eq!(similarity("radisson blu batumi", "radisson blu batumi", algorithm), 1.0);
            assert_eq!(similarity("ბათუმი", "ბათუმი", algorithm), 1.0);
            assert_eq!(similarity("x", "x", algorithm), 1.0);
        }
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("radisson blu", "radison blue"),
            ("ბათუმი, ხიმშიაშვილის ქ. 1", "ბათუმი, ხიმშიაშვილის ქუჩა 1"),
            ("hotel", "motel"),
            ("a", "abcdef"),
        ];
        for algorithm in ALGORITHMS {
            for (a, b) in pairs {
                assert_eq!(similarity(a, b, algorithm), similarity(b, a, algorithm));
            }
        }
    }

    #[test]
    fn test_levenshtein_degrades_with_edits() {
        let algorithm = SimilarityAlgorithm::Levenshtein;
        let one_edit = similarity("sheraton", "sheratom", algorithm);
        let two_edits = similarity("sheraton", "sheratxm", algorithm);
        let three_edits = similarity("sheraton", "sherxtxm", algorithm);
        assert!(one_edit > two_edits);
        assert!(two_edits > three_edits);
        assert_eq!(one_edit, 1.0 - 1.0 / 8.0);
    }

    #[test]
    fn test_georgian_is_scored_per_character() {
        // One substituted letter out of six
        let score = similarity("ბათუმი", "ბათუმა", SimilarityAlgorithm::Levenshtein);
        assert!((score - 5.0 / 6.0).abs() < 1e-9);
    }
}
