//! # Matching Configuration Module
//!
//! Policy knobs for the hotel matcher and recovery settings for the
//! spreadsheet adapter. Every number here is tunable; the defaults are the
//! values the bot ships with.

use std::str::FromStr;

// Constants for the default matching policy
pub const DEFAULT_NAME_WEIGHT: f64 = 0.6;
pub const DEFAULT_ADDRESS_WEIGHT: f64 = 0.4;
pub const DEFAULT_COMBINED_THRESHOLD: f64 = 0.70;
pub const DEFAULT_FIELD_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MAX_CANDIDATES: usize = 5;
/// Minimum soft similarity when an agent re-enters a matched hotel's details
pub const VERIFY_THRESHOLD: f64 = 0.90;

/// Sequence similarity algorithm used by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityAlgorithm {
    /// Normalized Levenshtein distance over characters
    #[default]
    Levenshtein,
    /// Jaro-Winkler similarity
    JaroWinkler,
    /// Sørensen-Dice coefficient over character bigrams
    SorensenDice,
}

impl FromStr for SimilarityAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "levenshtein" => Ok(Self::Levenshtein),
            "jarowinkler" => Ok(Self::JaroWinkler),
            "sorensendice" | "dice" => Ok(Self::SorensenDice),
            other => Err(format!("unknown similarity algorithm: {other}")),
        }
    }
}

/// Matching policy for the scored pass
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPolicy {
    /// Weight of the name score in the combined score
    pub name_weight: f64,
    /// Weight of the address score in the combined score
    pub address_weight: f64,
    /// A candidate qualifies when its combined score reaches this floor
    pub combined_threshold: f64,
    /// ...or when either single field reaches this floor
    pub field_threshold: f64,
    /// Cap on the number of similar candidates returned
    pub max_candidates: usize,
    /// Scorer algorithm
    pub algorithm: SimilarityAlgorithm,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            name_weight: DEFAULT_NAME_WEIGHT,
            address_weight: DEFAULT_ADDRESS_WEIGHT,
            combined_threshold: DEFAULT_COMBINED_THRESHOLD,
            field_threshold: DEFAULT_FIELD_THRESHOLD,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            algorithm: SimilarityAlgorithm::default(),
        }
    }
}

impl MatchPolicy {
    /// Weighted combination of the two field scores, rounded to 4 decimals
    ///
    /// Rounding keeps threshold checks stable against float noise, so that
    /// e.g. `0.5 * 0.6 + 1.0 * 0.4` compares as exactly `0.70`.
    pub fn combined_score(&self, name_score: f64, address_score: f64) -> f64 {
        let raw = name_score * self.name_weight + address_score * self.address_weight;
        (raw * 10_000.0).round() / 10_000.0
    }

    /// Candidacy filter: combined floor OR either single-field floor
    pub fn qualifies(&self, name_score: f64, address_score: f64, combined_score: f64) -> bool {
        combined_score >= self.combined_threshold
            || name_score >= self.field_threshold
            || address_score >= self.field_threshold
    }

    /// Check that weights and thresholds are usable
    pub fn validate(&self) -> Result<(), String> {
        if self.name_weight < 0.0 || self.address_weight < 0.0 {
            return Err("match weights must not be negative".to_string());
        }
        if self.name_weight + self.address_weight <= 0.0 {
            return Err("match weights must not both be zero".to_string());
        }
        for (label, value) in [
            ("combined threshold", self.combined_threshold),
            ("field threshold", self.field_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{label} must be within 0.0..=1.0, got {value}"));
            }
        }
        if self.max_candidates == 0 {
            return Err("max candidates must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Recovery configuration for spreadsheet calls
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single HTTP request in seconds
    pub request_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 500,
            max_retry_delay_ms: 5000, // 5 seconds
            request_timeout_secs: 20,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

impl RecoveryConfig {
    /// Exponential backoff delay for a retry attempt (1-based), without jitter
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_retry_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_values() {
        let policy = MatchPolicy::default();
        assert_eq!(policy.name_weight, 0.6);
        assert_eq!(policy.address_weight, 0.4);
        assert_eq!(policy.combined_threshold, 0.70);
        assert_eq!(policy.field_threshold, 0.85);
        assert_eq!(policy.max_candidates, 5);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_combined_score_rounding() {
        let policy = MatchPolicy::default();
        assert_eq!(policy.combined_score(0.5, 1.0), 0.7);
        assert_eq!(policy.combined_score(0.9, 0.1), 0.58);
        assert_eq!(policy.combined_score(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_or_threshold() {
        let policy = MatchPolicy::default();
        assert!(policy.qualifies(0.90, 0.10, policy.combined_score(0.90, 0.10)));
        assert!(policy.qualifies(0.10, 0.86, policy.combined_score(0.10, 0.86)));
        assert!(!policy.qualifies(0.50, 0.50, policy.combined_score(0.50, 0.50)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let policy = MatchPolicy { name_weight: -0.1, ..Default::default() };
        assert!(policy.validate().is_err());
        let policy = MatchPolicy { combined_threshold: 1.5, ..Default::default() };
        assert!(policy.validate().is_err());
        let policy = MatchPolicy { max_candidates: 0, ..Default::default() };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("levenshtein".parse::<SimilarityAlgorithm>(), Ok(SimilarityAlgorithm::Levenshtein));
        assert_eq!("Jaro-Winkler".parse::<SimilarityAlgorithm>(), Ok(SimilarityAlgorithm::JaroWinkler));
        assert_eq!("sorensen_dice".parse::<SimilarityAlgorithm>(), Ok(SimilarityAlgorithm::SorensenDice));
        assert!("soundex".parse::<SimilarityAlgorithm>().is_err());
    }

    #[test]
    fn test_backoff_is_capped() {
        let recovery = RecoveryConfig::default();
        assert_eq!(recovery.backoff_delay_ms(1), 500);
        assert_eq!(recovery.backoff_delay_ms(2), 1000);
        assert_eq!(recovery.backoff_delay_ms(3), 2000);
        assert_eq!(recovery.backoff_delay_ms(10), 5000);
    }
}
