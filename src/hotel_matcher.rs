//! # Hotel Matching Module
//!
//! Decides whether a hotel named by an agent already exists in the catalog of
//! surveyed hotels.
//!
//! ## Algorithm
//!
//! 1. **Exact pass**: strict-normalized name and address-normalized address must
//!    both equal the query's; the first such record wins and scoring is skipped.
//! 2. **Scored pass**: soft-normalized fields are scored independently and
//!    combined with the policy weights.
//! 3. **Candidacy**: combined floor OR a single very strong field.
//! 4. **Ranking**: `(combined, name, address)` descending, capped.
//!
//! The matcher holds no state and performs no I/O.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::match_config::MatchPolicy;
use crate::normalization::{normalize_address, normalize_soft, normalize_strict};
use crate::similarity::similarity;

/// Status values that mark a hotel as already surveyed
const SURVEYED_STATUSES: &[&str] = &["done", "surveyed", "completed", "აღებულია", "გაკეთებულია"];

/// One row of the surveyed-hotels catalog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HotelRecord {
    /// Registered hotel name, usually Latin script
    pub name: String,
    /// Registered address, usually Georgian script
    pub address: String,
    /// Survey status; see [`HotelRecord::is_surveyed`]
    pub status: String,
    /// Free-text annotation shown back to the agent
    pub comment: String,
}

impl HotelRecord {
    pub fn new(name: &str, address: &str, status: &str, comment: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            status: status.to_string(),
            comment: comment.to_string(),
        }
    }

    /// Whether the status column marks this hotel as already processed
    pub fn is_surveyed(&self) -> bool {
        let status = self.status.trim().to_lowercase();
        SURVEYED_STATUSES.contains(&status.as_str())
    }
}

/// One matching attempt: what the agent typed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    pub name: String,
    pub address: String,
}

impl Query {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
        }
    }
}

/// A non-exact record that cleared the candidacy filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub record: HotelRecord,
    pub name_score: f64,
    pub address_score: f64,
    pub combined_score: f64,
}

/// Outcome of one matching attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchResult {
    /// Normalized name and address equal the query
    Exact(HotelRecord),
    /// Ranked candidates, best first, never more than the policy cap
    Similar(Vec<MatchCandidate>),
    /// Nothing cleared the similarity floor
    NoMatch,
}

/// Stateless hotel matcher parameterized by a [`MatchPolicy`]
#[derive(Debug, Clone, Default)]
pub struct HotelMatcher {
    policy: MatchPolicy,
}

impl HotelMatcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Classify a query against a candidate snapshot
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hotel_claim_bot::hotel_matcher::{HotelMatcher, HotelRecord, MatchResult, Query};
    ///
    /// let matcher = HotelMatcher::default();
    /// let hotels = vec![HotelRecord::new("Hotel Iveria", "თბილისი, რუსთაველის გამზ. 5", "done", "")];
    ///
    /// let result = matcher.find_matches(&Query::new("hotel iveria", "თბილისი რუსთაველის გამზირი 5"), &hotels);
    /// assert!(matches!(result, MatchResult::Exact(_)));
    ///
    /// assert_eq!(matcher.find_matches(&Query::new("XYZ Hotel", "some street"), &[]), MatchResult::NoMatch);
    /// ```
    pub fn find_matches(&self, query: &Query, candidates: &[HotelRecord]) -> MatchResult {
        if let Some(record) = self.find_exact(query, candidates) {
            debug!(hotel = %record.name, "Exact hotel match found");
            return MatchResult::Exact(record.clone());
        }

        let ranked = self.rank_candidates(query, candidates);
        debug!(
            candidates_scanned = candidates.len(),
            similar_found = ranked.len(),
            "Scored hotel matching completed"
        );

        if ranked.is_empty() {
            MatchResult::NoMatch
        } else {
            MatchResult::Similar(ranked)
        }
    }

    /// First record whose strict name and normalized address equal the query's
    ///
    /// A query whose name normalizes to nothing never matches exactly, so a
    /// blank name cannot "equal" a sheet row with a blank name cell.
    pub fn find_exact<'a>(&self, query: &Query, candidates: &'a [HotelRecord]) -> Option<&'a HotelRecord> {
        let name = normalize_strict(&query.name);
        if name.is_empty() {
            return None;
        }
        let address = normalize_address(&query.address);

        candidates.iter().find(|record| {
            normalize_strict(&record.name) == name && normalize_address(&record.address) == address
        })
    }

    /// Score one record against the query using soft normalization
    pub fn score(&self, query: &Query, record: &HotelRecord) -> MatchCandidate {
        let algorithm = self.policy.algorithm;
        let name_score = similarity(&normalize_soft(&query.name), &normalize_soft(&record.name), algorithm);
        let address_score = similarity(
            &normalize_soft(&query.address),
            &normalize_soft(&record.address),
            algorithm,
        );

        MatchCandidate {
            record: record.clone(),
            name_score,
            address_score,
            combined_score: self.policy.combined_score(name_score, address_score),
        }
    }

    /// Qualifying candidates, ranked best first and capped
    pub fn rank_candidates(&self, query: &Query, candidates: &[HotelRecord]) -> Vec<MatchCandidate> {
        let mut qualifying: Vec<MatchCandidate> = candidates
            .iter()
            .map(|record| self.score(query, record))
            .filter(|c| self.policy.qualifies(c.name_score, c.address_score, c.combined_score))
            .collect();

        qualifying.sort_by(compare_candidates);
        qualifying.truncate(self.policy.max_candidates);
        qualifying
    }
}

/// Ranking order: scores descending, then record text ascending so that full
/// ties never depend on the order rows arrived from the sheet
fn compare_candidates(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.combined_score
        .total_cmp(&a.combined_score)
        .then_with(|| b.name_score.total_cmp(&a.name_score))
        .then_with(|| b.address_score.total_cmp(&a.address_score))
        .then_with(|| a.record.name.cmp(&b.record.name))
        .then_with(|| a.record.address.cmp(&b.record.address))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, address: &str) -> HotelRecord {
        HotelRecord::new(name, address, "", "")
    }

    #[test]
    fn test_is_surveyed_vocabulary() {
        assert!(HotelRecord::new("a", "b", "Done", "").is_surveyed());
        assert!(HotelRecord::new("a", "b", " surveyed ", "").is_surveyed());
        assert!(HotelRecord::new("a", "b", "COMPLETED", "").is_surveyed());
        assert!(HotelRecord::new("a", "b", "აღებულია", "").is_surveyed());
        assert!(HotelRecord::new("a", "b", "გაკეთებულია", "").is_surveyed());
        assert!(!HotelRecord::new("a", "b", "", "").is_surveyed());
        assert!(!HotelRecord::new("a", "b", "in progress", "").is_surveyed());
    }

    #[test]
    fn test_exact_ignores_punctuation_and_case() {
        let matcher = HotelMatcher::default();
        let hotels = vec![record("Hotel \"Tbilisi\"", "თბილისი, ჭავჭავაძის ქ. 10")];
        let query = Query::new("hotel tbilisi", "თბილისი ჭავჭავაძის ქუჩა 10");
        assert_eq!(matcher.find_matches(&query, &hotels), MatchResult::Exact(hotels[0].clone()));
    }

    #[test]
    fn test_first_exact_match_wins() {
        let matcher = HotelMatcher::default();
        let mut first = record("Rooms Hotel", "ყაზბეგი");
        first.comment = "first".to_string();
        let mut second = record("Rooms  Hotel", "ყაზბეგი");
        second.comment = "second".to_string();
        let hotels = vec![first.clone(), second];
        assert_eq!(
            matcher.find_matches(&Query::new("rooms hotel", "ყაზბეგი"), &hotels),
            MatchResult::Exact(first)
        );
    }

    #[test]
    fn test_blank_query_never_matches_blank_row() {
        let matcher = HotelMatcher::default();
        let hotels = vec![record("", ""), record("Some Hotel", "")];
        assert_eq!(matcher.find_matches(&Query::new("", ""), &hotels), MatchResult::NoMatch);
        assert_eq!(matcher.find_matches(&Query::new("!!", "..."), &hotels), MatchResult::NoMatch);
    }

    #[test]
    fn test_empty_address_on_both_sides_adds_nothing() {
        let matcher = HotelMatcher::default();
        let candidate = matcher.score(&Query::new("Sheraton", ""), &record("Sheraton", ""));
        assert_eq!(candidate.name_score, 1.0);
        assert_eq!(candidate.address_score, 0.0);
        assert_eq!(candidate.combined_score, 0.6);
    }

    #[test]
    fn test_soft_pass_keeps_punctuation() {
        let matcher = HotelMatcher::default();
        let candidate = matcher.score(&Query::new("Hotel, Mercure", "x"), &record("hotel mercure", "x"));
        assert!(candidate.name_score < 1.0);
        assert!(candidate.name_score > 0.9);
    }

    #[test]
    fn test_full_ties_ordered_by_record_text() {
        let matcher = HotelMatcher::default();
        let query = Query::new("Hotel Alpha", "ქუთაისი");
        let zulu = record("Hotel Alphz", "ქუთაისი");
        let bravo = record("Hotel Alphb", "ქუთაისი");

        let forward = matcher.rank_candidates(&query, &[zulu.clone(), bravo.clone()]);
        let backward = matcher.rank_candidates(&query, &[bravo.clone(), zulu.clone()]);

        assert_eq!(forward, backward);
        assert_eq!(forward[0].record, bravo);
        assert_eq!(forward[1].record, zulu);
    }

    #[test]
    fn test_custom_policy_cap() {
        let policy = MatchPolicy { max_candidates: 2, ..Default::default() };
        let matcher = HotelMatcher::new(policy);
        let hotels: Vec<HotelRecord> = (0..4).map(|i| record(&format!("Hotel Batumi {i}"), "ბათუმი")).collect();
        match matcher.find_matches(&Query::new("Hotel Batumi", "ბათუმი"), &hotels) {
            MatchResult::Similar(candidates) => assert_eq!(candidates.len(), 2),
            other => panic!("Unexpected match result: {other:?}"),
        }
    }
}
