//! Claim dialogue module for handling conversation state with agents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use teloxide::dispatching::dialogue::Dialogue;

use crate::hotel_matcher::{HotelRecord, MatchCandidate, Query};
use crate::match_config::{SimilarityAlgorithm, VERIFY_THRESHOLD};
use crate::normalization::normalize_soft;
use crate::session_store::ExpiringStorage;
use crate::sheets::LeadRecord;
use crate::similarity::similarity;

/// Maximum accepted length of a single free-text answer, in characters
pub const MAX_INPUT_CHARS: usize = 255;

/// Questionnaire: (answer key written to the lead row, prompt message id)
pub const QUESTIONS: &[(&str, &str)] = &[("rooms", "question-rooms"), ("contact", "question-contact")];

/// Represents the conversation state of one agent's chat
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ClaimDialogueState {
    #[default]
    Start,
    WaitingForHotelName,
    WaitingForAddress {
        hotel_name: String,
    },
    ReviewCandidates {
        query: Query,
        candidates: Vec<MatchCandidate>,
    },
    ReadyToStart {
        lead: LeadDraft,
    },
    VerifyingName {
        lead: LeadDraft,
    },
    VerifyingAddress {
        lead: LeadDraft,
        verify_name: String,
    },
    Questionnaire {
        lead: LeadDraft,
        answers: Vec<String>,
    },
}

/// Type alias for our claim dialogue
pub type ClaimDialogue = Dialogue<ClaimDialogueState, ExpiringStorage<ClaimDialogueState>>;

/// Everything collected for a lead before it is written to the sheet
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadDraft {
    pub query: Query,
    /// Catalog record the agent confirmed, with its scores
    pub matched: Option<MatchCandidate>,
    pub verified_name: Option<String>,
    pub verified_address: Option<String>,
}

impl LeadDraft {
    pub fn new(query: Query, matched: Option<MatchCandidate>) -> Self {
        Self {
            query,
            matched,
            verified_name: None,
            verified_address: None,
        }
    }

    /// Draft for an exact catalog hit; both field scores are 1.0
    pub fn from_exact(query: Query, record: HotelRecord) -> Self {
        let matched = MatchCandidate {
            record,
            name_score: 1.0,
            address_score: 1.0,
            combined_score: 1.0,
        };
        Self::new(query, Some(matched))
    }

    pub fn matched_record(&self) -> Option<&HotelRecord> {
        self.matched.as_ref().map(|m| &m.record)
    }

    /// Build the lead row from the draft and questionnaire answers
    ///
    /// Answers are paired with [`QUESTIONS`] in order; extra answers are ignored.
    pub fn to_lead_record(&self, agent_username: &str, answers: &[String]) -> LeadRecord {
        let mut answer_map = BTreeMap::new();
        if let Some(name) = &self.verified_name {
            answer_map.insert("verify_name".to_string(), name.clone());
        }
        if let Some(address) = &self.verified_address {
            answer_map.insert("verify_addr".to_string(), address.clone());
        }
        for ((key, _), answer) in QUESTIONS.iter().zip(answers) {
            answer_map.insert((*key).to_string(), answer.clone());
        }

        let matched_comment = self
            .matched
            .as_ref()
            .map(|m| format!("name_score={:.2}, addr_score={:.2}", m.name_score, m.address_score))
            .unwrap_or_default();

        LeadRecord {
            created_at: LeadRecord::timestamp_now(),
            agent_username: agent_username.to_string(),
            hotel_name: self.query.name.clone(),
            address: self.query.address.clone(),
            matched: self.matched.is_some(),
            decision: "new_lead".to_string(),
            matched_comment,
            answers: answer_map,
        }
    }
}

/// Validates a free-text answer
pub fn validate_input(text: &str) -> Result<String, &'static str> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > MAX_INPUT_CHARS {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

/// Which field failed re-entry verification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifiedField {
    Name,
    Address,
}

/// A re-entered value that differs from the matched catalog record
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMismatch {
    pub field: VerifiedField,
    pub expected: String,
    pub entered: String,
}

/// Compare re-entered name and address against the matched record
///
/// Without a matched record there is nothing to verify against and the
/// inputs are accepted.
pub fn verify_inputs(
    matched: Option<&HotelRecord>,
    name: &str,
    address: &str,
    algorithm: SimilarityAlgorithm,
) -> Vec<FieldMismatch> {
    let Some(record) = matched else {
        return Vec::new();
    };

    let checks = [
        (VerifiedField::Name, &record.name, name),
        (VerifiedField::Address, &record.address, address),
    ];
    checks
        .into_iter()
        .filter(|(_, expected, entered)| {
            similarity(&normalize_soft(expected), &normalize_soft(entered), algorithm) < VERIFY_THRESHOLD
        })
        .map(|(field, expected, entered)| FieldMismatch {
            field,
            expected: expected.clone(),
            entered: entered.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_validation() {
        assert!(validate_input("Radisson Blu Batumi").is_ok());
        assert!(validate_input("  ბათუმი  ").is_ok());

        assert_eq!(validate_input(""), Err("empty"));
        assert_eq!(validate_input("   "), Err("empty"));
        assert_eq!(validate_input(&"a".repeat(256)), Err("too_long"));
    }

    #[test]
    fn test_input_length_counts_characters() {
        // 255 Georgian letters are 765 bytes but still within the limit
        assert!(validate_input(&"ა".repeat(255)).is_ok());
    }

    #[test]
    fn test_input_trimming() {
        assert_eq!(validate_input("  Hotel Iveria  ").unwrap(), "Hotel Iveria");
    }
}
