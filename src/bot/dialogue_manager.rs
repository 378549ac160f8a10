//! Dialogue Manager module for handling dialogue state transitions

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

use crate::localization::{t_args_lang, t_lang};

use crate::hotel_matcher::{HotelMatcher, MatchCandidate, MatchResult, Query};
use crate::sheets::SheetsCatalog;

use crate::dialogue::{
    validate_input, verify_inputs, ClaimDialogue, ClaimDialogueState, FieldMismatch, LeadDraft, VerifiedField,
    QUESTIONS,
};

use super::ui_builder::{
    candidates_keyboard, format_already_surveyed, format_candidates_list, main_menu_keyboard, start_keyboard,
};

/// Send the localized message for a rejected free-text answer
async fn report_invalid_input(bot: &Bot, chat_id: ChatId, reason: &str, language_code: Option<&str>) -> Result<()> {
    let key = match reason {
        "too_long" => "input-too-long",
        _ => "input-empty",
    };
    bot.send_message(chat_id, t_lang(key, language_code)).await?;
    Ok(())
}

/// Show the welcome text and main menu, resetting the conversation
pub async fn show_menu(bot: &Bot, chat_id: ChatId, dialogue: ClaimDialogue, language_code: Option<&str>) -> Result<()> {
    let text = format!(
        "{}\n\n{}\n\n{}",
        t_lang("welcome-title", language_code),
        t_lang("welcome-description", language_code),
        t_lang("menu-prompt", language_code)
    );
    bot.send_message(chat_id, text)
        .reply_markup(main_menu_keyboard(language_code))
        .await?;
    dialogue.update(ClaimDialogueState::Start).await?;
    Ok(())
}

/// Start a new search by asking for the hotel name
pub async fn begin_search(bot: &Bot, chat_id: ChatId, dialogue: ClaimDialogue, language_code: Option<&str>) -> Result<()> {
    bot.send_message(chat_id, t_lang("search-ask-name", language_code)).await?;
    dialogue.update(ClaimDialogueState::WaitingForHotelName).await?;
    Ok(())
}

/// Handle the hotel name typed by the agent
pub async fn handle_name_input(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ClaimDialogue,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match validate_input(text) {
        Ok(hotel_name) => {
            bot.send_message(chat_id, t_lang("search-ask-address", language_code))
                .await?;
            dialogue
                .update(ClaimDialogueState::WaitingForAddress { hotel_name })
                .await?;
        }
        Err(reason) => report_invalid_input(bot, chat_id, reason, language_code).await?,
    }
    Ok(())
}

/// Handle the address, run the match against the catalog and present the outcome
#[allow(clippy::too_many_arguments)]
pub async fn handle_address_input(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ClaimDialogue,
    catalog: Arc<SheetsCatalog>,
    matcher: Arc<HotelMatcher>,
    hotel_name: String,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let address = match validate_input(text) {
        Ok(address) => address,
        Err(reason) => return report_invalid_input(bot, chat_id, reason, language_code).await,
    };
    let query = Query::new(&hotel_name, &address);

    let hotels = match catalog.hotels().await {
        Ok(hotels) => hotels,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Hotel catalog unavailable");
            bot.send_message(chat_id, t_lang("catalog-unavailable", language_code))
                .reply_markup(main_menu_keyboard(language_code))
                .await?;
            dialogue.update(ClaimDialogueState::Start).await?;
            return Ok(());
        }
    };

    let result = matcher.find_matches(&query, &hotels);
    let outcome = match &result {
        MatchResult::Exact(_) => "exact",
        MatchResult::Similar(_) => "similar",
        MatchResult::NoMatch => "no_match",
    };
    info!(user_id = %chat_id, catalog_size = hotels.len(), outcome, "Hotel lookup finished");

    present_match_result(bot, chat_id, dialogue, query, result, language_code).await
}

/// Tell the agent what the lookup found and move to the next state
pub async fn present_match_result(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ClaimDialogue,
    query: Query,
    result: MatchResult,
    language_code: Option<&str>,
) -> Result<()> {
    match result {
        MatchResult::Exact(record) if record.is_surveyed() => {
            bot.send_message(chat_id, format_already_surveyed(&record, language_code))
                .await?;
            dialogue.exit().await?;
        }
        MatchResult::Exact(record) => {
            let text = t_args_lang(
                "exact-not-surveyed",
                &[("name", &record.name), ("address", &record.address)],
                language_code,
            );
            bot.send_message(chat_id, text)
                .reply_markup(start_keyboard(language_code))
                .await?;
            dialogue
                .update(ClaimDialogueState::ReadyToStart {
                    lead: LeadDraft::from_exact(query, record),
                })
                .await?;
        }
        MatchResult::Similar(candidates) => {
            bot.send_message(chat_id, format_candidates_list(&candidates, language_code))
                .reply_markup(candidates_keyboard(&candidates, language_code))
                .await?;
            dialogue
                .update(ClaimDialogueState::ReviewCandidates { query, candidates })
                .await?;
        }
        MatchResult::NoMatch => {
            bot.send_message(chat_id, t_lang("no-match", language_code))
                .reply_markup(start_keyboard(language_code))
                .await?;
            dialogue
                .update(ClaimDialogueState::ReadyToStart {
                    lead: LeadDraft::new(query, None),
                })
                .await?;
        }
    }
    Ok(())
}

/// Handle the agent's choice among similar candidates; `None` means none of them
pub async fn handle_candidate_choice(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ClaimDialogue,
    query: Query,
    chosen: Option<MatchCandidate>,
    language_code: Option<&str>,
) -> Result<()> {
    match chosen {
        Some(candidate) if candidate.record.is_surveyed() => {
            bot.send_message(chat_id, format_already_surveyed(&candidate.record, language_code))
                .await?;
            dialogue.exit().await?;
        }
        Some(candidate) => {
            debug!(user_id = %chat_id, hotel = %candidate.record.name, "Agent picked a candidate");
            bot.send_message(chat_id, t_lang("candidate-not-surveyed", language_code))
                .reply_markup(start_keyboard(language_code))
                .await?;
            dialogue
                .update(ClaimDialogueState::ReadyToStart {
                    lead: LeadDraft::new(query, Some(candidate)),
                })
                .await?;
        }
        None => {
            bot.send_message(chat_id, t_lang("candidates-rejected", language_code))
                .reply_markup(start_keyboard(language_code))
                .await?;
            dialogue
                .update(ClaimDialogueState::ReadyToStart {
                    lead: LeadDraft::new(query, None),
                })
                .await?;
        }
    }
    Ok(())
}

/// Begin the verification step for a lead
pub async fn start_verification(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ClaimDialogue,
    lead: LeadDraft,
    language_code: Option<&str>,
) -> Result<()> {
    bot.send_message(chat_id, t_lang("verify-ask-name", language_code)).await?;
    dialogue.update(ClaimDialogueState::VerifyingName { lead }).await?;
    Ok(())
}

/// Handle the re-entered hotel name
pub async fn handle_verify_name(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ClaimDialogue,
    lead: LeadDraft,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match validate_input(text) {
        Ok(verify_name) => {
            bot.send_message(chat_id, t_lang("verify-ask-address", language_code))
                .await?;
            dialogue
                .update(ClaimDialogueState::VerifyingAddress { lead, verify_name })
                .await?;
        }
        Err(reason) => report_invalid_input(bot, chat_id, reason, language_code).await?,
    }
    Ok(())
}

fn format_mismatches(mismatches: &[FieldMismatch], language_code: Option<&str>) -> String {
    let mut text = t_lang("verify-mismatch-title", language_code);
    for mismatch in mismatches {
        let key = match mismatch.field {
            VerifiedField::Name => "verify-mismatch-name",
            VerifiedField::Address => "verify-mismatch-address",
        };
        text.push_str("\n\n");
        text.push_str(&t_args_lang(
            key,
            &[("expected", &mismatch.expected), ("entered", &mismatch.entered)],
            language_code,
        ));
    }
    text
}

/// Handle the re-entered address and check both fields against the matched record
#[allow(clippy::too_many_arguments)]
pub async fn handle_verify_address(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ClaimDialogue,
    matcher: Arc<HotelMatcher>,
    mut lead: LeadDraft,
    verify_name: String,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let verify_address = match validate_input(text) {
        Ok(address) => address,
        Err(reason) => return report_invalid_input(bot, chat_id, reason, language_code).await,
    };

    let mismatches = verify_inputs(
        lead.matched_record(),
        &verify_name,
        &verify_address,
        matcher.policy().algorithm,
    );
    if !mismatches.is_empty() {
        warn!(user_id = %chat_id, mismatches = mismatches.len(), "Verification mismatch");
        bot.send_message(chat_id, format_mismatches(&mismatches, language_code))
            .await?;
        return start_verification(bot, chat_id, dialogue, lead, language_code).await;
    }

    lead.verified_name = Some(verify_name);
    lead.verified_address = Some(verify_address);

    let (_, first_prompt) = QUESTIONS[0];
    bot.send_message(chat_id, t_lang(first_prompt, language_code)).await?;
    dialogue
        .update(ClaimDialogueState::Questionnaire {
            lead,
            answers: Vec::new(),
        })
        .await?;
    Ok(())
}

/// Record a questionnaire answer; after the last one the lead is written to the sheet
#[allow(clippy::too_many_arguments)]
pub async fn handle_questionnaire_answer(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ClaimDialogue,
    catalog: Arc<SheetsCatalog>,
    lead: LeadDraft,
    mut answers: Vec<String>,
    agent_username: &str,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let answer = match validate_input(text) {
        Ok(answer) => answer,
        Err(reason) => return report_invalid_input(bot, chat_id, reason, language_code).await,
    };
    answers.push(answer);

    if let Some((_, prompt)) = QUESTIONS.get(answers.len()) {
        bot.send_message(chat_id, t_lang(prompt, language_code)).await?;
        dialogue
            .update(ClaimDialogueState::Questionnaire { lead, answers })
            .await?;
        return Ok(());
    }

    let record = lead.to_lead_record(agent_username, &answers);
    match catalog.source().append_lead(&record).await {
        Ok(()) => {
            info!(user_id = %chat_id, hotel = %record.hotel_name, matched = record.matched, "Lead saved");
            bot.send_message(chat_id, t_lang("lead-saved", language_code))
                .reply_markup(main_menu_keyboard(language_code))
                .await?;
            dialogue.exit().await?;
        }
        Err(e) => {
            // state is left untouched so re-sending the last answer retries the write
            error!(user_id = %chat_id, error = %e, "Failed to save lead");
            bot.send_message(chat_id, t_lang("lead-save-failed", language_code))
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mismatches_lists_each_field() {
        let mismatches = vec![
            FieldMismatch {
                field: VerifiedField::Name,
                expected: "Radisson Blu Batumi".to_string(),
                entered: "Radison".to_string(),
            },
            FieldMismatch {
                field: VerifiedField::Address,
                expected: "ბათუმი, ნინოშვილის ქ. 1".to_string(),
                entered: "თბილისი".to_string(),
            },
        ];
        let text = format_mismatches(&mismatches, Some("en"));
        assert!(text.starts_with("Please correct:"));
        assert!(text.contains("Radisson Blu Batumi"));
        assert!(text.contains("Radison"));
        assert!(text.contains("თბილისი"));
    }
}
