//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::User;
use tracing::debug;

use crate::localization::t_lang;

use crate::hotel_matcher::HotelMatcher;
use crate::sheets::SheetsCatalog;

use crate::dialogue::{ClaimDialogue, ClaimDialogueState};

use super::dialogue_manager::{
    begin_search, handle_address_input, handle_name_input, handle_questionnaire_answer, handle_verify_address,
    handle_verify_name, show_menu,
};

/// Commands understood in any state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Menu,
    Cancel,
    Search,
}

/// Parse a slash command, ignoring a `@botname` suffix and trailing arguments
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let word = text.trim().split_whitespace().next()?;
    let command = word.strip_prefix('/')?;
    let command = command.split('@').next().unwrap_or(command);
    match command.to_lowercase().as_str() {
        "start" => Some(BotCommand::Start),
        "menu" => Some(BotCommand::Menu),
        "cancel" => Some(BotCommand::Cancel),
        "search" => Some(BotCommand::Search),
        _ => None,
    }
}

/// Name written to the lead row for the agent: the Telegram username, or the numeric id
pub fn agent_username(user: Option<&User>) -> String {
    match user {
        Some(user) => user
            .username
            .clone()
            .unwrap_or_else(|| format!("id:{}", user.id.0)),
        None => "unknown".to_string(),
    }
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: ClaimDialogue,
    catalog: Arc<SheetsCatalog>,
    matcher: Arc<HotelMatcher>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let language_code = msg.from.as_ref().and_then(|user| user.language_code.clone());
    let language_code = language_code.as_deref();

    let Some(text) = msg.text() else {
        debug!(user_id = %chat_id, "Ignoring non-text message");
        bot.send_message(chat_id, t_lang("unsupported-message", language_code))
            .await?;
        return Ok(());
    };

    if let Some(command) = parse_command(text) {
        debug!(user_id = %chat_id, command = ?command, "Received command");
        return match command {
            BotCommand::Start | BotCommand::Menu => show_menu(&bot, chat_id, dialogue, language_code).await,
            BotCommand::Cancel => {
                bot.send_message(chat_id, t_lang("cancelled", language_code)).await?;
                show_menu(&bot, chat_id, dialogue, language_code).await
            }
            BotCommand::Search => begin_search(&bot, chat_id, dialogue, language_code).await,
        };
    }

    let state = dialogue.get().await?.unwrap_or_default();
    debug!(user_id = %chat_id, dialogue_state = ?state, "Handling text message");

    match state {
        ClaimDialogueState::Start => show_menu(&bot, chat_id, dialogue, language_code).await,
        ClaimDialogueState::WaitingForHotelName => {
            handle_name_input(&bot, chat_id, dialogue, text, language_code).await
        }
        ClaimDialogueState::WaitingForAddress { hotel_name } => {
            handle_address_input(&bot, chat_id, dialogue, catalog, matcher, hotel_name, text, language_code).await
        }
        ClaimDialogueState::ReviewCandidates { .. } | ClaimDialogueState::ReadyToStart { .. } => {
            bot.send_message(chat_id, t_lang("use-buttons", language_code)).await?;
            Ok(())
        }
        ClaimDialogueState::VerifyingName { lead } => {
            handle_verify_name(&bot, chat_id, dialogue, lead, text, language_code).await
        }
        ClaimDialogueState::VerifyingAddress { lead, verify_name } => {
            handle_verify_address(&bot, chat_id, dialogue, matcher, lead, verify_name, text, language_code).await
        }
        ClaimDialogueState::Questionnaire { lead, answers } => {
            let agent = agent_username(msg.from.as_ref());
            handle_questionnaire_answer(&bot, chat_id, dialogue, catalog, lead, answers, &agent, text, language_code)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start"), Some(BotCommand::Start));
        assert_eq!(parse_command("/menu@HotelClaimBot"), Some(BotCommand::Menu));
        assert_eq!(parse_command("  /Cancel now"), Some(BotCommand::Cancel));
        assert_eq!(parse_command("/search"), Some(BotCommand::Search));
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command("Radisson Blu"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_agent_username_without_user() {
        assert_eq!(agent_username(None), "unknown");
    }
}
