//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error};

use crate::localization::t_lang;

use crate::dialogue::{ClaimDialogue, ClaimDialogueState};

use super::dialogue_manager::{begin_search, handle_candidate_choice, show_menu, start_verification};

/// Button actions carried in callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Search,
    Menu,
    Start,
    Pick(usize),
    PickNone,
}

/// Parse inline button callback data
pub fn parse_callback_data(data: &str) -> Option<CallbackAction> {
    match data {
        "search" => Some(CallbackAction::Search),
        "menu" => Some(CallbackAction::Menu),
        "start" => Some(CallbackAction::Start),
        "pick_none" => Some(CallbackAction::PickNone),
        _ => data
            .strip_prefix("pick_")
            .and_then(|index| index.parse().ok())
            .map(CallbackAction::Pick),
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: ClaimDialogue,
) -> Result<()> {
    let chat_id = dialogue.chat_id();
    let language_code = q.from.language_code.clone();
    let language_code = language_code.as_deref();
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Buttons act once; drop the keyboard from the message that was pressed
    if let Some(msg) = &q.message {
        if let Err(e) = bot.edit_message_reply_markup(msg.chat().id, msg.id()).await {
            debug!(user_id = %q.from.id, error = %e, "Failed to remove inline keyboard");
        }
    }

    let action = q.data.as_deref().and_then(parse_callback_data);
    let state = dialogue.get().await?.unwrap_or_default();
    debug!(user_id = %q.from.id, dialogue_state = ?state, action = ?action, "Dispatching callback");

    let outcome = match (action, state) {
        (Some(CallbackAction::Search), _) => begin_search(&bot, chat_id, dialogue, language_code).await,
        (Some(CallbackAction::Menu), _) => show_menu(&bot, chat_id, dialogue, language_code).await,
        (Some(CallbackAction::Start), ClaimDialogueState::ReadyToStart { lead }) => {
            start_verification(&bot, chat_id, dialogue, lead, language_code).await
        }
        (Some(CallbackAction::Pick(index)), ClaimDialogueState::ReviewCandidates { query, candidates })
            if index < candidates.len() =>
        {
            let chosen = candidates.into_iter().nth(index);
            handle_candidate_choice(&bot, chat_id, dialogue, query, chosen, language_code).await
        }
        (Some(CallbackAction::PickNone), ClaimDialogueState::ReviewCandidates { query, .. }) => {
            handle_candidate_choice(&bot, chat_id, dialogue, query, None, language_code).await
        }
        _ => {
            // stale button from an earlier step, or unknown data
            bot.send_message(chat_id, t_lang("follow-instructions", language_code))
                .await
                .map(|_| ())
                .map_err(Into::into)
        }
    };

    // Answer the callback query to remove the loading state
    if let Err(e) = bot.answer_callback_query(q.id).await {
        error!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_data() {
        assert_eq!(parse_callback_data("search"), Some(CallbackAction::Search));
        assert_eq!(parse_callback_data("menu"), Some(CallbackAction::Menu));
        assert_eq!(parse_callback_data("start"), Some(CallbackAction::Start));
        assert_eq!(parse_callback_data("pick_0"), Some(CallbackAction::Pick(0)));
        assert_eq!(parse_callback_data("pick_4"), Some(CallbackAction::Pick(4)));
        assert_eq!(parse_callback_data("pick_none"), Some(CallbackAction::PickNone));
        assert_eq!(parse_callback_data("pick_x"), None);
        assert_eq!(parse_callback_data("edit_1"), None);
    }
}
