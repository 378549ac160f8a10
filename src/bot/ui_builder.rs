//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::hotel_matcher::{HotelRecord, MatchCandidate};
use crate::localization::{t_args_lang, t_lang};

/// Longest hotel name shown on a candidate button, in characters
const BUTTON_NAME_CHARS: usize = 24;

/// Score in the 0..1 range as a whole percentage string
pub fn format_score(score: f64) -> String {
    format!("{:.0}", (score * 100.0).clamp(0.0, 100.0))
}

/// Shorten text for a button label without splitting a character
///
/// The result is at most `max_chars` characters; a space left in front of
/// the ellipsis is dropped, so it can come out one shorter.
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

/// Main menu with the search entry point
pub fn main_menu_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t_lang("button-search", language_code),
        "search",
    )]])
}

/// Start the questionnaire, or return to the menu
pub fn start_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(t_lang("button-start", language_code), "start")],
        vec![InlineKeyboardButton::callback(t_lang("button-menu", language_code), "menu")],
    ])
}

/// One button per candidate plus a "none of these" button
pub fn candidates_keyboard(candidates: &[MatchCandidate], language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let label = format!("{}. {}", i + 1, truncate_label(&candidate.record.name, BUTTON_NAME_CHARS));
            vec![InlineKeyboardButton::callback(label, format!("pick_{}", i))]
        })
        .collect();

    buttons.push(vec![InlineKeyboardButton::callback(
        t_lang("button-none-match", language_code),
        "pick_none",
    )]);

    InlineKeyboardMarkup::new(buttons)
}

/// Numbered candidate list with per-field scores
pub fn format_candidates_list(candidates: &[MatchCandidate], language_code: Option<&str>) -> String {
    let mut result = t_lang("similar-title", language_code);
    result.push_str("\n\n");

    for (i, candidate) in candidates.iter().enumerate() {
        let index = (i + 1).to_string();
        let name_score = format_score(candidate.name_score);
        let address_score = format_score(candidate.address_score);
        result.push_str(&t_args_lang(
            "similar-candidate",
            &[
                ("index", &index),
                ("name", &candidate.record.name),
                ("address", &candidate.record.address),
                ("name_score", &name_score),
                ("address_score", &address_score),
            ],
            language_code,
        ));
        result.push('\n');
    }

    result
}

/// Notice that the hotel has already been surveyed, with its catalog comment
pub fn format_already_surveyed(record: &HotelRecord, language_code: Option<&str>) -> String {
    let comment = if record.comment.trim().is_empty() {
        t_lang("no-comment", language_code)
    } else {
        record.comment.clone()
    };
    t_args_lang(
        "already-surveyed",
        &[("name", &record.name), ("address", &record.address), ("comment", &comment)],
        language_code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.914), "91");
        assert_eq!(format_score(1.0), "100");
        assert_eq!(format_score(0.0), "0");
    }

    #[test]
    fn test_truncate_label_respects_characters() {
        assert_eq!(truncate_label("Hotel Iveria", 24), "Hotel Iveria");

        let label = truncate_label("Radisson Blu Batumi", 10);
        assert_eq!(label, "Radisson…");
        assert_eq!(label.chars().count(), 9);

        let label = truncate_label("სასტუმროპალასი ბათუმში", 10);
        assert_eq!(label, "სასტუმროპ…");
        assert_eq!(label.chars().count(), 10);
    }

    #[test]
    fn test_truncate_label_drops_space_before_ellipsis() {
        let label = truncate_label("სასტუმრო ბათუმის ცენტრში ზღვასთან", 10);
        assert_eq!(label, "სასტუმრო…");
        assert!(label.chars().count() <= 10);
    }

    #[test]
    fn test_candidates_keyboard_layout() {
        let candidate = MatchCandidate {
            record: HotelRecord::new("Radisson Blu Batumi", "ბათუმი, ნინოშვილის ქ. 1", "", ""),
            name_score: 1.0,
            address_score: 0.8,
            combined_score: 0.92,
        };
        let keyboard = candidates_keyboard(&[candidate.clone(), candidate], Some("en"));
        // two candidates plus "none of these"
        assert_eq!(keyboard.inline_keyboard.len(), 3);
    }
}
