//! # Text Normalization Module
//!
//! Canonical forms for hotel names and addresses entered by agents across many
//! chat sessions. Three passes are provided:
//!
//! - [`normalize_soft`]: case-fold and whitespace collapse, used for fuzzy scoring
//! - [`normalize_strict`]: additionally drops quotes and punctuation, used for exact comparison
//! - [`normalize_address`]: strict form plus abbreviation expansion for addresses
//!
//! Georgian letters are ordinary letters for every pass.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Quotation marks and apostrophes removed before the punctuation pass.
const QUOTE_CHARS: &[char] = &['"', '“', '”', '„', '«', '»', '\'', '’', '‘', '`'];

/// Address abbreviations expanded token by token after punctuation stripping.
const ADDRESS_ABBREVIATIONS: &[(&str, &str)] = &[
    ("ქ", "ქუჩა"),
    ("ქუჩ", "ქუჩა"),
    ("გამზ", "გამზირი"),
    ("ჩიხ", "ჩიხი"),
    ("st", "street"),
    ("str", "street"),
    ("ave", "avenue"),
    ("av", "avenue"),
    ("rd", "road"),
];

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("Whitespace pattern should be valid");
    static ref NON_WORD_RUN: Regex =
        Regex::new(r"[^\p{L}\p{N}\s]+").expect("Punctuation pattern should be valid");
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Soft normalization: NFKC, lower-case, trimmed, single spaces.
///
/// Punctuation is kept so that near-identical strings still score high.
///
/// ```rust
/// use hotel_claim_bot::normalization::normalize_soft;
///
/// assert_eq!(normalize_soft("  Radisson   BLU, Batumi "), "radisson blu, batumi");
/// ```
pub fn normalize_soft(s: &str) -> String {
    let composed: String = s.nfkc().collect();
    collapse_whitespace(&composed.to_lowercase())
}

/// Strict normalization for exact comparison.
///
/// Quotes and apostrophes are deleted outright, every other run of
/// punctuation or symbols becomes a single space. Input made only of symbols
/// yields an empty string.
///
/// ```rust
/// use hotel_claim_bot::normalization::normalize_strict;
///
/// assert_eq!(normalize_strict("“Hotel” O'Neill, Tbilisi!"), "hotel oneill tbilisi");
/// assert_eq!(normalize_strict("?!..."), "");
/// ```
pub fn normalize_strict(s: &str) -> String {
    let soft = normalize_soft(s);
    let unquoted: String = soft.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect();
    let cleaned = NON_WORD_RUN.replace_all(&unquoted, " ");
    collapse_whitespace(&cleaned)
}

/// Address-aware normalization: strict form with abbreviations expanded.
///
/// ```rust
/// use hotel_claim_bot::normalization::normalize_address;
///
/// assert_eq!(normalize_address("ბათუმი, ხიმშიაშვილის ქ. 1"), "ბათუმი ხიმშიაშვილის ქუჩა 1");
/// assert_eq!(normalize_address("12 Main St."), "12 main street");
/// ```
pub fn normalize_address(s: &str) -> String {
    normalize_strict(s)
        .split(' ')
        .map(expand_abbreviation)
        .collect::<Vec<_>>()
        .join(" ")
}

fn expand_abbreviation(token: &str) -> &str {
    ADDRESS_ABBREVIATIONS
        .iter()
        .find(|(short, _)| *short == token)
        .map(|(_, full)| *full)
        .unwrap_or(token)
}
