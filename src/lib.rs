//! # Hotel Claim Telegram Bot
//!
//! A Telegram bot that lets field agents check whether a hotel has already
//! been surveyed. Typed hotel names and addresses are fuzzy-matched against
//! a Google Sheets catalog; new leads are appended back to the spreadsheet.

pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod dialogue;
pub mod hotel_catalog;
pub mod hotel_matcher;
pub mod localization;
pub mod match_config;
pub mod normalization;
pub mod session_store;
pub mod sheets;
pub mod sheets_errors;
pub mod similarity;
