//! # Bot Configuration Module
//!
//! Settings read from the environment (a `.env` file is loaded first by
//! `main`). Required: `TELEGRAM_BOT_TOKEN`, `SPREADSHEET_ID`,
//! `GOOGLE_SHEETS_ACCESS_TOKEN`. Everything else has a default.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::hotel_catalog::DEFAULT_CACHE_TTL;
use crate::match_config::{MatchPolicy, RecoveryConfig};
use crate::session_store::DEFAULT_SESSION_TTL;
use crate::sheets::{SheetsSettings, SHEETS_API_BASE};

pub const DEFAULT_HOTELS_WORKSHEET: &str = "Hotels";
pub const DEFAULT_LEADS_WORKSHEET: &str = "Leads";

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub sheets: SheetsSettings,
    pub hotels_cache_ttl: Duration,
    pub session_ttl: Duration,
    pub match_policy: MatchPolicy,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl BotConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration from a map, used by tests
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let defaults = MatchPolicy::default();
        let match_policy = MatchPolicy {
            name_weight: parse_or(&lookup, "MATCH_NAME_WEIGHT", defaults.name_weight)?,
            address_weight: parse_or(&lookup, "MATCH_ADDRESS_WEIGHT", defaults.address_weight)?,
            combined_threshold: parse_or(&lookup, "MATCH_COMBINED_THRESHOLD", defaults.combined_threshold)?,
            field_threshold: parse_or(&lookup, "MATCH_FIELD_THRESHOLD", defaults.field_threshold)?,
            max_candidates: parse_or(&lookup, "MATCH_MAX_CANDIDATES", defaults.max_candidates)?,
            algorithm: match lookup("MATCH_ALGORITHM") {
                Some(value) => value.parse().map_err(|e: String| anyhow!(e))?,
                None => defaults.algorithm,
            },
        };
        match_policy
            .validate()
            .map_err(|e| anyhow!(e))
            .context("Invalid match policy")?;

        let sheets = SheetsSettings {
            base_url: or_default("SHEETS_API_BASE", SHEETS_API_BASE),
            spreadsheet_id: required("SPREADSHEET_ID")?,
            access_token: required("GOOGLE_SHEETS_ACCESS_TOKEN")?,
            hotels_worksheet: or_default("HOTELS_WORKSHEET", DEFAULT_HOTELS_WORKSHEET),
            leads_worksheet: or_default("LEADS_WORKSHEET", DEFAULT_LEADS_WORKSHEET),
            recovery: RecoveryConfig::default(),
        };

        Ok(Self {
            telegram_token: required("TELEGRAM_BOT_TOKEN")?,
            sheets,
            hotels_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "HOTELS_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL.as_secs(),
            )?),
            session_ttl: Duration::from_secs(parse_or(&lookup, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL.as_secs())?),
            match_policy,
            json_logs: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}
