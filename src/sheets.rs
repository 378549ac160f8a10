//! # Google Sheets Module
//!
//! Reads the surveyed-hotels worksheet and appends lead rows through the
//! Google Sheets API v4 values endpoints.
//!
//! The hotels worksheet header row is matched tolerantly: headers are
//! strict-normalized and compared against a table of English and Georgian
//! aliases, so `"Hotel Name"`, `name_en` and `სასტუმროს სახელი` all resolve to
//! the name column.

use chrono::Local;
use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::hotel_catalog::{HotelCatalog, HotelSource};
use crate::hotel_matcher::HotelRecord;
use crate::match_config::RecoveryConfig;
use crate::normalization::normalize_strict;
use crate::sheets_errors::SheetsError;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Catalog backed by the Sheets client
pub type SheetsCatalog = HotelCatalog<SheetsClient>;

// Aliases are compared after strict normalization ("name_en" -> "name en")
const NAME_ALIASES: &[&str] = &["name en", "hotel name", "hotelname", "hotel name en", "სასტუმროს სახელი"];
const ADDRESS_ALIASES: &[&str] = &["address ka", "address", "მისამართი"];
const STATUS_ALIASES: &[&str] = &["status", "სტატუსი"];
const COMMENT_ALIASES: &[&str] = &["comment", "კომენტარი"];

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderColumns {
    pub name: usize,
    pub address: usize,
    pub status: Option<usize>,
    pub comment: Option<usize>,
}

impl HeaderColumns {
    /// Resolve column positions; the name and address columns are required
    pub fn from_header(header: &[String]) -> Result<Self, SheetsError> {
        let normalized: Vec<String> = header.iter().map(|h| normalize_strict(h)).collect();
        let find = |aliases: &[&str]| normalized.iter().position(|h| aliases.contains(&h.as_str()));

        Ok(Self {
            name: find(NAME_ALIASES).ok_or_else(|| SheetsError::MissingColumn("hotel name".to_string()))?,
            address: find(ADDRESS_ALIASES).ok_or_else(|| SheetsError::MissingColumn("address".to_string()))?,
            status: find(STATUS_ALIASES),
            comment: find(COMMENT_ALIASES),
        })
    }
}

/// Turn raw worksheet values (header row first) into hotel records
///
/// Short rows are padded with empty cells; rows whose name and address are
/// both blank are skipped.
pub fn parse_hotel_rows(values: &[Vec<String>]) -> Result<Vec<HotelRecord>, SheetsError> {
    let Some((header, rows)) = values.split_first() else {
        return Ok(Vec::new());
    };
    let columns = HeaderColumns::from_header(header)?;

    let cell = |row: &[String], index: Option<usize>| -> String {
        index
            .and_then(|i| row.get(i))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let hotels: Vec<HotelRecord> = rows
        .iter()
        .map(|row| HotelRecord {
            name: cell(row, Some(columns.name)),
            address: cell(row, Some(columns.address)),
            status: cell(row, columns.status),
            comment: cell(row, columns.comment),
        })
        .filter(|record| !(record.name.is_empty() && record.address.is_empty()))
        .collect();

    debug!(
        rows_read = rows.len(),
        hotels_kept = hotels.len(),
        "Parsed hotel worksheet rows"
    );
    Ok(hotels)
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// One row appended to the leads worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRecord {
    pub created_at: String,
    pub agent_username: String,
    pub hotel_name: String,
    pub address: String,
    pub matched: bool,
    pub decision: String,
    pub matched_comment: String,
    pub answers: BTreeMap<String, String>,
}

impl LeadRecord {
    /// Timestamp in the format the leads worksheet uses
    pub fn timestamp_now() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Cells in worksheet column order:
    /// `created_at | agent_username | hotel_name | address | matched | decision | matched_comment | answers`
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.created_at.clone(),
            self.agent_username.clone(),
            self.hotel_name.clone(),
            self.address.clone(),
            if self.matched { "YES" } else { "NO" }.to_string(),
            self.decision.clone(),
            self.matched_comment.clone(),
            serde_json::to_string(&self.answers).unwrap_or_default(),
        ]
    }
}

/// Settings for [`SheetsClient`]
#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub base_url: String,
    pub spreadsheet_id: String,
    pub access_token: String,
    pub hotels_worksheet: String,
    pub leads_worksheet: String,
    pub recovery: RecoveryConfig,
}

/// Google Sheets values API client with retries and a circuit breaker
pub struct SheetsClient {
    http: reqwest::Client,
    settings: SheetsSettings,
    circuit_breaker: CircuitBreaker,
}

impl SheetsClient {
    pub fn new(settings: SheetsSettings) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.recovery.request_timeout_secs))
            .build()?;
        let circuit_breaker = CircuitBreaker::new(settings.recovery.clone());
        Ok(Self {
            http,
            settings,
            circuit_breaker,
        })
    }

    /// URL of a worksheet's values endpoint, with an optional `:method` suffix
    pub fn values_url(&self, worksheet: &str, method: Option<&str>) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.settings.base_url).map_err(|e| SheetsError::Http(e.to_string()))?;
        // Quoted A1 range so names with spaces or non-Latin letters resolve
        let mut range = format!("'{}'", worksheet.replace('\'', "''"));
        if let Some(method) = method {
            range.push(':');
            range.push_str(method);
        }
        url.path_segments_mut()
            .map_err(|_| SheetsError::Http("Sheets base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(&self.settings.spreadsheet_id)
            .push("values")
            .push(&range);
        Ok(url)
    }

    /// Read every row of a worksheet as strings
    pub async fn read_values(&self, worksheet: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(worksheet, None)?;
        let range: ValueRange = self
            .with_retries("read_values", || {
                let request = self.http.get(url.clone()).bearer_auth(&self.settings.access_token);
                async move { Self::decode(request.send().await?).await }
            })
            .await?;

        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    /// Append one lead row to the leads worksheet
    pub async fn append_lead(&self, lead: &LeadRecord) -> Result<(), SheetsError> {
        let url = self.values_url(&self.settings.leads_worksheet, Some("append"))?;
        let body = json!({ "values": [lead.to_row()] });

        let _: Value = self
            .with_retries("append_lead", || {
                let request = self
                    .http
                    .post(url.clone())
                    .bearer_auth(&self.settings.access_token)
                    .query(&[("valueInputOption", "USER_ENTERED"), ("insertDataOption", "INSERT_ROWS")])
                    .json(&body);
                async move { Self::decode(request.send().await?).await }
            })
            .await?;

        info!(hotel = %lead.hotel_name, agent = %lead.agent_username, "Lead row appended to sheet");
        Ok(())
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, SheetsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn with_retries<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, SheetsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SheetsError>>,
    {
        let recovery = &self.settings.recovery;
        let mut attempt = 0;

        loop {
            if self.circuit_breaker.is_open() {
                warn!(
                    operation,
                    failures = self.circuit_breaker.failure_count(),
                    "Circuit breaker open, skipping Sheets call"
                );
                return Err(SheetsError::CircuitOpen);
            }

            attempt += 1;
            match call().await {
                Ok(value) => {
                    self.circuit_breaker.record_success();
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt <= recovery.max_retries => {
                    self.circuit_breaker.record_failure();
                    let delay = recovery.backoff_delay_ms(attempt);
                    let jitter = rand::thread_rng().gen_range(0..=delay / 4);
                    warn!(
                        operation,
                        attempt,
                        error = %e,
                        retry_in_ms = delay + jitter,
                        "Sheets call failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay + jitter)).await;
                }
                Err(e) => {
                    if e.is_transient() {
                        self.circuit_breaker.record_failure();
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl HotelSource for SheetsClient {
    async fn fetch_hotels(&self) -> Result<Vec<HotelRecord>, SheetsError> {
        let values = self.read_values(&self.settings.hotels_worksheet).await?;
        parse_hotel_rows(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn settings() -> SheetsSettings {
        SheetsSettings {
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id: "sheet123".to_string(),
            access_token: "token".to_string(),
            hotels_worksheet: "Hotels".to_string(),
            leads_worksheet: "Leads".to_string(),
            recovery: RecoveryConfig::default(),
        }
    }

    #[test]
    fn test_header_aliases() {
        let columns = HeaderColumns::from_header(&row(&["name_en", "address_ka", "status", "comment"])).unwrap();
        assert_eq!(
            columns,
            HeaderColumns {
                name: 0,
                address: 1,
                status: Some(2),
                comment: Some(3)
            }
        );

        let columns =
            HeaderColumns::from_header(&row(&["კომენტარი", " \"Hotel Name\" ", "მისამართი"])).unwrap();
        assert_eq!(columns.name, 1);
        assert_eq!(columns.address, 2);
        assert_eq!(columns.status, None);
        assert_eq!(columns.comment, Some(0));
    }

    #[test]
    fn test_missing_address_column() {
        let err = HeaderColumns::from_header(&row(&["hotel name", "status"])).unwrap_err();
        assert!(matches!(err, SheetsError::MissingColumn(ref c) if c == "address"));
    }

    #[test]
    fn test_parse_rows_pads_and_skips_blank() {
        let values = vec![
            row(&["name_en", "address_ka", "status", "comment"]),
            row(&["Radisson Blu Batumi", "ბათუმი, ხიმშიაშვილის ქუჩა 1", "surveyed", "contacted July"]),
            row(&["Hotel Iveria", "თბილისი"]),
            row(&["", "  ", "done", "orphan comment"]),
            row(&[]),
        ];
        let hotels = parse_hotel_rows(&values).unwrap();

        assert_eq!(hotels.len(), 2);
        assert_eq!(
            hotels[0],
            HotelRecord::new("Radisson Blu Batumi", "ბათუმი, ხიმშიაშვილის ქუჩა 1", "surveyed", "contacted July")
        );
        assert_eq!(hotels[1], HotelRecord::new("Hotel Iveria", "თბილისი", "", ""));
    }

    #[test]
    fn test_parse_empty_sheet() {
        assert!(parse_hotel_rows(&[]).unwrap().is_empty());
        assert!(parse_hotel_rows(&[row(&["name_en", "address_ka"])]).unwrap().is_empty());
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&json!("abc")), "abc");
        assert_eq!(cell_to_string(&json!(42)), "42");
        assert_eq!(cell_to_string(&Value::Null), "");
    }

    #[test]
    fn test_lead_row_layout() {
        let mut answers = BTreeMap::new();
        answers.insert("rooms".to_string(), "40".to_string());
        answers.insert("contact".to_string(), "ნინო, 555 12 34 56".to_string());
        let lead = LeadRecord {
            created_at: "2026-10-17 10:00:00".to_string(),
            agent_username: "agent_giorgi".to_string(),
            hotel_name: "Hotel Iveria".to_string(),
            address: "თბილისი".to_string(),
            matched: false,
            decision: "new_lead".to_string(),
            matched_comment: String::new(),
            answers,
        };

        let cells = lead.to_row();
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[4], "NO");
        assert_eq!(cells[5], "new_lead");
        assert_eq!(cells[7], r#"{"contact":"ნინო, 555 12 34 56","rooms":"40"}"#);
    }

    #[test]
    fn test_values_url_quotes_worksheet() {
        let client = SheetsClient::new(settings()).unwrap();
        let url = client.values_url("Hotels", None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/'Hotels'"
        );

        let url = client.values_url("Leads", Some("append")).unwrap();
        assert!(url.as_str().ends_with("/values/'Leads':append"));
    }
}
