//! # Sheets Error Types Module
//!
//! Error types for the Google Sheets adapter: transport failures, API status
//! errors, unreadable payloads and worksheet layout problems.

/// Custom error types for spreadsheet operations
#[derive(Debug, Clone)]
pub enum SheetsError {
    /// Transport-level failure (connect, timeout, TLS)
    Http(String),
    /// The API answered with a non-success status
    Status { code: u16, body: String },
    /// The response body could not be decoded
    Decode(String),
    /// A required column is missing from the header row
    MissingColumn(String),
    /// Calls are suspended after repeated failures
    CircuitOpen,
}

impl SheetsError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SheetsError::Http(_) => true,
            SheetsError::Status { code, .. } => *code == 429 || *code >= 500,
            SheetsError::Decode(_) | SheetsError::MissingColumn(_) | SheetsError::CircuitOpen => false,
        }
    }
}

impl std::fmt::Display for SheetsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsError::Http(msg) => write!(f, "HTTP error: {msg}"),
            SheetsError::Status { code, body } => write!(f, "Sheets API returned status {code}: {body}"),
            SheetsError::Decode(msg) => write!(f, "Decode error: {msg}"),
            SheetsError::MissingColumn(column) => write!(f, "Missing column in header row: {column}"),
            SheetsError::CircuitOpen => write!(f, "Sheets calls suspended after repeated failures"),
        }
    }
}

impl std::error::Error for SheetsError {}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SheetsError::Decode(err.to_string())
        } else {
            SheetsError::Http(err.to_string())
        }
    }
}
