//! Sheets adapter errors

use quire_common::QuireError;
use thiserror::Error;

/// Errors raised while talking to the Sheets API
#[derive(Error, Debug)]
pub enum SheetsError {
    /// Missing or invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Non-2xx response from the API
    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// No sheet with the given title in the spreadsheet
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response body did not have the expected shape
    #[error("JSON error: {0}")]
    Json(String),

    /// Generic reqwest error
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type for Sheets operations
pub type SheetsResult<T> = Result<T, SheetsError>;

impl SheetsError {
    /// True for failures worth retrying: timeouts, connection problems,
    /// rate limiting and server errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            SheetsError::Api { status, .. } => *status == 429 || *status >= 500,
            SheetsError::Reqwest(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Error message with credentials stripped.
    pub fn sanitized_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

impl From<SheetsError> for QuireError {
    fn from(err: SheetsError) -> Self {
        match err {
            SheetsError::Config(msg) => QuireError::Config(msg),
            SheetsError::Reqwest(ref e) if e.is_timeout() => {
                QuireError::Timeout(err.sanitized_message())
            }
            other => QuireError::Transport(other.sanitized_message()),
        }
    }
}

/// Removes bearer tokens, credential query parameters and URL userinfo
/// from error messages
fn sanitize_error_message(msg: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static URL_CREDS_RE: OnceLock<Regex> = OnceLock::new();
    static PARAM_RE: OnceLock<Regex> = OnceLock::new();
    static BEARER_RE: OnceLock<Regex> = OnceLock::new();

    let url_creds_re = URL_CREDS_RE
        .get_or_init(|| Regex::new(r"https?://[^@:/]+:[^@/]+@").expect("valid regex"));
    let param_re = PARAM_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(access_token|key)=[^&\s)]+").expect("valid regex")
    });
    let bearer_re = BEARER_RE
        .get_or_init(|| Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/\-]+=*").expect("valid regex"));

    let sanitized = url_creds_re.replace_all(msg, "https://[REDACTED]@");
    let sanitized = param_re.replace_all(&sanitized, "$1=[REDACTED]");
    let sanitized = bearer_re.replace_all(&sanitized, "Bearer [REDACTED]");
    sanitized.to_string()
}
