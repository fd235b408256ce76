//! Sheets client configuration

use std::fmt;
use std::time::Duration;

use crate::error::{SheetsError, SheetsResult};

/// Default endpoint of the Sheets v4 API
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Configuration for [`crate::SheetsClient`]
#[derive(Clone)]
pub struct SheetsConfig {
    /// Spreadsheet to operate on (the long ID in the sheet's URL)
    pub spreadsheet_id: String,

    /// OAuth2 bearer token with the spreadsheets scope
    pub access_token: String,

    /// API endpoint, overridable for proxies and tests
    pub base_url: String,

    /// Total request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            access_token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("quire-sheets/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("access_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl SheetsConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `QUIRE_SPREADSHEET_ID`, `QUIRE_ACCESS_TOKEN` and
    /// (optionally) `QUIRE_BASE_URL`. Missing values stay empty; call
    /// [`SheetsConfig::validate`] before use.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(id) = std::env::var("QUIRE_SPREADSHEET_ID") {
            config.spreadsheet_id = id;
        }
        if let Ok(token) = std::env::var("QUIRE_ACCESS_TOKEN") {
            config.access_token = token;
        }
        if let Ok(url) = std::env::var("QUIRE_BASE_URL") {
            config.base_url = url;
        }
        config
    }

    /// Set the spreadsheet ID
    pub fn spreadsheet_id(mut self, id: impl Into<String>) -> Self {
        self.spreadsheet_id = id.into();
        self
    }

    /// Set the bearer token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Set the API endpoint
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set timeout from seconds. Negative, NaN or overflowing values are a
    /// config error.
    pub fn timeout_secs(mut self, secs: f64) -> SheetsResult<Self> {
        self.timeout = Duration::try_from_secs_f64(secs)
            .map_err(|_| SheetsError::Config(format!("invalid timeout: {} seconds", secs)))?;
        Ok(self)
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Checks the settings a client cannot work without.
    pub fn validate(&self) -> SheetsResult<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::Config("spreadsheet ID is required".to_string()));
        }
        if self.access_token.trim().is_empty() {
            return Err(SheetsError::Config("credentials are required".to_string()));
        }
        url::Url::parse(&self.base_url)?;
        Ok(())
    }
}
