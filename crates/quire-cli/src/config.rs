//! quire.toml handling for the `quire` binary
//!
//! Settings come from three layers, later ones winning: the TOML file,
//! the `QUIRE_*` environment variables, then command-line flags.

use anyhow::{Context, Result};
use quire_sheets::{SheetsConfig, SheetsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Connection settings, every field optional so layers can be merged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
}

impl CliConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Values from `QUIRE_SPREADSHEET_ID`, `QUIRE_ACCESS_TOKEN`, `QUIRE_BASE_URL`
    pub fn from_env() -> Self {
        let from_sheets = SheetsConfig::from_env();
        let defaults = SheetsConfig::default();
        Self {
            spreadsheet_id: non_empty(from_sheets.spreadsheet_id),
            access_token: non_empty(from_sheets.access_token),
            base_url: (from_sheets.base_url != defaults.base_url).then_some(from_sheets.base_url),
            timeout_secs: None,
        }
    }

    /// Overlays `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: CliConfig) -> Self {
        Self {
            spreadsheet_id: other.spreadsheet_id.or(self.spreadsheet_id),
            access_token: other.access_token.or(self.access_token),
            base_url: other.base_url.or(self.base_url),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Builds the client configuration. An unusable timeout fails here;
    /// missing values are left for [`SheetsConfig::validate`] to report.
    pub fn into_sheets_config(self) -> SheetsResult<SheetsConfig> {
        let mut config = SheetsConfig::new();
        if let Some(id) = self.spreadsheet_id {
            config = config.spreadsheet_id(id);
        }
        if let Some(token) = self.access_token {
            config = config.access_token(token);
        }
        if let Some(url) = self.base_url {
            config = config.base_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.timeout_secs(secs)?;
        }
        Ok(config)
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
