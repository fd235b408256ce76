//! quire-sheets: Google Sheets backend for quire
//!
//! Implements [`quire::GridStore`] over the Sheets v4 REST API.
//!
//! # Architecture
//!
//! - `SheetsConfig`: spreadsheet ID, bearer token and HTTP settings
//! - `SheetsClient`: reqwest-based client, one HTTP call per store operation
//! - `connect`: validates a config and wraps a client in a [`quire::Db`]
//!
//! Obtaining the OAuth2 token is left to the caller.

pub mod client;
pub mod config;
pub mod error;

pub use client::SheetsClient;
pub use config::{SheetsConfig, DEFAULT_BASE_URL};
pub use error::{SheetsError, SheetsResult};

use quire::{Db, DbOptions};
use std::sync::Arc;
use tracing::info;

/// Opens a spreadsheet as a [`Db`].
pub fn connect(config: SheetsConfig) -> quire::Result<Db> {
    connect_with_options(config, DbOptions::default())
}

/// Same as [`connect`] with explicit [`DbOptions`].
pub fn connect_with_options(config: SheetsConfig, options: DbOptions) -> quire::Result<Db> {
    let client = SheetsClient::new(config)?;
    info!(spreadsheet = %client.spreadsheet_id(), "connected to spreadsheet");
    Ok(Db::with_options(Arc::new(client), options))
}
