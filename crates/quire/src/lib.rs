//! quire: a small document-database facade over spreadsheet grids.
//!
//! Records are plain `serde` structs. A [`Table`] maps them to rows of a
//! named sheet whose first row is the header, and a [`Query`] filters the
//! sheet's rows in memory before decoding them.
//!
//! ```ignore
//! use quire::{Db, MemoryGridStore};
//! use std::sync::Arc;
//!
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct User {
//!     #[serde(rename = "ID")]
//!     id: i64,
//!     #[serde(rename = "Name")]
//!     name: String,
//! }
//!
//! let db = Db::new(Arc::new(MemoryGridStore::new()));
//! let users = db.table("Users");
//! users.insert(&[User { id: 1, name: "Alice".into() }]).await?;
//! let found: Vec<User> = users.query().where_clause("Name", "=", "Alice").all().await?;
//! ```
//!
//! The remote side is abstracted by [`GridStore`]; see the `quire-sheets`
//! crate for the Google Sheets implementation.

pub mod address;
pub mod cell;
pub mod codec;
pub mod db;
pub mod filter;
pub mod query;
pub mod store;
pub mod table;

pub use cell::{Cell, Grid, Row};
pub use codec::RecordShape;
pub use db::{Db, DbOptions};
pub use filter::{compare, Filter, Operator};
pub use query::{OrderDirection, Query, RowSet};
pub use quire_common::{QuireError, Result};
pub use store::{GridStore, MemoryGridStore};
pub use table::Table;
