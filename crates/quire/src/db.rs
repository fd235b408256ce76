//! Database handle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::store::GridStore;
use crate::table::Table;
use quire_common::{QuireError, Result};

/// Options applied to every table handed out by a [`Db`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbOptions {
    /// Deadline for each individual store call. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl DbOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Deadline in seconds. Negative, NaN or overflowing values are a
    /// config error.
    pub fn call_timeout_secs(self, secs: f64) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(secs).map_err(|_| {
            QuireError::Config(format!("invalid call timeout: {} seconds", secs))
        })?;
        Ok(self.call_timeout(timeout))
    }
}

/// A spreadsheet seen as a database of tables.
///
/// Cloning is cheap; clones share the underlying store.
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn GridStore>,
    options: DbOptions,
}

impl Db {
    pub fn new(store: Arc<dyn GridStore>) -> Self {
        Self::with_options(store, DbOptions::default())
    }

    pub fn with_options(store: Arc<dyn GridStore>, options: DbOptions) -> Self {
        Self { store, options }
    }

    /// Handle for the sheet called `name`. No remote call is made.
    pub fn table(&self, name: impl Into<String>) -> Table {
        Table::new(name, Arc::clone(&self.store), self.options.call_timeout)
    }

    pub fn options(&self) -> &DbOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn GridStore> {
        &self.store
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryGridStore;

    #[test]
    fn test_options_builder() {
        assert_eq!(DbOptions::default().call_timeout, None);
        let options = DbOptions::new().call_timeout_secs(1.5).unwrap();
        assert_eq!(options.call_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_call_timeout_secs_rejects_negative_and_nan() {
        for secs in [-1.0, f64::NAN] {
            let err = DbOptions::new().call_timeout_secs(secs).unwrap_err();
            assert!(matches!(err, QuireError::Config(ref msg) if msg.contains("invalid call timeout")));
        }
    }

    #[test]
    fn test_table_handles_share_store() {
        let db = Db::with_options(
            Arc::new(MemoryGridStore::new()),
            DbOptions::new().call_timeout(Duration::from_secs(2)),
        );
        let users = db.table("Users");
        let orders = db.clone().table(String::from("Orders"));
        assert_eq!(users.name(), "Users");
        assert_eq!(orders.name(), "Orders");
        assert!(format!("{:?}", users).contains("2s"));
    }
}
