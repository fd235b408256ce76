//! Table handle: record-level operations on one sheet.
//!
//! Row indices are 0-based and exclude the header. Value writes address the
//! sheet 1-based with the header on row 1 (`index + 2`); row deletion
//! addresses it 0-based with the header at 0 (`index + 1`).

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::address::{append_anchor, row_range};
use crate::cell::{Cell, Grid};
use crate::codec;
use crate::filter::{Filter, Operator};
use crate::query::Query;
use crate::store::GridStore;
use quire_common::{QuireError, Result};

/// A named sheet inside a [`crate::Db`].
#[derive(Clone)]
pub struct Table {
    name: String,
    store: Arc<dyn GridStore>,
    call_timeout: Option<Duration>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

fn check_index(row_index: i64) -> Result<usize> {
    usize::try_from(row_index)
        .map_err(|_| QuireError::Range(format!("row index cannot be negative: {}", row_index)))
}

impl Table {
    pub(crate) fn new(
        name: impl Into<String>,
        store: Arc<dyn GridStore>,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            call_timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts a query over this table.
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }

    /// Appends records after the last row. Nothing is sent for an empty batch.
    #[instrument(skip(self, records), fields(table = %self.name))]
    pub async fn insert<T: Serialize + ?Sized>(&self, records: &T) -> Result<()> {
        let rows = codec::encode_many(records)?;
        if rows.is_empty() {
            return Ok(());
        }

        let count = rows.len();
        let range = append_anchor(&self.name);
        self.call("append", self.store.append(&range, rows)).await?;
        info!(rows = count, "appended rows");
        Ok(())
    }

    /// Overwrites the data row at `row_index` with `record`.
    #[instrument(skip(self, record), fields(table = %self.name))]
    pub async fn update<T: Serialize + ?Sized>(&self, row_index: i64, record: &T) -> Result<()> {
        let index = check_index(row_index)?;
        let row = codec::encode(record)?;
        let range = row_range(&self.name, index + 2, row.len());
        self.call("write", self.store.write(&range, vec![row])).await?;
        info!(row = index, "updated row");
        Ok(())
    }

    /// Overwrites every data row matching the condition with `record`.
    ///
    /// Rows are written one by one; a failure stops the loop and earlier
    /// writes stay applied. Returns the number of rows written.
    #[instrument(skip(self, value, record), fields(table = %self.name))]
    pub async fn update_where<T: Serialize + ?Sized>(
        &self,
        column: &str,
        operator: &str,
        value: impl Into<Cell>,
        record: &T,
    ) -> Result<usize> {
        let filter = Filter::new(column, operator, value);
        let matches = self.matching_positions(&filter).await?;
        if matches.is_empty() {
            return Ok(0);
        }

        let row = codec::encode(record)?;
        for &position in &matches {
            let range = row_range(&self.name, position + 2, row.len());
            self.call("write", self.store.write(&range, vec![row.clone()]))
                .await
                .map_err(|e| {
                    warn!(row = position, error = %e, "update stopped");
                    e
                })?;
        }

        info!(rows = matches.len(), "updated matching rows");
        Ok(matches.len())
    }

    /// Deletes the data row at `row_index`.
    #[instrument(skip(self), fields(table = %self.name))]
    pub async fn delete(&self, row_index: i64) -> Result<()> {
        let index = check_index(row_index)?;
        self.call("delete_rows", self.store.delete_rows(&self.name, &[index + 1]))
            .await?;
        info!(row = index, "deleted row");
        Ok(())
    }

    /// Deletes every data row matching the condition in one call.
    ///
    /// Indices are sent highest first so that each deletion leaves the
    /// remaining indices valid. Returns the number of rows deleted.
    #[instrument(skip(self, value), fields(table = %self.name))]
    pub async fn delete_where(
        &self,
        column: &str,
        operator: &str,
        value: impl Into<Cell>,
    ) -> Result<usize> {
        let filter = Filter::new(column, operator, value);
        let mut indices: Vec<usize> = self
            .matching_positions(&filter)
            .await?
            .into_iter()
            .map(|position| position + 1)
            .collect();
        if indices.is_empty() {
            return Ok(0);
        }

        indices.sort_unstable_by(|a, b| b.cmp(a));
        self.call("delete_rows", self.store.delete_rows(&self.name, &indices))
            .await?;
        info!(rows = indices.len(), "deleted matching rows");
        Ok(indices.len())
    }

    /// Reads the whole table, header first.
    pub(crate) async fn read_grid(&self) -> Result<Grid> {
        self.call("read", self.store.read(&self.name)).await
    }

    /// 0-based data-row positions matching `filter`.
    async fn matching_positions(&self, filter: &Filter) -> Result<Vec<usize>> {
        let grid = self.read_grid().await?;
        let Some((header, rows)) = grid.split_first() else {
            return Ok(Vec::new());
        };
        if let Operator::Unsupported(op) = &filter.operator {
            warn!(operator = %op, "unsupported operator matches nothing");
        }
        Ok(rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row, header))
            .map(|(i, _)| i)
            .collect())
    }

    /// Runs one store call under the configured deadline.
    async fn call<T>(&self, op: &'static str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let result = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(QuireError::Timeout(format!(
                    "{} on `{}` exceeded {:?}",
                    op, self.name, limit
                ))),
            },
            None => fut.await,
        };

        if let Err(e) = &result {
            warn!(op, error = %e, "store call failed");
        }
        result
    }
}
