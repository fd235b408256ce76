//! Grid storage seam.
//!
//! Everything that talks to an actual spreadsheet sits behind [`GridStore`].
//! The core only ever builds range strings (see [`crate::address`]) and hands
//! rows of [`Cell`]s across; transport, credentials and retries belong to the
//! implementation.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use crate::address::A1Range;
use crate::cell::{Cell, Grid, Row};
use quire_common::{QuireError, Result};

/// Raw access to the grids of a spreadsheet.
///
/// Failures are reported as [`QuireError::Transport`]; the core passes them
/// through untouched.
#[async_trait]
pub trait GridStore: Send + Sync {
    /// Reads a range. A bare table name reads the whole table, header first.
    async fn read(&self, range: &str) -> Result<Grid>;

    /// Overwrites the cells of a range, starting at its top-left corner.
    async fn write(&self, range: &str, rows: Vec<Row>) -> Result<()>;

    /// Appends rows after the last occupied row of the table.
    async fn append(&self, range: &str, rows: Vec<Row>) -> Result<()>;

    /// Deletes rows by absolute 0-based index, one at a time, in the order given.
    async fn delete_rows(&self, table: &str, indices: &[usize]) -> Result<()>;
}

/// In-process [`GridStore`] over a map of named grids.
///
/// Handy for tests and local tooling. Deletion follows the remote service:
/// indices are applied one after another, so callers removing several rows
/// must pass them in descending order.
#[derive(Debug, Default)]
pub struct MemoryGridStore {
    tables: RwLock<HashMap<String, Grid>>,
}

impl MemoryGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a table.
    pub fn with_table(self, name: impl Into<String>, grid: Grid) -> Self {
        self.insert_table(name, grid);
        self
    }

    pub fn insert_table(&self, name: impl Into<String>, grid: Grid) {
        self.tables.write().insert(name.into(), grid);
    }

    /// Current contents of a table.
    pub fn snapshot(&self, name: &str) -> Option<Grid> {
        self.tables.read().get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }
}

fn parse_range(range: &str) -> Result<A1Range> {
    A1Range::parse(range).ok_or_else(|| QuireError::Transport(format!("invalid range `{}`", range)))
}

fn unknown_table(name: &str) -> QuireError {
    QuireError::Transport(format!("unknown table `{}`", name))
}

#[async_trait]
impl GridStore for MemoryGridStore {
    async fn read(&self, range: &str) -> Result<Grid> {
        let range = parse_range(range)?;
        let tables = self.tables.read();
        let grid = tables.get(&range.table).ok_or_else(|| unknown_table(&range.table))?;

        let Some(start) = range.start else {
            return Ok(grid.clone());
        };

        let first_row = start.row - 1;
        let (last_row, last_col) = match range.end {
            Some(end) => (end.row - 1, end.column),
            None => (first_row, start.column),
        };

        Ok(grid
            .iter()
            .enumerate()
            .filter(|(i, _)| *i >= first_row && *i <= last_row)
            .map(|(_, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(j, _)| *j >= start.column && *j <= last_col)
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect())
    }

    async fn write(&self, range: &str, rows: Vec<Row>) -> Result<()> {
        let range = parse_range(range)?;
        let start = range
            .start
            .ok_or_else(|| QuireError::Transport("write needs a cell range".to_string()))?;

        let mut tables = self.tables.write();
        let grid = tables
            .get_mut(&range.table)
            .ok_or_else(|| unknown_table(&range.table))?;

        for (i, row) in rows.into_iter().enumerate() {
            let target = start.row - 1 + i;
            if grid.len() <= target {
                grid.resize_with(target + 1, Vec::new);
            }
            let dest = &mut grid[target];
            for (j, cell) in row.into_iter().enumerate() {
                let col = start.column + j;
                if dest.len() <= col {
                    dest.resize(col + 1, Cell::Empty);
                }
                dest[col] = cell;
            }
        }

        debug!(table = %range.table, "memory store write");
        Ok(())
    }

    async fn append(&self, range: &str, rows: Vec<Row>) -> Result<()> {
        let range = parse_range(range)?;
        let mut tables = self.tables.write();
        let grid = tables
            .get_mut(&range.table)
            .ok_or_else(|| unknown_table(&range.table))?;
        grid.extend(rows);
        Ok(())
    }

    async fn delete_rows(&self, table: &str, indices: &[usize]) -> Result<()> {
        let mut tables = self.tables.write();
        let grid = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;

        for &index in indices {
            if index >= grid.len() {
                return Err(QuireError::Transport(format!(
                    "row {} out of range for table `{}` ({} rows)",
                    index,
                    table,
                    grid.len()
                )));
            }
            grid.remove(index);
        }
        Ok(())
    }
}
