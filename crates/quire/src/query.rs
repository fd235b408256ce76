//! Query builder and the in-memory row pipeline.
//!
//! A query fetches the whole table once, then runs
//! `filter -> sort -> limit` over the data rows before decoding them.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::cell::{Cell, Grid, Row};
use crate::codec;
use crate::filter::{matches_all, Filter, Operator};
use crate::table::Table;
use quire_common::Result;

/// Sort direction recorded by [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// Rows that survived the pipeline, still untyped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    pub header: Row,
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Decodes every row into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(self.rows.len());
        codec::decode_many(&self.rows, &self.header, &mut out)?;
        Ok(out)
    }
}

/// Query builder for reading records from a [`Table`].
///
/// ```ignore
/// let adults: Vec<User> = db
///     .table("Users")
///     .query()
///     .where_clause("Age", ">=", 18)
///     .limit(10)
///     .all()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    table: Table,
    filters: Vec<Filter>,
    limit: i64,
    order_by: Option<(String, OrderDirection)>,
}

impl Query {
    pub(crate) fn new(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            limit: 0,
            order_by: None,
        }
    }

    /// Adds a condition. Conditions are ANDed.
    pub fn where_clause(
        mut self,
        column: impl Into<String>,
        operator: impl Into<Operator>,
        value: impl Into<Cell>,
    ) -> Self {
        self.filters.push(Filter::new(column, operator, value));
        self
    }

    /// Adds a prebuilt filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Caps the number of results. Zero or negative means no cap.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = n;
        self
    }

    /// Records a sort column.
    ///
    /// Rows currently come back in sheet order regardless of this setting.
    pub fn order_by(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by = Some((column.into(), direction));
        self
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn get_limit(&self) -> i64 {
        self.limit
    }

    pub fn get_order_by(&self) -> Option<(&str, OrderDirection)> {
        self.order_by
            .as_ref()
            .map(|(column, direction)| (column.as_str(), *direction))
    }

    /// Fetches the table and runs filter, sort and limit.
    #[instrument(skip(self), fields(table = %self.table.name()))]
    pub async fn fetch_rows(&self) -> Result<RowSet> {
        let grid = self.table.read_grid().await?;
        Ok(self.run(grid))
    }

    fn run(&self, mut grid: Grid) -> RowSet {
        if grid.len() < 2 {
            debug!(rows = grid.len(), "no data rows");
            return RowSet {
                header: grid.into_iter().next().unwrap_or_default(),
                rows: Vec::new(),
            };
        }

        let rows = grid.split_off(1);
        let header = grid.into_iter().next().unwrap_or_default();
        let fetched = rows.len();

        let rows = apply_filters(rows, &header, &self.filters);
        let filtered = rows.len();
        let rows = match &self.order_by {
            Some((column, direction)) => apply_sort(rows, &header, column, *direction),
            None => rows,
        };
        let rows = apply_limit(rows, self.limit);

        debug!(fetched, filtered, returned = rows.len(), "query pipeline");
        RowSet { header, rows }
    }

    /// Runs the query and appends the decoded records to `dest`.
    pub async fn get<T: DeserializeOwned>(&self, dest: &mut Vec<T>) -> Result<()> {
        let set = self.fetch_rows().await?;
        codec::decode_many(&set.rows, &set.header, dest)
    }

    /// Runs the query and returns the decoded records.
    pub async fn all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        self.get(&mut out).await?;
        Ok(out)
    }

    /// First matching record, if any.
    pub async fn first<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let set = self.fetch_rows().await?;
        match set.rows.first() {
            Some(row) => codec::decode_one(row, &set.header).map(Some),
            None => Ok(None),
        }
    }

    /// Number of rows the query yields, without decoding them.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.fetch_rows().await?.len())
    }
}

/// Keeps the rows that satisfy every filter, in order.
pub fn apply_filters(rows: Vec<Row>, header: &[Cell], filters: &[Filter]) -> Vec<Row> {
    if filters.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| matches_all(filters, row, header))
        .collect()
}

/// Sort stage. Leaves the rows in their filtered order.
pub fn apply_sort(
    rows: Vec<Row>,
    _header: &[Cell],
    column: &str,
    direction: OrderDirection,
) -> Vec<Row> {
    debug!(column, ?direction, "order_by is not applied");
    rows
}

/// Truncates to the first `limit` rows when `limit > 0`.
pub fn apply_limit(mut rows: Vec<Row>, limit: i64) -> Vec<Row> {
    if limit > 0 {
        if let Ok(limit) = usize::try_from(limit) {
            rows.truncate(limit);
        }
    }
    rows
}
