//! Recording `GridStore` used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use quire::{Cell, Grid, GridStore, QuireError, Result, Row};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Read(String),
    Write(String, Vec<Row>),
    Append(String, Vec<Row>),
    DeleteRows(String, Vec<usize>),
}

/// Serves a fixed grid and records every call made against it.
#[derive(Default)]
pub struct RecordingStore {
    grid: Grid,
    calls: Mutex<Vec<Call>>,
    fail_reads: bool,
    /// Writes succeed this many times, then fail
    writes_before_failure: Option<usize>,
    fail_deletes: bool,
    delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes_after(mut self, successes: usize) -> Self {
        self.writes_before_failure = Some(successes);
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn writes(&self) -> Vec<(String, Vec<Row>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Write(range, rows) => Some((range, rows)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<(String, Vec<usize>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeleteRows(table, indices) => Some((table, indices)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock();
        calls.push(call);
        calls.len()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GridStore for RecordingStore {
    async fn read(&self, range: &str) -> Result<Grid> {
        self.record(Call::Read(range.to_string()));
        self.pause().await;
        if self.fail_reads {
            return Err(QuireError::Transport("read refused".to_string()));
        }
        Ok(self.grid.clone())
    }

    async fn write(&self, range: &str, rows: Vec<Row>) -> Result<()> {
        self.record(Call::Write(range.to_string(), rows));
        self.pause().await;
        if let Some(limit) = self.writes_before_failure {
            if self.writes().len() > limit {
                return Err(QuireError::Transport("write refused".to_string()));
            }
        }
        Ok(())
    }

    async fn append(&self, range: &str, rows: Vec<Row>) -> Result<()> {
        self.record(Call::Append(range.to_string(), rows));
        self.pause().await;
        Ok(())
    }

    async fn delete_rows(&self, table: &str, indices: &[usize]) -> Result<()> {
        self.record(Call::DeleteRows(table.to_string(), indices.to_vec()));
        self.pause().await;
        if self.fail_deletes {
            return Err(QuireError::Transport("delete refused".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: i64,
}

impl User {
    pub fn new(id: i64, name: &str, age: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            age,
        }
    }
}

/// `[["ID","Name","Age"],[1,"Alice",30],[2,"Bob",25],[3,"Charlie",35]]`
pub fn users_grid() -> Grid {
    vec![
        vec![Cell::text("ID"), Cell::text("Name"), Cell::text("Age")],
        vec![Cell::Number(1.0), Cell::text("Alice"), Cell::Number(30.0)],
        vec![Cell::Number(2.0), Cell::text("Bob"), Cell::Number(25.0)],
        vec![Cell::Number(3.0), Cell::text("Charlie"), Cell::Number(35.0)],
    ]
}

pub fn header_only() -> Grid {
    vec![vec![Cell::text("ID"), Cell::text("Name"), Cell::text("Age")]]
}
