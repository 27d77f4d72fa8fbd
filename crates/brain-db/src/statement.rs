//! Parameterized statements and result shapes
//!
//! A [`Statement`] is immutable once built: SQL text plus an ordered list of
//! owned parameter values. Reads produce dictionary-shaped [`Row`]s (column
//! name to value), writes produce a [`WriteOutcome`], and committed
//! transaction batches produce one [`StatementOutcome`] per statement.

use std::collections::HashMap;

pub use rusqlite::types::Value;

/// One result row: column name → value
pub type Row = HashMap<String, Value>;

/// One parameterized SQL statement
#[derive(Debug, Clone)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    /// Create a statement with no parameters
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append a positional parameter, matching the next `?N` placeholder
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// The SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameters, in placeholder order
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Result of a single auto-committed write statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Rows inserted, updated, or deleted
    pub rows_affected: u64,
    /// Rowid generated by the most recent INSERT on this connection
    pub last_insert_rowid: i64,
}

/// Per-statement result of a committed transaction batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementOutcome {
    /// Position of the statement in the submitted batch
    pub index: usize,
    /// Rows affected by that statement
    pub rows_affected: u64,
}
