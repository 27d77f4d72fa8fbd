//! Single-statement execution
//!
//! Each operation acquires a connection inside its bridge job, runs one
//! statement, and releases the connection on every exit path via the pool
//! guard. Writes auto-commit; the driver rolls back its own implicit unit on
//! failure, so no compensation is needed here.

use rusqlite::params_from_iter;
use tracing::instrument;

use crate::bridge::BlockingBridge;
use crate::error::DbResult;
use crate::pool::SqlitePool;
use crate::statement::{Row, Statement, WriteOutcome};

use super::{map_query_error, read_row};

/// Executes single parameterized statements against pooled connections
#[derive(Clone)]
pub struct StatementExecutor {
    pool: SqlitePool,
    bridge: BlockingBridge,
}

impl StatementExecutor {
    /// Create a new StatementExecutor
    pub fn new(pool: SqlitePool, bridge: BlockingBridge) -> Self {
        Self { pool, bridge }
    }

    /// Execute an INSERT/UPDATE/DELETE statement
    ///
    /// Returns the affected-row count and the rowid generated by the most
    /// recent INSERT on the connection used.
    #[instrument(skip(self))]
    pub async fn execute_write(&self, statement: Statement) -> DbResult<WriteOutcome> {
        let pool = self.pool.clone();
        self.bridge
            .run(move || {
                let conn = pool.acquire()?;
                let rows_affected = conn
                    .execute(statement.sql(), params_from_iter(statement.params()))
                    .map_err(map_query_error)? as u64;
                Ok(WriteOutcome {
                    rows_affected,
                    last_insert_rowid: conn.last_insert_rowid(),
                })
            })
            .await
    }

    /// Execute a SELECT and return the first matching row, if any
    ///
    /// A query matching nothing is `Ok(None)`, not an error.
    #[instrument(skip(self))]
    pub async fn fetch_optional(&self, statement: Statement) -> DbResult<Option<Row>> {
        let pool = self.pool.clone();
        self.bridge
            .run(move || {
                let conn = pool.acquire()?;
                let mut prepared = conn.prepare(statement.sql()).map_err(map_query_error)?;
                let columns: Vec<String> = prepared
                    .column_names()
                    .iter()
                    .map(|c| (*c).to_string())
                    .collect();

                let mut rows = prepared
                    .query(params_from_iter(statement.params()))
                    .map_err(map_query_error)?;
                match rows.next().map_err(map_query_error)? {
                    Some(row) => Ok(Some(read_row(&columns, row)?)),
                    None => Ok(None),
                }
            })
            .await
    }

    /// Execute a SELECT and return every matching row
    ///
    /// A query matching nothing is an empty vec, not an error.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, statement: Statement) -> DbResult<Vec<Row>> {
        let pool = self.pool.clone();
        self.bridge
            .run(move || {
                let conn = pool.acquire()?;
                let mut prepared = conn.prepare(statement.sql()).map_err(map_query_error)?;
                let columns: Vec<String> = prepared
                    .column_names()
                    .iter()
                    .map(|c| (*c).to_string())
                    .collect();

                let mut rows = prepared
                    .query(params_from_iter(statement.params()))
                    .map_err(map_query_error)?;
                let mut out = Vec::new();
                while let Some(row) = rows.next().map_err(map_query_error)? {
                    out.push(read_row(&columns, row)?);
                }
                Ok(out)
            })
            .await
    }
}
