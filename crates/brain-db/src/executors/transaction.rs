//! Atomic batch execution
//!
//! A batch runs on one connection inside an explicit transaction: every
//! statement applies in order, and the connection commits exactly once at
//! the end. Any statement failure rolls the whole batch back and reports the
//! failing index. This is what independent auto-committed writes cannot
//! express: "all of these changes happen together or none do".

use rusqlite::params_from_iter;
use tracing::instrument;

use crate::bridge::BlockingBridge;
use crate::error::{DbError, DbResult};
use crate::pool::SqlitePool;
use crate::statement::{Statement, StatementOutcome};

/// Executes ordered statement batches with all-or-nothing semantics
#[derive(Clone)]
pub struct TransactionExecutor {
    pool: SqlitePool,
    bridge: BlockingBridge,
}

impl TransactionExecutor {
    /// Create a new TransactionExecutor
    pub fn new(pool: SqlitePool, bridge: BlockingBridge) -> Self {
        Self { pool, bridge }
    }

    /// Apply every statement in order on one connection, committing only if
    /// all of them succeed
    ///
    /// Returns one [`StatementOutcome`] per statement, in input order. On any
    /// failure the transaction is rolled back and the error carries the index
    /// of the failing statement. An empty batch is a successful no-op and
    /// never touches the pool.
    ///
    /// Batches are write statements; a row-returning statement is rejected by
    /// the driver and aborts the batch like any other statement failure.
    #[instrument(skip(self, statements), fields(statements = statements.len()))]
    pub async fn run(&self, statements: Vec<Statement>) -> DbResult<Vec<StatementOutcome>> {
        if statements.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.pool.clone();
        self.bridge
            .run(move || {
                let mut conn = pool.acquire()?;
                let tx = conn
                    .transaction()
                    .map_err(|e| DbError::Connection(e.to_string()))?;

                let mut outcomes = Vec::with_capacity(statements.len());
                for (index, statement) in statements.iter().enumerate() {
                    match tx.execute(statement.sql(), params_from_iter(statement.params())) {
                        Ok(rows_affected) => outcomes.push(StatementOutcome {
                            index,
                            rows_affected: rows_affected as u64,
                        }),
                        Err(e) => {
                            let message = e.to_string();
                            if tx.rollback().is_err() {
                                // Connection state is unknown after a failed
                                // rollback; do not re-pool it.
                                conn.invalidate();
                            }
                            return Err(DbError::Transaction { index, message });
                        }
                    }
                }

                tx.commit().map_err(|e| DbError::Transaction {
                    index: statements.len(),
                    message: e.to_string(),
                })?;

                Ok(outcomes)
            })
            .await
    }
}
