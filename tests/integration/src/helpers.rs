//! Test helpers for integration tests
//!
//! Provides a throwaway database wired to a real pool, bridge, and both
//! executors, exactly as the process entry point would assemble them.

use std::time::Duration;

use anyhow::Result;
use brain_db::bridge::BlockingBridge;
use brain_db::executors::{StatementExecutor, TransactionExecutor};
use brain_db::pool::{DatabaseConfig, SqlitePool};
use brain_db::{Statement, Value};
use tempfile::TempDir;

use crate::fixtures::SCHEMA;

/// Test database instance that manages lifecycle
///
/// The temp directory is removed when the instance drops, taking the
/// database file with it.
pub struct TestDb {
    pub pool: SqlitePool,
    pub bridge: BlockingBridge,
    pub statements: StatementExecutor,
    pub transactions: TransactionExecutor,
    _dir: TempDir,
}

impl TestDb {
    /// Create a test database with default sizing
    pub fn new() -> Result<Self> {
        Self::with_max_connections(5)
    }

    /// Create a test database with a specific pool bound
    pub fn with_max_connections(max_connections: u32) -> Result<Self> {
        Self::build(max_connections, Duration::from_secs(5))
    }

    /// Create a test database with a specific pool bound and acquire timeout
    pub fn with_acquire_timeout(max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        Self::build(max_connections, acquire_timeout)
    }

    fn build(max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        // Ok if another test already installed the subscriber
        let _ = brain_common::telemetry::try_init_tracing();

        let dir = tempfile::tempdir()?;
        let config = DatabaseConfig {
            path: dir.path().join("brain-test.db").to_string_lossy().into_owned(),
            max_connections,
            acquire_timeout,
            busy_timeout: Duration::from_secs(5),
            worker_threads: max_connections.max(2),
        };

        let pool = SqlitePool::connect(&config)?;
        let bridge = BlockingBridge::new(config.worker_threads as usize)?;
        let statements = StatementExecutor::new(pool.clone(), bridge.clone());
        let transactions = TransactionExecutor::new(pool.clone(), bridge.clone());

        // Schema setup is the request layer's job; tests stand in for it here
        let conn = pool.acquire()?;
        conn.execute_batch(SCHEMA)?;
        drop(conn);

        Ok(Self {
            pool,
            bridge,
            statements,
            transactions,
            _dir: dir,
        })
    }

    /// Seed one account row
    pub async fn seed(&self, statement: Statement) -> Result<()> {
        self.statements.execute_write(statement).await?;
        Ok(())
    }

    /// Run a `SELECT COUNT(*) AS n ...` query and return the count
    pub async fn count(&self, sql: &str) -> Result<i64> {
        let row = self
            .statements
            .fetch_optional(Statement::new(sql))
            .await?
            .ok_or_else(|| anyhow::anyhow!("count query returned no row"))?;
        match row.get("n") {
            Some(Value::Integer(n)) => Ok(*n),
            other => anyhow::bail!("count query returned unexpected value: {other:?}"),
        }
    }

    /// Fetch a single column of a single account row
    pub async fn account_field(&self, email: &str, column: &str) -> Result<Option<Value>> {
        let row = self
            .statements
            .fetch_optional(
                Statement::new(format!(
                    "SELECT {column} FROM chat_users WHERE email = ?1"
                ))
                .bind(email.to_string()),
            )
            .await?;
        Ok(row.and_then(|mut r| r.remove(column)))
    }
}
