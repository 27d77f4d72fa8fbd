//! # brain-db
//!
//! Database layer: a bounded SQLite connection pool, a bridge for running
//! blocking driver calls off the async runtime, and executors built on both.
//!
//! ## Overview
//!
//! This crate is the data-access core shared by the request-handling layer
//! and the background maintenance task. It handles:
//!
//! - Connection pool lifecycle (bounded, lazily populated, recycled)
//! - Shipping blocking driver calls to a dedicated worker pool
//! - Single-statement execution (auto-commit writes and dictionary-row reads)
//! - Atomic multi-statement transactions with per-statement outcomes
//! - The recurring retention sweep over the account table
//!
//! It is statement-agnostic: callers hand it ready-made SQL and parameters
//! and get rows or row counts back. It does not validate SQL, map objects,
//! or run migrations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brain_db::bridge::BlockingBridge;
//! use brain_db::executors::{StatementExecutor, TransactionExecutor};
//! use brain_db::maintenance::{MaintenanceScheduler, RetentionPolicy};
//! use brain_db::pool::{DatabaseConfig, SqlitePool};
//! use brain_db::Statement;
//!
//! async fn example() -> brain_db::DbResult<()> {
//!     let config = DatabaseConfig::from_env();
//!     let pool = SqlitePool::connect(&config)?;
//!     let bridge = BlockingBridge::new(config.worker_threads as usize)?;
//!
//!     let statements = StatementExecutor::new(pool.clone(), bridge.clone());
//!     let outcome = statements
//!         .execute_write(Statement::new("DELETE FROM chat_history WHERE user_id = ?1")
//!             .bind("some-uuid".to_string()))
//!         .await?;
//!     tracing::info!(rows = outcome.rows_affected, "history cleared");
//!
//!     let transactions = TransactionExecutor::new(pool.clone(), bridge.clone());
//!     let scheduler = MaintenanceScheduler::new(
//!         transactions,
//!         RetentionPolicy::default(),
//!         std::time::Duration::from_secs(3600),
//!     );
//!     tokio::spawn(scheduler.run());
//!
//!     pool.shutdown();
//!     bridge.shutdown();
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod error;
pub mod executors;
pub mod maintenance;
pub mod pool;
pub mod statement;

// Re-export commonly used types
pub use bridge::BlockingBridge;
pub use error::{DbError, DbResult};
pub use executors::{StatementExecutor, TransactionExecutor};
pub use maintenance::{MaintenanceScheduler, RetentionPolicy};
pub use pool::{DatabaseConfig, PooledConnection, SqlitePool};
pub use statement::{Row, Statement, StatementOutcome, Value, WriteOutcome};
