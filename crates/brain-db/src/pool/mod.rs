//! Connection pool management

mod sqlite;

pub use sqlite::{DatabaseConfig, PooledConnection, SqlitePool};
