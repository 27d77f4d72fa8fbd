//! Error mapping and row plumbing shared by the executors

use rusqlite::types::Value;
use rusqlite::Error as SqliteError;

use crate::error::{DbError, DbResult};
use crate::statement::Row;

/// Convert a driver error on a single statement to a `DbError`
pub(crate) fn map_query_error(e: SqliteError) -> DbError {
    DbError::Query(e.to_string())
}

/// Materialize one driver row into a dictionary row
pub(crate) fn read_row(columns: &[String], row: &rusqlite::Row<'_>) -> DbResult<Row> {
    let mut out = Row::with_capacity(columns.len());
    for (index, name) in columns.iter().enumerate() {
        let value: Value = row.get(index).map_err(map_query_error)?;
        out.insert(name.clone(), value);
    }
    Ok(out)
}
