//! Statement and transaction executors
//!
//! Two distinct execution paths over the same pool and bridge:
//! [`StatementExecutor`] for single auto-committed statements, and
//! [`TransactionExecutor`] for all-or-nothing batches on one connection.
//! They are separate types because their failure semantics differ: an
//! independent write is its own unit and rolls itself back, while a batch
//! failure must undo every prior statement in the batch.

mod error;
mod statement;
mod transaction;

pub use statement::StatementExecutor;
pub use transaction::TransactionExecutor;

pub(crate) use error::{map_query_error, read_row};
