//! Store implementations backed by SQLite.

mod transaction;

pub use transaction::SQLiteTransactionStore;
