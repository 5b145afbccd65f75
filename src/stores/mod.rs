//! Contains the trait and implementations for storing the positions of
//! [transactions](crate::transaction::Transaction).

mod transaction;

pub mod sqlite;
#[cfg(test)]
pub(crate) mod test_store;

pub use sqlite::SQLiteTransactionStore;
pub use transaction::{ColumnEntry, RankUpdate, TransactionPosition, TransactionStore};
