//! Defines the transaction store trait used to keep columns ordered.

use std::cmp::Ordering;

use time::OffsetDateTime;

use crate::{
    Error,
    column::Column,
    database_id::{PlanId, TransactionId},
    rank::RankKey,
    transaction::Transaction,
};

/// Where a transaction currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionPosition {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The plan that owns the transaction and therefore its column.
    pub plan_id: PlanId,
    /// The column the transaction is in.
    pub column: Column,
    /// The stored rank, `None` if absent or malformed.
    pub rank: Option<RankKey>,
}

/// A column member as seen by the rebalancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnEntry {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The stored rank, `None` if absent or malformed.
    pub rank: Option<RankKey>,
    /// When the transaction was created, breaks ties between equal ranks.
    pub created_at: OffsetDateTime,
}

impl ColumnEntry {
    /// Compare two entries in column order: rank ascending with unranked
    /// entries last, then creation time, then ID.
    pub fn column_order(&self, other: &Self) -> Ordering {
        let rank_order = match (self.rank, other.rank) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        rank_order
            .then(self.created_at.cmp(&other.created_at))
            .then(self.id.cmp(&other.id))
    }
}

impl From<&Transaction> for ColumnEntry {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            rank: transaction.rank,
            created_at: transaction.created_at,
        }
    }
}

/// A new rank for a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankUpdate {
    /// The transaction to update.
    pub id: TransactionId,
    /// The rank to store.
    pub rank: RankKey,
}

/// Durable storage for the rank and column of transactions.
///
/// A column is scoped to a budget plan, every plan has its own unallocated
/// pool.
pub trait TransactionStore {
    /// Get the position of a transaction.
    ///
    /// # Errors
    /// Implementers should return [Error::NotFound] if `id` does not refer to
    /// a transaction.
    fn fetch_position(&self, id: TransactionId) -> Result<TransactionPosition, Error>;

    /// Get the largest valid rank in a column, `None` if the column has no
    /// ranked members.
    fn fetch_column_tail(&self, plan_id: PlanId, column: Column)
    -> Result<Option<RankKey>, Error>;

    /// Get every member of a column, sorted with [ColumnEntry::column_order].
    fn fetch_column_ordered(
        &self,
        plan_id: PlanId,
        column: Column,
    ) -> Result<Vec<ColumnEntry>, Error>;

    /// Set the rank and column of a transaction in a single write.
    ///
    /// # Errors
    /// Implementers should return [Error::NotFound] if the transaction no
    /// longer exists.
    fn update_rank_and_column(
        &mut self,
        id: TransactionId,
        rank: RankKey,
        column: Column,
    ) -> Result<Transaction, Error>;

    /// Set the rank of a transaction without changing its column.
    fn update_rank(&mut self, id: TransactionId, rank: RankKey) -> Result<(), Error>;

    /// Write many ranks.
    ///
    /// The default writes one row at a time and stops at the first failure,
    /// leaving earlier rows updated. Stores that support multi-row
    /// transactions should override this to apply the batch atomically.
    fn update_ranks(&mut self, updates: &[RankUpdate]) -> Result<(), Error> {
        for update in updates {
            self.update_rank(update.id, update.rank)?;
        }

        Ok(())
    }
}
