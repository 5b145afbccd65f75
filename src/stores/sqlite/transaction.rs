//! Implements a SQLite backed transaction store.
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{
    Error,
    app_state::lock_connection,
    category::category_in_plan,
    column::Column,
    database_id::{PlanId, TransactionId},
    rank::RankKey,
    stores::{ColumnEntry, RankUpdate, TransactionPosition, TransactionStore},
    transaction::{TRANSACTION_COLUMNS, Transaction, get_transaction, map_transaction_row},
};

/// Stores the positions of transactions in a SQLite database.
///
/// The connection is locked once per store call and never held between calls.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        lock_connection(&self.connection)
    }
}

/// Matches the rows of one column, `?1` is the plan ID and `?2` the category
/// ID or NULL for the unallocated pool.
const COLUMN_FILTER: &str = "plan_id = ?1 AND category_id IS ?2";

impl TransactionStore for SQLiteTransactionStore {
    /// Get the position of a transaction.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] there is some other SQL error.
    fn fetch_position(&self, id: TransactionId) -> Result<TransactionPosition, Error> {
        let connection = self.lock()?;

        let position = connection
            .prepare("SELECT id, plan_id, category_id, sort_rank FROM \"transaction\" WHERE id = :id")?
            .query_row(&[(":id", &id)], map_position_row)?;

        Ok(position)
    }

    /// Get the largest valid rank in a column.
    ///
    /// Malformed ranks are skipped. Valid ranks all have the same width, so
    /// the first valid rank in descending string order is the largest.
    fn fetch_column_tail(
        &self,
        plan_id: PlanId,
        column: Column,
    ) -> Result<Option<RankKey>, Error> {
        let connection = self.lock()?;

        let mut statement = connection.prepare(&format!(
            "SELECT sort_rank FROM \"transaction\"
             WHERE {COLUMN_FILTER} AND sort_rank IS NOT NULL
             ORDER BY sort_rank DESC"
        ))?;
        let mut rows = statement.query(params![plan_id, column.category_id()])?;

        while let Some(row) = rows.next()? {
            let raw_rank: String = row.get(0)?;

            if let Some(rank) = RankKey::decode(Some(&raw_rank)) {
                return Ok(Some(rank));
            }
        }

        Ok(None)
    }

    /// Get every member of a column in column order.
    fn fetch_column_ordered(
        &self,
        plan_id: PlanId,
        column: Column,
    ) -> Result<Vec<ColumnEntry>, Error> {
        let connection = self.lock()?;

        let mut entries = connection
            .prepare(&format!(
                "SELECT id, sort_rank, created_at FROM \"transaction\" WHERE {COLUMN_FILTER}"
            ))?
            .query_map(params![plan_id, column.category_id()], map_entry_row)?
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by(ColumnEntry::column_order);

        Ok(entries)
    }

    /// Set the rank and column of a transaction with a single `UPDATE`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if the transaction no longer exists,
    /// - [Error::InvalidCategory] if the category is not in the transaction's plan,
    /// - or [Error::SqlError] there is some other SQL error.
    fn update_rank_and_column(
        &mut self,
        id: TransactionId,
        rank: RankKey,
        column: Column,
    ) -> Result<Transaction, Error> {
        let connection = self.lock()?;

        let updated = connection
            .prepare(&format!(
                "UPDATE \"transaction\" SET sort_rank = ?1, category_id = ?2
                 WHERE id = ?3 AND (
                    ?2 IS NULL
                    OR EXISTS (
                        SELECT 1 FROM category
                        WHERE category.id = ?2 AND category.plan_id = \"transaction\".plan_id
                    )
                 )
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                params![rank.to_string(), column.category_id(), id],
                map_transaction_row,
            )
            .optional()?;

        match (updated, column) {
            (Some(transaction), _) => Ok(transaction),
            (None, Column::Category(category_id)) => {
                // Tell a vanished transaction apart from a category that is
                // not in its plan.
                let transaction = get_transaction(id, &connection)?;

                if category_in_plan(category_id, transaction.plan_id, &connection)? {
                    Err(Error::NotFound)
                } else {
                    Err(Error::InvalidCategory(category_id))
                }
            }
            (None, Column::Unallocated) => Err(Error::NotFound),
        }
    }

    /// Set the rank of a transaction.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the transaction no longer exists.
    fn update_rank(&mut self, id: TransactionId, rank: RankKey) -> Result<(), Error> {
        let connection = self.lock()?;

        let rows_affected = connection.execute(
            "UPDATE \"transaction\" SET sort_rank = ?1 WHERE id = ?2",
            params![rank.to_string(), id],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Write many ranks inside one SQLite transaction.
    ///
    /// Rows deleted since the column was read are skipped.
    fn update_ranks(&mut self, updates: &[RankUpdate]) -> Result<(), Error> {
        let connection = self.lock()?;

        let tx = connection.unchecked_transaction()?;
        let mut statement =
            tx.prepare("UPDATE \"transaction\" SET sort_rank = ?1 WHERE id = ?2")?;

        for update in updates {
            statement.execute(params![update.rank.to_string(), update.id])?;
        }

        drop(statement);

        tx.commit()?;
        Ok(())
    }
}

fn map_position_row(row: &Row) -> Result<TransactionPosition, rusqlite::Error> {
    let id = row.get(0)?;
    let plan_id = row.get(1)?;
    let category_id: Option<i64> = row.get(2)?;
    let raw_rank: Option<String> = row.get(3)?;

    Ok(TransactionPosition {
        id,
        plan_id,
        column: Column::from(category_id),
        rank: RankKey::decode(raw_rank.as_deref()),
    })
}

fn map_entry_row(row: &Row) -> Result<ColumnEntry, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_rank: Option<String> = row.get(1)?;
    let created_at = row.get(2)?;

    Ok(ColumnEntry {
        id,
        rank: RankKey::decode(raw_rank.as_deref()),
        created_at,
    })
}
