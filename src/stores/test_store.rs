#![allow(missing_docs)]

//! An in-memory [TransactionStore] for exercising the ranking logic without a
//! database.

use time::{Duration, OffsetDateTime, macros::datetime};

use crate::{
    Error,
    column::Column,
    database_id::{PlanId, TransactionId},
    rank::RankKey,
    stores::{ColumnEntry, TransactionPosition, TransactionStore},
    transaction::Transaction,
};

#[derive(Debug, Clone)]
struct FakeRow {
    id: TransactionId,
    plan_id: PlanId,
    column: Column,
    raw_rank: String,
    created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct FakeTransactionStore {
    rows: Vec<FakeRow>,
    rank_writes: usize,
}

impl FakeTransactionStore {
    /// Add a row created `minutes` after a fixed epoch.
    pub(crate) fn insert(
        &mut self,
        id: TransactionId,
        plan_id: PlanId,
        column: Column,
        raw_rank: &str,
        minutes: i64,
    ) {
        self.rows.push(FakeRow {
            id,
            plan_id,
            column,
            raw_rank: raw_rank.to_owned(),
            created_at: datetime!(2025-01-01 0:00 UTC) + Duration::minutes(minutes),
        });
    }

    pub(crate) fn remove(&mut self, id: TransactionId) {
        self.rows.retain(|row| row.id != id);
    }

    pub(crate) fn rank_of(&self, id: TransactionId) -> Option<RankKey> {
        self.row(id)
            .and_then(|row| RankKey::decode(Some(&row.raw_rank)))
    }

    pub(crate) fn column_of(&self, id: TransactionId) -> Option<Column> {
        self.row(id).map(|row| row.column)
    }

    pub(crate) fn rank_writes(&self) -> usize {
        self.rank_writes
    }

    fn row(&self, id: TransactionId) -> Option<&FakeRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    fn row_mut(&mut self, id: TransactionId) -> Result<&mut FakeRow, Error> {
        self.rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(Error::NotFound)
    }

    fn entry(row: &FakeRow) -> ColumnEntry {
        ColumnEntry {
            id: row.id,
            rank: RankKey::decode(Some(&row.raw_rank)),
            created_at: row.created_at,
        }
    }
}

impl TransactionStore for FakeTransactionStore {
    fn fetch_position(&self, id: TransactionId) -> Result<TransactionPosition, Error> {
        let row = self.row(id).ok_or(Error::NotFound)?;

        Ok(TransactionPosition {
            id: row.id,
            plan_id: row.plan_id,
            column: row.column,
            rank: RankKey::decode(Some(&row.raw_rank)),
        })
    }

    fn fetch_column_tail(
        &self,
        plan_id: PlanId,
        column: Column,
    ) -> Result<Option<RankKey>, Error> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.plan_id == plan_id && row.column == column)
            .filter_map(|row| RankKey::decode(Some(&row.raw_rank)))
            .max())
    }

    fn fetch_column_ordered(
        &self,
        plan_id: PlanId,
        column: Column,
    ) -> Result<Vec<ColumnEntry>, Error> {
        let mut entries: Vec<ColumnEntry> = self
            .rows
            .iter()
            .filter(|row| row.plan_id == plan_id && row.column == column)
            .map(Self::entry)
            .collect();
        entries.sort_by(ColumnEntry::column_order);

        Ok(entries)
    }

    fn update_rank_and_column(
        &mut self,
        id: TransactionId,
        rank: RankKey,
        column: Column,
    ) -> Result<Transaction, Error> {
        let row = self.row_mut(id)?;
        row.raw_rank = rank.to_string();
        row.column = column;

        Ok(Transaction {
            id: row.id,
            plan_id: row.plan_id,
            column: row.column,
            amount: 0.0,
            name: String::new(),
            is_spent: false,
            spent_at: None,
            rank: Some(rank),
            created_at: row.created_at,
            source_currency: None,
            source_amount: None,
            fx_rate: None,
        })
    }

    fn update_rank(&mut self, id: TransactionId, rank: RankKey) -> Result<(), Error> {
        self.row_mut(id)?.raw_rank = rank.to_string();
        self.rank_writes += 1;

        Ok(())
    }
}
