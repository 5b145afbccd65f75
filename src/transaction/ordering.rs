//! Moving and reordering transactions within and across columns.

use serde::Deserialize;

use crate::{
    Error,
    column::Column,
    database_id::{PlanId, TransactionId},
    rank::{RankKey, rank_between, rebalance_column},
    stores::TransactionStore,
    transaction::Transaction,
};

/// A request to move a transaction to a column, optionally between two of its
/// members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoveRequest {
    /// The transaction to move.
    pub transaction_id: TransactionId,
    /// The destination column, `null` for the unallocated pool.
    ///
    /// Must be present in the request body, even when it is `null`.
    #[serde(deserialize_with = "Column::deserialize")]
    pub to_column_id: Column,
    /// The member the transaction should end up directly before.
    #[serde(default)]
    pub before_transaction_id: Option<TransactionId>,
    /// The member the transaction should end up directly after.
    #[serde(default)]
    pub after_transaction_id: Option<TransactionId>,
}

/// A request to move a transaction within its current column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReorderRequest {
    /// The transaction to move.
    pub transaction_id: TransactionId,
    /// The member the transaction should end up directly before.
    #[serde(default)]
    pub before_transaction_id: Option<TransactionId>,
    /// The member the transaction should end up directly after.
    #[serde(default)]
    pub after_transaction_id: Option<TransactionId>,
}

/// Move a transaction to `request.to_column_id`.
///
/// Without neighbours the transaction is appended to the end of the
/// destination column. If no rank fits between the neighbours, the column is
/// rebalanced, the neighbours' ranks are read again and the allocation is
/// retried once.
///
/// The rank and column are written together in one store call, so a failed
/// move never leaves the transaction half moved. A rebalance that ran before
/// the failure is not undone.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction or a named neighbour does not exist,
/// - [Error::NeighbourNotInColumn] if a neighbour is not in the destination column,
/// - [Error::NoRankAvailable] if no rank fits even after rebalancing,
/// - or any error from the store.
pub fn move_transaction<S>(store: &mut S, request: MoveRequest) -> Result<Transaction, Error>
where
    S: TransactionStore + ?Sized,
{
    let moving = store.fetch_position(request.transaction_id)?;
    let column = request.to_column_id;

    let rank = allocate_rank(store, moving.plan_id, column, |store| {
        neighbour_ranks(store, moving.plan_id, column, &request)
    })?;

    tracing::debug!(
        "moving transaction {} from {:?} to {column:?} with rank {rank}",
        request.transaction_id,
        moving.column,
    );

    store.update_rank_and_column(request.transaction_id, rank, column)
}

/// Move a transaction within the column it is already in.
///
/// # Errors
/// See [move_transaction].
pub fn reorder_transaction<S>(store: &mut S, request: ReorderRequest) -> Result<Transaction, Error>
where
    S: TransactionStore + ?Sized,
{
    let current = store.fetch_position(request.transaction_id)?;

    move_transaction(
        store,
        MoveRequest {
            transaction_id: request.transaction_id,
            to_column_id: current.column,
            before_transaction_id: request.before_transaction_id,
            after_transaction_id: request.after_transaction_id,
        },
    )
}

/// Get a rank that places a new transaction at the end of a column.
///
/// # Errors
/// Returns [Error::NoRankAvailable] if the tail of the column has run out of
/// room even after rebalancing, or any error from the store.
pub fn tail_rank<S>(store: &mut S, plan_id: PlanId, column: Column) -> Result<RankKey, Error>
where
    S: TransactionStore + ?Sized,
{
    allocate_rank(store, plan_id, column, |store| {
        Ok((store.fetch_column_tail(plan_id, column)?, None))
    })
}

type NeighbourRanks = (Option<RankKey>, Option<RankKey>);

fn allocate_rank<S, F>(
    store: &mut S,
    plan_id: PlanId,
    column: Column,
    read_neighbours: F,
) -> Result<RankKey, Error>
where
    S: TransactionStore + ?Sized,
    F: Fn(&S) -> Result<NeighbourRanks, Error>,
{
    let (prev, next) = read_neighbours(&*store)?;

    match rank_between(prev, next) {
        Ok(rank) => Ok(rank),
        Err(needs_rebalance) => {
            tracing::debug!("{needs_rebalance}");
            rebalance_column(store, plan_id, column)?;

            let (prev, next) = read_neighbours(&*store)?;

            rank_between(prev, next).map_err(|still_full| {
                tracing::warn!("no rank available after rebalancing: {still_full}");
                Error::NoRankAvailable
            })
        }
    }
}

fn neighbour_ranks<S>(
    store: &S,
    plan_id: PlanId,
    column: Column,
    request: &MoveRequest,
) -> Result<NeighbourRanks, Error>
where
    S: TransactionStore + ?Sized,
{
    if request.before_transaction_id.is_none() && request.after_transaction_id.is_none() {
        return Ok((store.fetch_column_tail(plan_id, column)?, None));
    }

    let neighbour_rank = |id: Option<TransactionId>| -> Result<Option<RankKey>, Error> {
        let Some(id) = id else {
            return Ok(None);
        };

        let neighbour = store.fetch_position(id)?;

        if neighbour.plan_id != plan_id || neighbour.column != column {
            return Err(Error::NeighbourNotInColumn(id));
        }

        Ok(neighbour.rank)
    };

    let prev = neighbour_rank(request.after_transaction_id)?;
    let next = neighbour_rank(request.before_transaction_id)?;

    Ok((prev, next))
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        column::Column,
        rank::{RANK_STEP, RankKey},
        stores::{TransactionStore, test_store::FakeTransactionStore},
        transaction::{
            MoveRequest, ReorderRequest, move_transaction, reorder_transaction, tail_rank,
        },
    };

    const COLUMN_A: Column = Column::Category(1);
    const COLUMN_B: Column = Column::Category(2);

    fn rank(encoded: &str) -> Option<RankKey> {
        Some(encoded.parse().expect("test rank should parse"))
    }

    fn move_request(
        transaction_id: i64,
        to_column_id: Column,
        before: Option<i64>,
        after: Option<i64>,
    ) -> MoveRequest {
        MoveRequest {
            transaction_id,
            to_column_id,
            before_transaction_id: before,
            after_transaction_id: after,
        }
    }

    #[test]
    fn move_request_requires_destination_column() {
        let missing = serde_json::from_str::<MoveRequest>(r#"{"transactionId": 3}"#);
        let misnamed =
            serde_json::from_str::<MoveRequest>(r#"{"transactionId": 3, "toCategoryId": 7}"#);

        assert!(missing.is_err());
        assert!(misnamed.is_err());
    }

    #[test]
    fn move_request_null_column_is_unallocated() {
        let request =
            serde_json::from_str::<MoveRequest>(r#"{"transactionId": 3, "toColumnId": null}"#)
                .unwrap();

        assert_eq!(request, move_request(3, Column::Unallocated, None, None));
    }

    #[test]
    fn reorder_request_rejects_unknown_fields() {
        let result = serde_json::from_str::<ReorderRequest>(
            r#"{"transactionId": 3, "afterTransactionId": 1, "toColumnId": 2}"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn moves_between_neighbours() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_B, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_B, "000000000000002048", 1);
        store.insert(3, 1, COLUMN_A, "000000000000001024", 2);

        let moved = move_transaction(&mut store, move_request(3, COLUMN_B, Some(2), Some(1)))
            .expect("move should succeed");

        assert_eq!(moved.rank, rank("000000000000001536"));
        assert_eq!(moved.column, COLUMN_B);
        assert_eq!(store.column_of(3), Some(COLUMN_B));
    }

    #[test]
    fn moves_after_neighbour_at_tail() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_B, "000000000000005000", 0);
        store.insert(2, 1, COLUMN_A, "000000000000001024", 1);

        let moved =
            move_transaction(&mut store, move_request(2, COLUMN_B, None, Some(1))).unwrap();

        assert_eq!(moved.rank, rank("000000000000006024"));
        assert_eq!(moved.column, COLUMN_B);
    }

    #[test]
    fn moves_before_neighbour_at_head() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_B, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_A, "000000000000001024", 1);

        let moved =
            move_transaction(&mut store, move_request(2, COLUMN_B, Some(1), None)).unwrap();

        assert_eq!(moved.rank, rank("000000000000000512"));
    }

    #[test]
    fn move_without_neighbours_appends_to_destination() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_B, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_B, "000000000000009000", 1);
        store.insert(3, 1, COLUMN_A, "000000000000000001", 2);

        let moved = move_transaction(&mut store, move_request(3, COLUMN_B, None, None)).unwrap();

        assert_eq!(moved.rank, RankKey::new(9000 + RANK_STEP));
        let tail = store.fetch_column_tail(1, COLUMN_B).unwrap();
        assert_eq!(tail, moved.rank);
    }

    #[test]
    fn move_to_empty_column_uses_time_derived_rank() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_A, "000000000000001024", 0);

        let moved =
            move_transaction(&mut store, move_request(1, Column::Unallocated, None, None))
                .unwrap();

        let rank = moved.rank.expect("moved transaction should have a rank");
        assert!(rank.value() > 0);
        assert_eq!(moved.column, Column::Unallocated);
    }

    #[test]
    fn adjacent_neighbours_trigger_rebalance() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_B, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_B, "000000000000001025", 1);
        store.insert(3, 1, COLUMN_A, "000000000000001024", 2);

        let moved =
            move_transaction(&mut store, move_request(3, COLUMN_B, Some(2), Some(1))).unwrap();

        assert_eq!(store.rank_of(1), rank("000000000000001024"));
        assert_eq!(store.rank_of(2), rank("000000000000002048"));
        assert_eq!(moved.rank, rank("000000000000001536"));
        assert_eq!(store.rank_writes(), 2);
    }

    #[test]
    fn head_insert_before_rank_one_triggers_rebalance() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_B, "000000000000000001", 0);
        store.insert(2, 1, COLUMN_B, "000000000000000002", 1);
        store.insert(3, 1, COLUMN_A, "000000000000001024", 2);

        let moved =
            move_transaction(&mut store, move_request(3, COLUMN_B, Some(1), None)).unwrap();

        assert_eq!(store.rank_of(1), RankKey::new(RANK_STEP));
        assert_eq!(moved.rank, RankKey::new(RANK_STEP / 2));
    }

    #[test]
    fn reorder_within_column() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_A, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_A, "000000000000002048", 1);
        store.insert(3, 1, COLUMN_A, "000000000000003072", 2);

        let moved = reorder_transaction(
            &mut store,
            ReorderRequest {
                transaction_id: 3,
                before_transaction_id: Some(2),
                after_transaction_id: Some(1),
            },
        )
        .unwrap();

        assert_eq!(moved.column, COLUMN_A);
        assert_eq!(moved.rank, rank("000000000000001536"));
        let order: Vec<i64> = store
            .fetch_column_ordered(1, COLUMN_A)
            .unwrap()
            .iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(order, vec![1, 3, 2]);
    }

    #[test]
    fn reorder_in_place_still_writes_a_rank_between_neighbours() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_A, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_A, "000000000000002048", 1);
        store.insert(3, 1, COLUMN_A, "000000000000003072", 2);

        let moved = reorder_transaction(
            &mut store,
            ReorderRequest {
                transaction_id: 2,
                before_transaction_id: Some(3),
                after_transaction_id: Some(1),
            },
        )
        .unwrap();

        assert_eq!(moved.rank, rank("000000000000002048"));
    }

    #[test]
    fn deleted_neighbour_fails_without_changes() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_B, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_B, "000000000000002048", 1);
        store.insert(3, 1, COLUMN_A, "000000000000004096", 2);
        store.remove(2);

        let result = move_transaction(&mut store, move_request(3, COLUMN_B, Some(2), Some(1)));

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(store.column_of(3), Some(COLUMN_A));
        assert_eq!(store.rank_of(3), rank("000000000000004096"));
    }

    #[test]
    fn missing_transaction_fails() {
        let mut store = FakeTransactionStore::default();

        let result = move_transaction(&mut store, move_request(1, COLUMN_B, None, None));

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn neighbour_in_another_column_fails() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_A, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_A, "000000000000002048", 1);

        let result = move_transaction(&mut store, move_request(2, COLUMN_B, None, Some(1)));

        assert_eq!(result, Err(Error::NeighbourNotInColumn(1)));
        assert_eq!(store.column_of(2), Some(COLUMN_A));
    }

    #[test]
    fn swapped_neighbours_fail_after_one_rebalance() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_B, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_B, "000000000000002048", 1);
        store.insert(3, 1, COLUMN_A, "000000000000001024", 2);

        let result = move_transaction(&mut store, move_request(3, COLUMN_B, Some(1), Some(2)));

        assert_eq!(result, Err(Error::NoRankAvailable));
        assert_eq!(store.column_of(3), Some(COLUMN_A));
    }

    #[test]
    fn tail_rank_of_full_column_rebalances() {
        let mut store = FakeTransactionStore::default();
        store.insert(1, 1, COLUMN_A, "000000000000001024", 0);
        store.insert(2, 1, COLUMN_A, &RankKey::MAX.to_string(), 1);

        let got = tail_rank(&mut store, 1, COLUMN_A).unwrap();

        assert_eq!(store.rank_of(2), RankKey::new(2 * RANK_STEP));
        assert_eq!(got, RankKey::new(3 * RANK_STEP).unwrap());
    }

    #[test]
    fn move_request_deserializes_from_camel_case() {
        let json = r#"{"transactionId": 3, "toColumnId": null, "afterTransactionId": 1}"#;

        let request: MoveRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request, move_request(3, Column::Unallocated, None, Some(1)));
    }
}
