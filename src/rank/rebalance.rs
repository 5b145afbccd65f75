//! Restores insertion headroom by respacing the ranks of a column.

use crate::{
    Error,
    column::Column,
    database_id::PlanId,
    rank::{RANK_STEP, RankKey},
    stores::{RankUpdate, TransactionStore},
};

/// Reassign evenly spaced ranks to every member of a column.
///
/// The i-th member (counting from 1) in current column order gets the rank
/// `i * RANK_STEP`. Columns with fewer than two members are left untouched.
///
/// The target order is always derived from a fresh read, so concurrent or
/// repeated rebalances of the same column converge on the same ranks.
///
/// Returns the number of transactions that were given a new rank.
///
/// # Errors
/// Returns an error if the store fails to read the column or write a rank.
/// Rows written before the failure keep their new rank unless the store
/// applies [TransactionStore::update_ranks] atomically.
pub fn rebalance_column<S>(store: &mut S, plan_id: PlanId, column: Column) -> Result<usize, Error>
where
    S: TransactionStore + ?Sized,
{
    let entries = store.fetch_column_ordered(plan_id, column)?;

    if entries.len() < 2 {
        return Ok(0);
    }

    let updates = entries
        .iter()
        .zip(1u64..)
        .map(|(entry, position)| {
            position
                .checked_mul(RANK_STEP)
                .and_then(RankKey::new)
                .map(|rank| RankUpdate { id: entry.id, rank })
                .ok_or(Error::NoRankAvailable)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    tracing::debug!(
        "rebalancing {} transactions in plan {plan_id}, column {column:?}",
        updates.len()
    );
    store.update_ranks(&updates)?;

    Ok(updates.len())
}
