//! Fractional ranking of transactions within a column.
//!
//! Each transaction carries a [RankKey]. Moving a transaction only rewrites its
//! own key, chosen between the keys of its new neighbours with
//! [rank_between]. When two neighbours are adjacent, [rebalance_column]
//! respaces the whole column so that future insertions have room again.

mod allocator;
mod key;
mod rebalance;

pub use allocator::{NeedsRebalance, RANK_STEP, rank_between, rank_between_at};
pub use key::{RANK_WIDTH, RankKey};
pub use rebalance::rebalance_column;
