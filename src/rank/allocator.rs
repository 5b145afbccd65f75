//! Computes new rank keys between existing neighbours.

use time::OffsetDateTime;

use crate::rank::RankKey;

/// The gap left after the tail of a column, and between neighbours after a
/// rebalance.
pub const RANK_STEP: u64 = 1024;

/// Signals that no key fits strictly between the requested neighbours.
///
/// The caller should rebalance the column, re-read the neighbours' ranks and
/// try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no rank fits between {prev:?} and {next:?}, the column needs rebalancing")]
pub struct NeedsRebalance {
    /// The rank of the item that should come before the new key.
    pub prev: Option<RankKey>,
    /// The rank of the item that should come after the new key.
    pub next: Option<RankKey>,
}

/// Compute a key that sorts strictly between `prev` and `next`.
///
/// An absent neighbour means the key goes at that open end of the column. When
/// the column is empty the key is derived from the current time.
///
/// # Errors
///
/// Returns [NeedsRebalance] when no key fits, i.e. when:
/// - both neighbours are present and `next - prev <= 1`,
/// - only `next` is present and `next <= 1`,
/// - or only `prev` is present and `prev + RANK_STEP` does not fit in a [RankKey].
pub fn rank_between(
    prev: Option<RankKey>,
    next: Option<RankKey>,
) -> Result<RankKey, NeedsRebalance> {
    rank_between_at(prev, next, OffsetDateTime::now_utc())
}

/// [rank_between] with an explicit clock for the empty column case.
pub fn rank_between_at(
    prev: Option<RankKey>,
    next: Option<RankKey>,
    now: OffsetDateTime,
) -> Result<RankKey, NeedsRebalance> {
    let needs_rebalance = NeedsRebalance { prev, next };

    let rank = match (prev, next) {
        (Some(prev), Some(next)) => {
            let (low, high) = (prev.value(), next.value());

            if high <= low || high - low <= 1 {
                return Err(needs_rebalance);
            }

            RankKey::new(low + (high - low) / 2)
        }
        (Some(prev), None) => prev
            .value()
            .checked_add(RANK_STEP)
            .and_then(RankKey::new),
        (None, Some(next)) if next.value() > 1 => RankKey::new(next.value() / 2),
        (None, Some(_)) => None,
        (None, None) => Some(time_derived_rank(now)),
    };

    rank.ok_or(needs_rebalance)
}

/// A key for the first item in an empty column: microseconds since the Unix
/// epoch.
fn time_derived_rank(now: OffsetDateTime) -> RankKey {
    let micros = (now.unix_timestamp_nanos() / 1_000).max(1);
    let micros = u64::try_from(micros).unwrap_or(RankKey::MAX.value());

    RankKey::new(micros).unwrap_or(RankKey::MAX)
}
