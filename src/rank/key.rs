//! The sort key used to order transactions within a column.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// The number of decimal digits in an encoded [RankKey].
pub const RANK_WIDTH: usize = 18;

/// A totally ordered, densely insertable sort key.
///
/// Keys are stored as zero-padded decimal strings of exactly [RANK_WIDTH]
/// digits so that the database's string ordering agrees with the numeric
/// ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RankKey(u64);

impl RankKey {
    /// The largest key that fits in [RANK_WIDTH] digits.
    pub const MAX: RankKey = RankKey(999_999_999_999_999_999);

    /// Create a key from its numeric value.
    ///
    /// Returns `None` if `value` does not fit in [RANK_WIDTH] digits.
    pub fn new(value: u64) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The numeric value of the key.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Decode a stored rank.
    ///
    /// Absent and malformed ranks both decode to `None`, malformed ones are
    /// logged.
    pub fn decode(stored: Option<&str>) -> Option<Self> {
        let stored = stored?;

        match stored.parse() {
            Ok(key) => Some(key),
            Err(error) => {
                tracing::warn!("ignoring stored rank: {error}");
                None
            }
        }
    }
}

impl Display for RankKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0width$}", self.0, width = RANK_WIDTH)
    }
}

impl FromStr for RankKey {
    type Err = Error;

    /// Parse an encoded rank, which must be exactly [RANK_WIDTH] ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [Error::MalformedRank] for any other input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != RANK_WIDTH || !s.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(Error::MalformedRank(s.to_owned()));
        }

        s.parse::<u64>()
            .map(RankKey)
            .map_err(|_| Error::MalformedRank(s.to_owned()))
    }
}

impl Serialize for RankKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RankKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        raw.parse().map_err(serde::de::Error::custom)
    }
}
