//! Calendar-day arithmetic in a fixed local offset.
//!
//! Streaks and distinct-day counts are defined on midnight-to-midnight local
//! days, never on rolling 24-hour spans.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Local calendar date of `at` in `offset`.
#[must_use]
pub fn local_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// `yyyy-MM-dd` bucket key of `at` in `offset`.
#[must_use]
pub fn day_key(at: DateTime<Utc>, offset: FixedOffset) -> String {
    local_day(at, offset).format("%Y-%m-%d").to_string()
}

/// Whole calendar days from `earlier` to `later`.
///
/// 23:59 and 00:01 the next morning are one day apart; 00:01 and 23:59 the
/// same day are zero. Negative when `earlier` is on a later local day.
#[must_use]
pub fn calendar_day_delta(
    later: DateTime<Utc>,
    earlier: DateTime<Utc>,
    offset: FixedOffset,
) -> i64 {
    (local_day(later, offset) - local_day(earlier, offset)).num_days()
}

/// Number of distinct local calendar days among `timestamps`.
pub fn distinct_days<I>(timestamps: I, offset: FixedOffset) -> usize
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    timestamps
        .into_iter()
        .map(|at| local_day(at, offset))
        .collect::<BTreeSet<_>>()
        .len()
}
