//! Consecutive-login streak transitions.
//!
//! Pure state machine; reading and writing the aggregate happens in the
//! engine. The delta is measured in local calendar days:
//!
//! | delta | effect |
//! |-------|--------|
//! | no prior login | streak = [`STREAK_BASE`], both timestamps = now |
//! | `<= 0` | only `current_login_at` moves |
//! | `1` | streak + 1, both timestamps = now |
//! | `>= 2` | streak = [`STREAK_BASE`], both timestamps = now |

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::aggregate::{AggregatePatch, UserAggregate};
use crate::calendar::calendar_day_delta;

/// Streak value after a first login or a broken streak. Today's login counts.
pub const STREAK_BASE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreakUpdate {
    Started,
    SameDay,
    Extended,
    Reset { previous: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTransition {
    pub update: StreakUpdate,
    pub consecutive_login_days: i32,
    pub patch: AggregatePatch,
}

/// Compute the login transition for a user whose current aggregate is
/// `previous` (`None` when the user has no aggregate yet).
#[must_use]
pub fn next_login(
    previous: Option<&UserAggregate>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> LoginTransition {
    let Some((last_login_at, days)) =
        previous.and_then(|agg| agg.last_login_at.map(|at| (at, agg.consecutive_login_days)))
    else {
        return restart(StreakUpdate::Started, now);
    };

    match calendar_day_delta(now, last_login_at, offset) {
        // A last login on a later day than now is clock skew; treat it like
        // a same-day login rather than touching the streak.
        delta if delta <= 0 => LoginTransition {
            update: StreakUpdate::SameDay,
            consecutive_login_days: days,
            patch: AggregatePatch {
                current_login_at: Some(now),
                ..AggregatePatch::default()
            },
        },
        1 => {
            let extended = days.saturating_add(1);
            LoginTransition {
                update: StreakUpdate::Extended,
                consecutive_login_days: extended,
                patch: AggregatePatch {
                    consecutive_login_days: Some(extended),
                    last_login_at: Some(now),
                    current_login_at: Some(now),
                    ..AggregatePatch::default()
                },
            }
        }
        _ => restart(StreakUpdate::Reset { previous: days }, now),
    }
}

fn restart(update: StreakUpdate, now: DateTime<Utc>) -> LoginTransition {
    LoginTransition {
        update,
        consecutive_login_days: STREAK_BASE,
        patch: AggregatePatch {
            consecutive_login_days: Some(STREAK_BASE),
            last_login_at: Some(now),
            current_login_at: Some(now),
            ..AggregatePatch::default()
        },
    }
}
