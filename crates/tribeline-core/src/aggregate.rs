//! The per-user aggregate record and the partial updates applied to it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Tribe every user starts in until they pick one.
pub const DEFAULT_TRIBE: &str = "rookie";

/// Counters, profile flags and login bookkeeping for one user.
///
/// Most challenge predicates read nothing but this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAggregate {
    pub user_id: UserId,
    pub likes_given: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub consecutive_login_days: i32,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub tribe: String,
    pub tribe_role: Option<String>,
    pub has_pet: Option<String>,
    pub star_count: i64,
    pub last_login_at: Option<DateTime<Utc>>,
    pub current_login_at: Option<DateTime<Utc>>,
    /// Append-only; once an id is here it stays here.
    pub completed_challenge_ids: BTreeSet<u8>,
}

impl UserAggregate {
    /// The zero state a user is created with at sign-up.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            likes_given: 0,
            comment_count: 0,
            share_count: 0,
            consecutive_login_days: 0,
            profile_picture_url: None,
            cover_photo_url: None,
            tribe: DEFAULT_TRIBE.to_string(),
            tribe_role: None,
            has_pet: None,
            star_count: 0,
            last_login_at: None,
            current_login_at: None,
            completed_challenge_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn has_completed(&self, challenge_id: u8) -> bool {
        self.completed_challenge_ids.contains(&challenge_id)
    }

    /// Merge a partial update into this record. `None` fields are left alone.
    pub fn apply(&mut self, patch: &AggregatePatch) {
        if let Some(days) = patch.consecutive_login_days {
            self.consecutive_login_days = days;
        }
        if let Some(at) = patch.last_login_at {
            self.last_login_at = Some(at);
        }
        if let Some(at) = patch.current_login_at {
            self.current_login_at = Some(at);
        }
        if let Some(url) = &patch.profile_picture_url {
            self.profile_picture_url = Some(url.clone());
        }
        if let Some(url) = &patch.cover_photo_url {
            self.cover_photo_url = Some(url.clone());
        }
        if let Some(tribe) = &patch.tribe {
            self.tribe.clone_from(tribe);
        }
        if let Some(role) = &patch.tribe_role {
            self.tribe_role.clone_from(role);
        }
        if let Some(pet) = &patch.has_pet {
            self.has_pet = Some(pet.clone());
        }
    }

    /// Add counter deltas, clamping every counter at zero.
    pub fn adjust(&mut self, delta: &CounterDelta) {
        self.likes_given = (self.likes_given + delta.likes_given).max(0);
        self.comment_count = (self.comment_count + delta.comment_count).max(0);
        self.share_count = (self.share_count + delta.share_count).max(0);
    }
}

/// Merge-style partial update of a [`UserAggregate`].
///
/// Writing a patch for a user without an aggregate creates the aggregate
/// from [`UserAggregate::new`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatePatch {
    pub consecutive_login_days: Option<i32>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub current_login_at: Option<DateTime<Utc>>,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub tribe: Option<String>,
    /// `Some(None)` clears a stored role; `None` keeps it.
    pub tribe_role: Option<Option<String>>,
    pub has_pet: Option<String>,
}

impl AggregatePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Signed increments for the activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub likes_given: i64,
    pub comment_count: i64,
    pub share_count: i64,
}

impl CounterDelta {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self == &Self::default()
    }
}
