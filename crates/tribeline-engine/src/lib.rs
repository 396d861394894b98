//! Achievement rule engine and login streak tracker.
//!
//! [`Engine`] is stateless between calls: every operation is a
//! read-compute-write cycle against the [`DocumentStore`] it wraps. No locks
//! are held across calls, so two concurrent calls for the same user may both
//! observe the same "before" state. [`Engine::claim`] is the one path that
//! closes that race, through the store's compare-and-set completion write.

pub mod activity;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod points;
pub mod profile;
pub mod rules;
pub mod streak;
pub mod tribe;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tribeline_core::{ChallengeDefinition, DocumentStore, UserAggregate, UserId};

pub use activity::{ActivityKind, ActivityReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::EngineError;
pub use ledger::ClaimOutcome;
pub use memory::MemoryStore;
pub use points::extract_keywords;
pub use profile::{ProfileReport, ProfileUpdate};
pub use rules::{ChallengeOutcome, NotificationStatus};
pub use streak::LoginReport;
pub use tribe::TribeReport;

pub struct Engine<S> {
    store: S,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl<S: Clone> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: Arc::clone(&self.clock),
            offset: self.offset,
        }
    }
}

impl<S: DocumentStore> Engine<S> {
    /// Engine on the system clock. `offset` defines the local calendar day.
    pub fn new(store: S, offset: FixedOffset) -> Self {
        Self::with_clock(store, offset, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, offset: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            offset,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Create the zero-state aggregate for a new user. Existing aggregates
    /// are returned untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DataSourceUnavailable`] if the store fails.
    pub async fn register(&self, user: &UserId) -> Result<UserAggregate, EngineError> {
        if let Some(existing) = self.store.get_aggregate(user).await? {
            return Ok(existing);
        }
        self.store
            .put_aggregate(user, &tribeline_core::AggregatePatch::default())
            .await?;
        tracing::info!(user = %user, "registered user aggregate");
        Ok(self
            .store
            .get_aggregate(user)
            .await?
            .unwrap_or_else(|| UserAggregate::new(user.clone())))
    }

    /// Notifications for `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DataSourceUnavailable`] if the store fails.
    pub async fn list_notifications(
        &self,
        user: &UserId,
    ) -> Result<Vec<tribeline_core::NotificationRecord>, EngineError> {
        Ok(self.store.list_notifications(user).await?)
    }
}

/// Resolve a raw challenge id against the catalog.
pub(crate) fn lookup(challenge_id: u32) -> Result<&'static ChallengeDefinition, EngineError> {
    tribeline_core::find_challenge(challenge_id).ok_or(EngineError::InvalidChallengeId(challenge_id))
}
