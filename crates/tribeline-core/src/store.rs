//! The document-store collaborator.
//!
//! Everything the engine knows about persistence goes through
//! [`DocumentStore`]. Reads are one-shot; there are no live subscriptions
//! and no transactions spanning several calls.

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::aggregate::{AggregatePatch, CounterDelta, UserAggregate};
use crate::records::{
    ActivityRecord, NewNotification, NotificationRecord, PointsBucket, RecordCollection,
    Subcollection,
};
use crate::UserId;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A read or write against the document store failed.
///
/// A missing record is never reported this way; it comes back as `None` or
/// an empty result.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data source unavailable during {operation}: {source}")]
    Unavailable {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn unavailable(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Unavailable {
            operation,
            source: source.into(),
        }
    }
}

pub trait DocumentStore: Send + Sync {
    /// Fetch the aggregate for `user`, `None` if it does not exist.
    fn get_aggregate(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Option<UserAggregate>, StoreError>> + Send;

    /// Merge `patch` into the aggregate, creating a zero-state aggregate
    /// first when none exists.
    fn put_aggregate(
        &self,
        user: &UserId,
        patch: &AggregatePatch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Records in `collection` owned by `owner`, optionally only those with
    /// `created_at >= created_after`.
    fn query_owned_records(
        &self,
        collection: RecordCollection,
        owner: &UserId,
        created_after: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<Vec<ActivityRecord>, StoreError>> + Send;

    fn collection_size(
        &self,
        path: &Subcollection,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Whether `path` holds at least one record; an existence check, not a
    /// count.
    fn collection_non_empty(
        &self,
        path: &Subcollection,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn emit_notification(
        &self,
        recipient: &UserId,
        notification: &NewNotification,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Notifications for `recipient`, newest first.
    fn list_notifications(
        &self,
        recipient: &UserId,
    ) -> impl Future<Output = Result<Vec<NotificationRecord>, StoreError>> + Send;

    /// Add `delta` to the activity counters, clamping at zero and creating
    /// the aggregate when missing.
    fn adjust_counters(
        &self,
        user: &UserId,
        delta: &CounterDelta,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Append `challenge_id` to the completed set and add `star_reward` to
    /// the star count, but only if the id is not already present.
    ///
    /// Returns the new star total when this call recorded the completion and
    /// `None` when the id was already there.
    fn record_completion(
        &self,
        user: &UserId,
        challenge_id: u8,
        star_reward: i64,
    ) -> impl Future<Output = Result<Option<i64>, StoreError>> + Send;

    /// Add each `(key, points)` pair to the user's `bucket` ledger.
    fn add_points(
        &self,
        user: &UserId,
        bucket: PointsBucket,
        entries: &[(String, i64)],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Totals in the user's `bucket` ledger, keyed by genre or keyword.
    /// Empty when the user has earned nothing there.
    fn list_points(
        &self,
        user: &UserId,
        bucket: PointsBucket,
    ) -> impl Future<Output = Result<BTreeMap<String, i64>, StoreError>> + Send;

    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async { Ok(()) }
    }
}
