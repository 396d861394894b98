//! [`DocumentStore`] backed by the Postgres tables in this crate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tribeline_core::{
    ActivityRecord, AggregatePatch, CounterDelta, DocumentStore, NewNotification,
    NotificationRecord, PointsBucket, RecordCollection, StoreError, Subcollection,
    UserAggregate, UserId,
};

use crate::DbError;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn unavailable(operation: &'static str) -> impl FnOnce(DbError) -> StoreError {
    move |e| {
        tracing::debug!(operation, error = %e, "postgres store operation failed");
        StoreError::unavailable(operation, e)
    }
}

impl DocumentStore for PgStore {
    async fn get_aggregate(&self, user: &UserId) -> Result<Option<UserAggregate>, StoreError> {
        let row = crate::get_user(&self.pool, user.as_str())
            .await
            .map_err(unavailable("get_aggregate"))?;
        Ok(row.map(UserAggregate::from))
    }

    async fn put_aggregate(&self, user: &UserId, patch: &AggregatePatch) -> Result<(), StoreError> {
        crate::upsert_user(&self.pool, user.as_str(), patch)
            .await
            .map_err(unavailable("put_aggregate"))
    }

    async fn query_owned_records(
        &self,
        collection: RecordCollection,
        owner: &UserId,
        created_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        let rows = crate::list_owned_records(&self.pool, collection, owner.as_str(), created_after)
            .await
            .map_err(unavailable("query_owned_records"))?;
        Ok(rows.into_iter().map(ActivityRecord::from).collect())
    }

    async fn collection_size(&self, path: &Subcollection) -> Result<u64, StoreError> {
        let count = match path {
            Subcollection::OwnPosts(user) => {
                crate::count_owned_posts(&self.pool, user.as_str()).await
            }
            Subcollection::Following(user) => {
                crate::count_following(&self.pool, user.as_str()).await
            }
            Subcollection::Followers(user) => {
                crate::count_followers(&self.pool, user.as_str()).await
            }
        }
        .map_err(unavailable("collection_size"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn collection_non_empty(&self, path: &Subcollection) -> Result<bool, StoreError> {
        match path {
            Subcollection::OwnPosts(user) => {
                crate::has_owned_posts(&self.pool, user.as_str()).await
            }
            Subcollection::Following(user) => {
                crate::has_following(&self.pool, user.as_str()).await
            }
            Subcollection::Followers(user) => {
                crate::has_followers(&self.pool, user.as_str()).await
            }
        }
        .map_err(unavailable("collection_non_empty"))
    }

    async fn emit_notification(
        &self,
        recipient: &UserId,
        notification: &NewNotification,
    ) -> Result<(), StoreError> {
        crate::insert_notification(&self.pool, recipient.as_str(), notification)
            .await
            .map_err(unavailable("emit_notification"))?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        let rows = crate::list_notifications(&self.pool, recipient.as_str())
            .await
            .map_err(unavailable("list_notifications"))?;
        Ok(rows.into_iter().map(NotificationRecord::from).collect())
    }

    async fn adjust_counters(&self, user: &UserId, delta: &CounterDelta) -> Result<(), StoreError> {
        crate::adjust_user_counters(&self.pool, user.as_str(), delta)
            .await
            .map_err(unavailable("adjust_counters"))
    }

    async fn record_completion(
        &self,
        user: &UserId,
        challenge_id: u8,
        star_reward: i64,
    ) -> Result<Option<i64>, StoreError> {
        crate::record_challenge_completion(&self.pool, user.as_str(), challenge_id, star_reward)
            .await
            .map_err(unavailable("record_completion"))
    }

    async fn add_points(
        &self,
        user: &UserId,
        bucket: PointsBucket,
        entries: &[(String, i64)],
    ) -> Result<(), StoreError> {
        crate::add_points(&self.pool, user.as_str(), bucket, entries)
            .await
            .map_err(unavailable("add_points"))
    }

    async fn list_points(
        &self,
        user: &UserId,
        bucket: PointsBucket,
    ) -> Result<BTreeMap<String, i64>, StoreError> {
        let rows = crate::list_points(&self.pool, user.as_str(), bucket)
            .await
            .map_err(unavailable("list_points"))?;
        Ok(rows.into_iter().map(|row| (row.key, row.points)).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(unavailable("ping"))
    }
}
