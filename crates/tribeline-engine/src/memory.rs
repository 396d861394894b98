//! In-process [`DocumentStore`] for tests and local runs.
//!
//! State lives behind one `RwLock`, so each operation is atomic on its own,
//! which is all the engine assumes of any store. Individual operations can
//! be made to fail to exercise the "couldn't check" paths.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tribeline_core::{
    ActivityRecord, AggregatePatch, CounterDelta, DocumentStore, NewNotification,
    NotificationRecord, PointsBucket, RecordCollection, StoreError, Subcollection,
    UserAggregate, UserId,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    aggregates: HashMap<UserId, UserAggregate>,
    posts: Vec<ActivityRecord>,
    comments: Vec<ActivityRecord>,
    /// (follower, followee)
    follows: BTreeSet<(UserId, UserId)>,
    notifications: Vec<NotificationRecord>,
    points: HashMap<(UserId, PointsBucket), BTreeMap<String, i64>>,
    failing: HashSet<&'static str>,
}

impl State {
    fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.failing.contains(operation) {
            return Err(StoreError::unavailable(
                operation,
                format!("{operation} is configured to fail"),
            ));
        }
        Ok(())
    }

    fn aggregate_mut(&mut self, user: &UserId) -> &mut UserAggregate {
        self.aggregates
            .entry(user.clone())
            .or_insert_with(|| UserAggregate::new(user.clone()))
    }

    fn count(&self, path: &Subcollection) -> u64 {
        let n = match path {
            Subcollection::OwnPosts(user) => {
                self.posts.iter().filter(|p| &p.owner_id == user).count()
            }
            Subcollection::Following(user) => {
                self.follows.iter().filter(|(from, _)| from == user).count()
            }
            Subcollection::Followers(user) => {
                self.follows.iter().filter(|(_, to)| to == user).count()
            }
        };
        u64::try_from(n).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user's aggregate wholesale.
    pub async fn insert_aggregate(&self, aggregate: UserAggregate) {
        let mut state = self.state.write().await;
        state
            .aggregates
            .insert(aggregate.user_id.clone(), aggregate);
    }

    pub async fn aggregate(&self, user: &UserId) -> Option<UserAggregate> {
        self.state.read().await.aggregates.get(user).cloned()
    }

    /// Add a post authored by `owner` and return its id.
    pub async fn add_post(&self, owner: &UserId, created_at: DateTime<Utc>, votes: i64) -> Uuid {
        let record = ActivityRecord {
            id: Uuid::new_v4(),
            owner_id: owner.clone(),
            created_at,
            vote_count: votes,
        };
        let id = record.id;
        self.state.write().await.posts.push(record);
        id
    }

    pub async fn add_comment(&self, owner: &UserId, created_at: DateTime<Utc>) -> Uuid {
        let record = ActivityRecord {
            id: Uuid::new_v4(),
            owner_id: owner.clone(),
            created_at,
            vote_count: 0,
        };
        let id = record.id;
        self.state.write().await.comments.push(record);
        id
    }

    pub async fn add_follow(&self, follower: &UserId, followee: &UserId) {
        self.state
            .write()
            .await
            .follows
            .insert((follower.clone(), followee.clone()));
    }

    /// Totals in a user's points bucket, keyed by genre or keyword.
    pub async fn points(&self, user: &UserId, bucket: PointsBucket) -> BTreeMap<String, i64> {
        self.state
            .read()
            .await
            .points
            .get(&(user.clone(), bucket))
            .cloned()
            .unwrap_or_default()
    }

    /// Make every call of `operation` fail until [`MemoryStore::heal`].
    /// Operation names match the [`DocumentStore`] method names.
    pub async fn fail_operation(&self, operation: &'static str) {
        self.state.write().await.failing.insert(operation);
    }

    pub async fn heal(&self) {
        self.state.write().await.failing.clear();
    }
}

impl DocumentStore for MemoryStore {
    async fn get_aggregate(&self, user: &UserId) -> Result<Option<UserAggregate>, StoreError> {
        let state = self.state.read().await;
        state.check("get_aggregate")?;
        Ok(state.aggregates.get(user).cloned())
    }

    async fn put_aggregate(&self, user: &UserId, patch: &AggregatePatch) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.check("put_aggregate")?;
        state.aggregate_mut(user).apply(patch);
        Ok(())
    }

    async fn query_owned_records(
        &self,
        collection: RecordCollection,
        owner: &UserId,
        created_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        let state = self.state.read().await;
        state.check("query_owned_records")?;
        let source = match collection {
            RecordCollection::Posts => &state.posts,
            RecordCollection::Comments => &state.comments,
        };
        let mut records: Vec<ActivityRecord> = source
            .iter()
            .filter(|r| &r.owner_id == owner)
            .filter(|r| created_after.is_none_or(|after| r.created_at >= after))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn collection_size(&self, path: &Subcollection) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        state.check("collection_size")?;
        Ok(state.count(path))
    }

    async fn collection_non_empty(&self, path: &Subcollection) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        state.check("collection_non_empty")?;
        Ok(state.count(path) > 0)
    }

    async fn emit_notification(
        &self,
        recipient: &UserId,
        notification: &NewNotification,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.check("emit_notification")?;
        state.notifications.push(NotificationRecord {
            id: Uuid::new_v4(),
            recipient_id: recipient.clone(),
            category: notification.category.clone(),
            message: notification.message.clone(),
            related_entity_id: notification.related_entity_id.clone(),
            created_at: notification.created_at,
            read: false,
        });
        Ok(())
    }

    async fn list_notifications(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        let state = self.state.read().await;
        state.check("list_notifications")?;
        // Reverse insertion order first so equal timestamps stay newest first
        // under the stable sort.
        let mut list: Vec<NotificationRecord> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| &n.recipient_id == recipient)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn adjust_counters(&self, user: &UserId, delta: &CounterDelta) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.check("adjust_counters")?;
        state.aggregate_mut(user).adjust(delta);
        Ok(())
    }

    async fn record_completion(
        &self,
        user: &UserId,
        challenge_id: u8,
        star_reward: i64,
    ) -> Result<Option<i64>, StoreError> {
        let mut state = self.state.write().await;
        state.check("record_completion")?;
        let aggregate = state.aggregate_mut(user);
        if !aggregate.completed_challenge_ids.insert(challenge_id) {
            return Ok(None);
        }
        aggregate.star_count += star_reward;
        Ok(Some(aggregate.star_count))
    }

    async fn add_points(
        &self,
        user: &UserId,
        bucket: PointsBucket,
        entries: &[(String, i64)],
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.check("add_points")?;
        let ledger = state.points.entry((user.clone(), bucket)).or_default();
        for (key, points) in entries {
            *ledger.entry(key.clone()).or_insert(0) += points;
        }
        Ok(())
    }

    async fn list_points(
        &self,
        user: &UserId,
        bucket: PointsBucket,
    ) -> Result<BTreeMap<String, i64>, StoreError> {
        let state = self.state.read().await;
        state.check("list_points")?;
        Ok(state
            .points
            .get(&(user.clone(), bucket))
            .cloned()
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.state.read().await.check("ping")
    }
}
