//! Challenge predicates and the completion notifier.

use chrono::Duration;
use serde::Serialize;
use tribeline_core::calendar::distinct_days;
use tribeline_core::{
    ChallengeDefinition, DocumentStore, NewNotification, PredicateKind, RecordCollection,
    Subcollection, UserAggregate, UserId, DEFAULT_TRIBE,
};

use crate::{lookup, Engine, EngineError};

/// Notification category written for every finished challenge.
pub const CHALLENGE_CATEGORY: &str = "challenge";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    /// The predicate was not satisfied.
    NotSent,
    Sent,
    /// Satisfied, but the challenge is already in the user's completed set.
    AlreadyCompleted,
    /// Satisfied, but writing the notification failed. The result stands.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOutcome {
    pub challenge_id: u8,
    pub satisfied: bool,
    pub notification: NotificationStatus,
}

impl<S: DocumentStore> Engine<S> {
    /// Whether `user` currently satisfies challenge `challenge_id`.
    ///
    /// Pure with respect to the store: nothing is written. A user with no
    /// aggregate fails every aggregate-backed predicate.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidChallengeId`] outside `1..=17`;
    /// [`EngineError::DataSourceUnavailable`] when a read fails. A failed read
    /// is never reported as `false`.
    pub async fn evaluate(&self, challenge_id: u32, user: &UserId) -> Result<bool, EngineError> {
        let def = lookup(challenge_id)?;
        let (satisfied, _) = self.check_with_aggregate(def, user).await?;
        Ok(satisfied)
    }

    /// [`Engine::evaluate`], then one "challenge" notification when the
    /// predicate holds and the challenge is not already completed.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::evaluate`]. A failed notification write is reported
    /// in [`ChallengeOutcome::notification`], not as an error.
    pub async fn evaluate_and_notify(
        &self,
        challenge_id: u32,
        user: &UserId,
    ) -> Result<ChallengeOutcome, EngineError> {
        let def = lookup(challenge_id)?;
        let (satisfied, aggregate) = self.check_with_aggregate(def, user).await?;

        let notification = if satisfied {
            // Predicates that skip the aggregate still need it for the
            // completed-set check.
            let aggregate = match aggregate {
                Some(agg) => Some(agg),
                None => self.store.get_aggregate(user).await?,
            };
            if aggregate.is_some_and(|agg| agg.has_completed(def.id)) {
                NotificationStatus::AlreadyCompleted
            } else {
                self.notify_completion(def, user).await
            }
        } else {
            NotificationStatus::NotSent
        };

        tracing::debug!(
            user = %user,
            challenge_id = def.id,
            satisfied,
            notification = ?notification,
            "challenge evaluated"
        );
        Ok(ChallengeOutcome {
            challenge_id: def.id,
            satisfied,
            notification,
        })
    }

    /// Write the completion notification for `def`. Failures are logged and
    /// returned as [`NotificationStatus::Failed`].
    pub(crate) async fn notify_completion(
        &self,
        def: &ChallengeDefinition,
        user: &UserId,
    ) -> NotificationStatus {
        let notification = NewNotification {
            category: CHALLENGE_CATEGORY.to_string(),
            message: def.completion_message(),
            related_entity_id: String::new(),
            created_at: self.now(),
        };
        match self.store.emit_notification(user, &notification).await {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                tracing::warn!(
                    user = %user,
                    challenge_id = def.id,
                    error = %e,
                    "completion notification failed"
                );
                NotificationStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Evaluate `def`, returning the aggregate too when it was read.
    pub(crate) async fn check_with_aggregate(
        &self,
        def: &ChallengeDefinition,
        user: &UserId,
    ) -> Result<(bool, Option<UserAggregate>), EngineError> {
        if def.predicate.reads_aggregate() {
            let aggregate = self.store.get_aggregate(user).await?;
            let satisfied = self.check(def, user, aggregate.as_ref()).await?;
            Ok((satisfied, aggregate))
        } else {
            Ok((self.check(def, user, None).await?, None))
        }
    }

    async fn check(
        &self,
        def: &ChallengeDefinition,
        user: &UserId,
        aggregate: Option<&UserAggregate>,
    ) -> Result<bool, EngineError> {
        let satisfied = match def.predicate {
            PredicateKind::HasAnyOwnPost => {
                self.store
                    .collection_non_empty(&Subcollection::OwnPosts(user.clone()))
                    .await?
            }
            PredicateKind::HasCompleteProfile => aggregate.is_some_and(|agg| {
                agg.profile_picture_url.is_some() && agg.cover_photo_url.is_some()
            }),
            PredicateKind::HasAnyFollowing => {
                self.store
                    .collection_non_empty(&Subcollection::Following(user.clone()))
                    .await?
            }
            PredicateKind::LikesGivenAtLeast { n } => {
                aggregate.is_some_and(|agg| agg.likes_given >= n)
            }
            PredicateKind::ConsecutiveLoginAtLeast { n } => {
                aggregate.is_some_and(|agg| agg.consecutive_login_days >= n)
            }
            PredicateKind::CommentCountAtLeast { n } => {
                aggregate.is_some_and(|agg| agg.comment_count >= n)
            }
            PredicateKind::ShareCountAtLeast { n } => {
                aggregate.is_some_and(|agg| agg.share_count >= n)
            }
            PredicateKind::DistinctPostsInWindow { count, window_days } => {
                self.posts_in_window(user, window_days).await?.len() >= count
            }
            PredicateKind::TribeIsNotDefault => {
                aggregate.is_some_and(|agg| agg.tribe != DEFAULT_TRIBE)
            }
            PredicateKind::FollowerCountAtLeast { n } => {
                self.store
                    .collection_size(&Subcollection::Followers(user.clone()))
                    .await?
                    >= n
            }
            PredicateKind::AnyOwnPostVotesAtLeast { n } => self
                .store
                .query_owned_records(RecordCollection::Posts, user, None)
                .await?
                .iter()
                .any(|post| post.vote_count >= n),
            PredicateKind::LikesOrCommentsAtLeast { n } => {
                aggregate.is_some_and(|agg| agg.likes_given >= n || agg.comment_count >= n)
            }
            PredicateKind::DistinctPostingDaysInWindow { count, window_days } => {
                let posts = self.posts_in_window(user, window_days).await?;
                distinct_days(posts.iter().map(|p| p.created_at), self.offset) >= count
            }
            PredicateKind::HasPet => aggregate
                .and_then(|agg| agg.has_pet.as_deref())
                .is_some_and(|pet| !pet.is_empty()),
            PredicateKind::TribeRoleIs { role } => {
                aggregate.is_some_and(|agg| agg.tribe_role.as_deref() == Some(role))
            }
        };
        Ok(satisfied)
    }

    async fn posts_in_window(
        &self,
        user: &UserId,
        window_days: i64,
    ) -> Result<Vec<tribeline_core::ActivityRecord>, EngineError> {
        let since = self.now() - Duration::days(window_days);
        Ok(self
            .store
            .query_owned_records(RecordCollection::Posts, user, Some(since))
            .await?)
    }
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;
