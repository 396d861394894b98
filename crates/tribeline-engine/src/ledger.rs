//! Completion ledger: crediting a challenge exactly once.

use serde::Serialize;
use tribeline_core::{DocumentStore, UserId};

use crate::rules::NotificationStatus;
use crate::{lookup, Engine, EngineError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClaimOutcome {
    NotSatisfied,
    /// The predicate holds but the challenge was credited earlier.
    AlreadyClaimed,
    Claimed {
        stars_awarded: i64,
        total_stars: i64,
        notification: NotificationStatus,
    },
}

impl ClaimOutcome {
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimOutcome::Claimed { .. })
    }
}

impl<S: DocumentStore> Engine<S> {
    /// Evaluate challenge `challenge_id` and, if satisfied, credit it.
    ///
    /// The completion write is a compare-and-set on the completed set, so of
    /// any number of concurrent claims exactly one awards stars and sends the
    /// notification.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidChallengeId`] outside `1..=17`;
    /// [`EngineError::DataSourceUnavailable`] when a read or the completion
    /// write fails.
    pub async fn claim(&self, challenge_id: u32, user: &UserId) -> Result<ClaimOutcome, EngineError> {
        let def = lookup(challenge_id)?;
        let (satisfied, aggregate) = self.check_with_aggregate(def, user).await?;
        if !satisfied {
            return Ok(ClaimOutcome::NotSatisfied);
        }
        if aggregate.is_some_and(|agg| agg.has_completed(def.id)) {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        let Some(total_stars) = self
            .store
            .record_completion(user, def.id, def.star_reward)
            .await?
        else {
            return Ok(ClaimOutcome::AlreadyClaimed);
        };

        let notification = self.notify_completion(def, user).await;
        tracing::info!(
            user = %user,
            challenge_id = def.id,
            stars = def.star_reward,
            total_stars,
            "challenge claimed"
        );
        Ok(ClaimOutcome::Claimed {
            stars_awarded: def.star_reward,
            total_stars,
            notification,
        })
    }

    /// Claim each of `challenge_ids`, returning the ones newly credited.
    /// Failures are logged and skipped.
    pub(crate) async fn claim_related(&self, user: &UserId, challenge_ids: &[u8]) -> Vec<u8> {
        let mut claimed = Vec::new();
        for &id in challenge_ids {
            match self.claim(u32::from(id), user).await {
                Ok(outcome) if outcome.is_claimed() => claimed.push(id),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(user = %user, challenge_id = id, error = %e, "claim check failed");
                }
            }
        }
        claimed
    }
}
