//! Activity events: counter updates followed by opportunistic claims.

use serde::{Deserialize, Serialize};
use tribeline_core::{CounterDelta, DocumentStore, UserId};

use crate::{Engine, EngineError};

/// Something the user did that moves a counter or may finish a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    LikeGiven,
    LikeWithdrawn,
    Comment,
    Share,
    /// A post was created. Posts live in their own collection; no counter moves.
    Post,
    Follow,
}

impl ActivityKind {
    #[must_use]
    pub fn delta(self) -> CounterDelta {
        let mut delta = CounterDelta::default();
        match self {
            ActivityKind::LikeGiven => delta.likes_given = 1,
            ActivityKind::LikeWithdrawn => delta.likes_given = -1,
            ActivityKind::Comment => delta.comment_count = 1,
            ActivityKind::Share => delta.share_count = 1,
            ActivityKind::Post | ActivityKind::Follow => {}
        }
        delta
    }

    /// Challenges this activity can finish.
    #[must_use]
    pub fn related_challenges(self) -> &'static [u8] {
        match self {
            ActivityKind::LikeGiven => &[4, 12, 13, 16],
            ActivityKind::LikeWithdrawn => &[],
            ActivityKind::Comment => &[6, 12],
            ActivityKind::Share => &[7],
            ActivityKind::Post => &[1, 8, 14],
            ActivityKind::Follow => &[3],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    /// Challenges newly credited by this event.
    pub claimed: Vec<u8>,
}

impl<S: DocumentStore> Engine<S> {
    /// Apply `kind` to the user's counters, then claim whatever it finished.
    ///
    /// # Errors
    ///
    /// [`EngineError::DataSourceUnavailable`] if the counter update fails.
    /// Claim failures are logged and leave the report shorter.
    pub async fn record_activity(
        &self,
        user: &UserId,
        kind: ActivityKind,
    ) -> Result<ActivityReport, EngineError> {
        let delta = kind.delta();
        if !delta.is_zero() {
            self.store.adjust_counters(user, &delta).await?;
        }
        let claimed = self.claim_related(user, kind.related_challenges()).await;
        tracing::debug!(user = %user, kind = ?kind, claimed = ?claimed, "activity recorded");
        Ok(ActivityReport { claimed })
    }
}
