use serde::Serialize;
use tribeline_core::{AggregatePatch, DocumentStore, NewNotification, UserId};

use crate::rules::NotificationStatus;
use crate::{Engine, EngineError};

pub const TRIBE_CATEGORY: &str = "tribe";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TribeReport {
    pub tribe: String,
    pub notification: NotificationStatus,
    pub claimed: Vec<u8>,
}

impl<S: DocumentStore> Engine<S> {
    /// Place `user` in `tribe`, tell them about it, and claim the tribe
    /// challenges. The stored role is replaced by `role`, so joining without
    /// one drops any role held in a previous tribe.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for a blank tribe name;
    /// [`EngineError::DataSourceUnavailable`] if the aggregate write fails.
    pub async fn join_tribe(
        &self,
        user: &UserId,
        tribe: &str,
        role: Option<&str>,
    ) -> Result<TribeReport, EngineError> {
        let tribe = tribe.trim();
        if tribe.is_empty() {
            return Err(EngineError::Validation("tribe must not be empty".to_string()));
        }

        let patch = AggregatePatch {
            tribe: Some(tribe.to_string()),
            tribe_role: Some(role.map(str::to_string)),
            ..AggregatePatch::default()
        };
        self.store.put_aggregate(user, &patch).await?;

        let notification = NewNotification {
            category: TRIBE_CATEGORY.to_string(),
            message: format!("You are now in tribe {tribe}"),
            related_entity_id: String::new(),
            created_at: self.now(),
        };
        let notification = match self.store.emit_notification(user, &notification).await {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                tracing::warn!(user = %user, tribe, error = %e, "tribe notification failed");
                NotificationStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let claimed = self.claim_related(user, &[9, 17]).await;
        tracing::info!(user = %user, tribe, role = ?role, "joined tribe");
        Ok(TribeReport {
            tribe: tribe.to_string(),
            notification,
            claimed,
        })
    }
}
