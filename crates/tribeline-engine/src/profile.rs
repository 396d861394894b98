use serde::{Deserialize, Serialize};
use tribeline_core::{AggregatePatch, DocumentStore, UserAggregate, UserId};

use crate::{Engine, EngineError};

/// Profile fields a user can set. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub has_pet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    pub profile: UserAggregate,
    pub claimed: Vec<u8>,
}

fn trimmed(field: &'static str, value: Option<&str>) -> Result<Option<String>, EngineError> {
    match value.map(str::trim) {
        None => Ok(None),
        Some("") => Err(EngineError::Validation(format!("{field} must not be blank"))),
        Some(v) => Ok(Some(v.to_string())),
    }
}

impl<S: DocumentStore> Engine<S> {
    /// Merge profile fields into the user's aggregate, then claim the
    /// complete-profile and pet challenges.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for an update with no fields or a blank
    /// value; [`EngineError::DataSourceUnavailable`] if the write fails.
    pub async fn update_profile(
        &self,
        user: &UserId,
        update: &ProfileUpdate,
    ) -> Result<ProfileReport, EngineError> {
        let patch = AggregatePatch {
            profile_picture_url: trimmed(
                "profilePictureUrl",
                update.profile_picture_url.as_deref(),
            )?,
            cover_photo_url: trimmed("coverPhotoUrl", update.cover_photo_url.as_deref())?,
            has_pet: trimmed("hasPet", update.has_pet.as_deref())?,
            ..AggregatePatch::default()
        };
        if patch.is_empty() {
            return Err(EngineError::Validation(
                "profile update must set at least one field".to_string(),
            ));
        }

        self.store.put_aggregate(user, &patch).await?;
        let claimed = self.claim_related(user, &[2, 15]).await;
        let profile = self
            .store
            .get_aggregate(user)
            .await?
            .unwrap_or_else(|| UserAggregate::new(user.clone()));
        tracing::info!(user = %user, claimed = ?claimed, "profile updated");
        Ok(ProfileReport { profile, claimed })
    }
}
