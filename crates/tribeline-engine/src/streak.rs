//! Login handling on top of [`tribeline_core::next_login`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tribeline_core::{next_login, DocumentStore, StreakUpdate, UserId};

use crate::{Engine, EngineError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReport {
    pub update: StreakUpdate,
    pub consecutive_login_days: i32,
    pub logged_in_at: DateTime<Utc>,
}

impl<S: DocumentStore> Engine<S> {
    /// Record a login for `user` and move the streak.
    ///
    /// One aggregate read, one merge write. Calendar days are taken in the
    /// engine's configured offset. Concurrent logins for the same user are
    /// last-writer-wins, which is harmless because every path writes the same
    /// value for a given day.
    ///
    /// # Errors
    ///
    /// [`EngineError::DataSourceUnavailable`] if the read or write fails.
    pub async fn record_login(&self, user: &UserId) -> Result<LoginReport, EngineError> {
        let now = self.now();
        let previous = self.store.get_aggregate(user).await?;
        let transition = next_login(previous.as_ref(), now, self.offset);
        self.store.put_aggregate(user, &transition.patch).await?;

        match transition.update {
            StreakUpdate::Reset { previous } => tracing::info!(
                user = %user,
                previous,
                "login streak reset"
            ),
            update => tracing::debug!(
                user = %user,
                update = ?update,
                days = transition.consecutive_login_days,
                "login recorded"
            ),
        }

        Ok(LoginReport {
            update: transition.update,
            consecutive_login_days: transition.consecutive_login_days,
            logged_in_at: now,
        })
    }
}
