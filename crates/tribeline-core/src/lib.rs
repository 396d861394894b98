pub mod aggregate;
pub mod app_config;
pub mod calendar;
pub mod challenges;
pub mod config;
pub mod records;
pub mod store;
pub mod streak;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use aggregate::{AggregatePatch, CounterDelta, UserAggregate, DEFAULT_TRIBE};
pub use app_config::{AppConfig, Environment};
pub use challenges::{find_challenge, ChallengeDefinition, Difficulty, PredicateKind, CATALOG};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    ActivityRecord, NewNotification, NotificationRecord, PointsBucket, RecordCollection,
    Subcollection,
};
pub use store::{DocumentStore, StoreError};
pub use streak::{next_login, LoginTransition, StreakUpdate, STREAK_BASE};

/// Stable identifier of a user; the application keys users by email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
