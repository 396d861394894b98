use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Global activity collections the rule engine may scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordCollection {
    Posts,
    Comments,
}

impl std::fmt::Display for RecordCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordCollection::Posts => write!(f, "posts"),
            RecordCollection::Comments => write!(f, "comments"),
        }
    }
}

/// A post or comment as seen by the windowed and threshold predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: Uuid,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub vote_count: i64,
}

/// Per-user collections that are only ever counted or checked for emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subcollection {
    /// Posts the user authored.
    OwnPosts(UserId),
    /// Users this user follows.
    Following(UserId),
    /// Users following this user.
    Followers(UserId),
}

impl Subcollection {
    #[must_use]
    pub fn owner(&self) -> &UserId {
        match self {
            Subcollection::OwnPosts(user)
            | Subcollection::Following(user)
            | Subcollection::Followers(user) => user,
        }
    }
}

impl std::fmt::Display for Subcollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subcollection::OwnPosts(user) => write!(f, "users/{user}/posts"),
            Subcollection::Following(user) => write!(f, "users/{user}/following"),
            Subcollection::Followers(user) => write!(f, "users/{user}/followers"),
        }
    }
}

/// A notification about to be written to a recipient's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub category: String,
    pub message: String,
    pub related_entity_id: String,
    pub created_at: DateTime<Utc>,
}

/// A stored notification. Only the `read` flag ever changes after creation,
/// and that flag belongs to the notification UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    pub recipient_id: UserId,
    pub category: String,
    pub message: String,
    pub related_entity_id: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Point ledgers kept per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsBucket {
    Genre,
    Keywords,
}

impl std::fmt::Display for PointsBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointsBucket::Genre => write!(f, "genre"),
            PointsBucket::Keywords => write!(f, "keywords"),
        }
    }
}
