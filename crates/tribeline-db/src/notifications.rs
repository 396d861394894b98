//! Database operations for the `notifications` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tribeline_core::{NewNotification, NotificationRecord, UserId};
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub public_id: Uuid,
    pub recipient_id: String,
    pub category: String,
    pub message: String,
    pub related_entity_id: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl From<NotificationRow> for NotificationRecord {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.public_id,
            recipient_id: UserId::new(row.recipient_id),
            category: row.category,
            message: row.message,
            related_entity_id: row.related_entity_id,
            created_at: row.created_at,
            read: row.read,
        }
    }
}

/// Appends an unread notification to `recipient_id`'s list and returns its
/// public id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_notification(
    pool: &PgPool,
    recipient_id: &str,
    notification: &NewNotification,
) -> Result<Uuid, DbError> {
    let public_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO notifications \
           (public_id, recipient_id, category, message, related_entity_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(public_id)
    .bind(recipient_id)
    .bind(&notification.category)
    .bind(&notification.message)
    .bind(&notification.related_entity_id)
    .bind(notification.created_at)
    .execute(pool)
    .await?;
    Ok(public_id)
}

/// All notifications for `recipient_id`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_notifications(
    pool: &PgPool,
    recipient_id: &str,
) -> Result<Vec<NotificationRow>, DbError> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        "SELECT id, public_id, recipient_id, category, message, related_entity_id, \
                created_at, read \
         FROM notifications \
         WHERE recipient_id = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(recipient_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
