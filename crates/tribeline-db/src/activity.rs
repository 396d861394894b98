//! Database operations for the global `posts` and `comments` tables.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tribeline_core::{ActivityRecord, RecordCollection, UserId};
use uuid::Uuid;

use crate::DbError;

/// The columns of `posts`/`comments` the rule engine looks at.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub public_id: Uuid,
    pub owner_id: String,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityRecord {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.public_id,
            owner_id: UserId::new(row.owner_id),
            created_at: row.created_at,
            vote_count: row.vote_count,
        }
    }
}

/// Records in `collection` owned by `owner_id`, oldest first, optionally
/// restricted to `created_at >= created_after`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_owned_records(
    pool: &PgPool,
    collection: RecordCollection,
    owner_id: &str,
    created_after: Option<DateTime<Utc>>,
) -> Result<Vec<ActivityRow>, DbError> {
    let sql = match collection {
        RecordCollection::Posts => {
            "SELECT public_id, owner_id, vote_count, created_at FROM posts \
             WHERE owner_id = $1 AND ($2::TIMESTAMPTZ IS NULL OR created_at >= $2) \
             ORDER BY created_at, id"
        }
        RecordCollection::Comments => {
            "SELECT public_id, owner_id, vote_count, created_at FROM comments \
             WHERE owner_id = $1 AND ($2::TIMESTAMPTZ IS NULL OR created_at >= $2) \
             ORDER BY created_at, id"
        }
    };

    let rows = sqlx::query_as::<_, ActivityRow>(sql)
        .bind(owner_id)
        .bind(created_after)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Number of posts authored by `owner_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_owned_posts(pool: &PgPool, owner_id: &str) -> Result<i64, DbError> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(pool)
            .await?,
    )
}

/// Whether `owner_id` has authored any post.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_owned_posts(pool: &PgPool, owner_id: &str) -> Result<bool, DbError> {
    Ok(
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE owner_id = $1)")
            .bind(owner_id)
            .fetch_one(pool)
            .await?,
    )
}
