//! Database operations for the `follows` edge table.

use sqlx::PgPool;

use crate::DbError;

/// How many users `user_id` follows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_following(pool: &PgPool, user_id: &str) -> Result<i64, DbError> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?,
    )
}

/// How many users follow `user_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_followers(pool: &PgPool, user_id: &str) -> Result<i64, DbError> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?,
    )
}

/// Whether `user_id` follows anyone.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_following(pool: &PgPool, user_id: &str) -> Result<bool, DbError> {
    Ok(sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?)
}

/// Whether anyone follows `user_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_followers(pool: &PgPool, user_id: &str) -> Result<bool, DbError> {
    Ok(sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE followee_id = $1)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?)
}
