//! Database operations for the `user_points` ledger.

use sqlx::PgPool;
use tribeline_core::PointsBucket;

use crate::DbError;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PointsRow {
    pub key: String,
    pub points: i64,
}

/// Adds each `(key, points)` entry to the user's `bucket`, creating missing
/// keys. Runs in one transaction; a repeated key is applied once per entry.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any upsert fails; nothing is applied then.
pub async fn add_points(
    pool: &PgPool,
    user_id: &str,
    bucket: PointsBucket,
    entries: &[(String, i64)],
) -> Result<(), DbError> {
    if entries.is_empty() {
        return Ok(());
    }

    let bucket = bucket.to_string();
    let mut tx = pool.begin().await?;
    for (key, points) in entries {
        sqlx::query(
            "INSERT INTO user_points (user_id, bucket, key, points) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, bucket, key) DO UPDATE SET \
                 points = user_points.points + EXCLUDED.points, \
                 updated_at = NOW()",
        )
        .bind(user_id)
        .bind(&bucket)
        .bind(key)
        .bind(points)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(())
}

/// Current totals in the user's `bucket`, ordered by key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_points(
    pool: &PgPool,
    user_id: &str,
    bucket: PointsBucket,
) -> Result<Vec<PointsRow>, DbError> {
    let rows = sqlx::query_as::<_, PointsRow>(
        "SELECT key, points FROM user_points \
         WHERE user_id = $1 AND bucket = $2 \
         ORDER BY key",
    )
    .bind(user_id)
    .bind(bucket.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
