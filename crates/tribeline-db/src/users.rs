//! Database operations for the `users` table (one aggregate row per user).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tribeline_core::{AggregatePatch, CounterDelta, UserAggregate, UserId};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub likes_given: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub consecutive_login_days: i32,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub tribe: String,
    pub tribe_role: Option<String>,
    pub pet: Option<String>,
    pub star_count: i64,
    pub last_login_at: Option<DateTime<Utc>>,
    pub current_login_at: Option<DateTime<Utc>>,
    pub completed_challenge_ids: Vec<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserAggregate {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            likes_given: row.likes_given,
            comment_count: row.comment_count,
            share_count: row.share_count,
            consecutive_login_days: row.consecutive_login_days,
            profile_picture_url: row.profile_picture_url,
            cover_photo_url: row.cover_photo_url,
            tribe: row.tribe,
            tribe_role: row.tribe_role,
            has_pet: row.pet,
            star_count: row.star_count,
            last_login_at: row.last_login_at,
            current_login_at: row.current_login_at,
            completed_challenge_ids: row
                .completed_challenge_ids
                .into_iter()
                .filter_map(|id| u8::try_from(id).ok())
                .collect(),
        }
    }
}

const USER_COLUMNS: &str = "user_id, likes_given, comment_count, share_count, \
     consecutive_login_days, profile_picture_url, cover_photo_url, tribe, tribe_role, pet, \
     star_count, last_login_at, current_login_at, completed_challenge_ids, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the aggregate row for `user_id`, or `None` if the user has none.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user(pool: &PgPool, user_id: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Merges `patch` into the user's row, inserting a zero-state row first if
/// none exists. `None` patch fields keep the stored value; a
/// `tribe_role` of `Some(None)` clears the stored role.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_user(
    pool: &PgPool,
    user_id: &str,
    patch: &AggregatePatch,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO users (user_id, consecutive_login_days, last_login_at, current_login_at, \
                            profile_picture_url, cover_photo_url, tribe, tribe_role, pet) \
         VALUES ($1, COALESCE($2::INTEGER, 0), $3::TIMESTAMPTZ, $4::TIMESTAMPTZ, $5::TEXT, \
                 $6::TEXT, COALESCE($7::TEXT, 'rookie'), $8::TEXT, $9::TEXT) \
         ON CONFLICT (user_id) DO UPDATE SET \
             consecutive_login_days = COALESCE($2::INTEGER, users.consecutive_login_days), \
             last_login_at = COALESCE($3::TIMESTAMPTZ, users.last_login_at), \
             current_login_at = COALESCE($4::TIMESTAMPTZ, users.current_login_at), \
             profile_picture_url = COALESCE($5::TEXT, users.profile_picture_url), \
             cover_photo_url = COALESCE($6::TEXT, users.cover_photo_url), \
             tribe = COALESCE($7::TEXT, users.tribe), \
             tribe_role = CASE WHEN $10::BOOLEAN THEN $8::TEXT ELSE users.tribe_role END, \
             pet = COALESCE($9::TEXT, users.pet), \
             updated_at = NOW()",
    )
    .bind(user_id)
    .bind(patch.consecutive_login_days)
    .bind(patch.last_login_at)
    .bind(patch.current_login_at)
    .bind(patch.profile_picture_url.as_deref())
    .bind(patch.cover_photo_url.as_deref())
    .bind(patch.tribe.as_deref())
    .bind(patch.tribe_role.as_ref().and_then(Option::as_deref))
    .bind(patch.has_pet.as_deref())
    .bind(patch.tribe_role.is_some())
    .execute(pool)
    .await?;

    Ok(())
}

/// Adds `delta` to the activity counters in one statement, clamping each at
/// zero. Inserts the row when missing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn adjust_user_counters(
    pool: &PgPool,
    user_id: &str,
    delta: &CounterDelta,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO users (user_id, likes_given, comment_count, share_count) \
         VALUES ($1, GREATEST($2, 0), GREATEST($3, 0), GREATEST($4, 0)) \
         ON CONFLICT (user_id) DO UPDATE SET \
             likes_given = GREATEST(users.likes_given + $2, 0), \
             comment_count = GREATEST(users.comment_count + $3, 0), \
             share_count = GREATEST(users.share_count + $4, 0), \
             updated_at = NOW()",
    )
    .bind(user_id)
    .bind(delta.likes_given)
    .bind(delta.comment_count)
    .bind(delta.share_count)
    .execute(pool)
    .await?;

    Ok(())
}

/// Compare-and-set append of a completed challenge.
///
/// The id is appended and `star_reward` added only when the id is absent;
/// the row lock taken by the `UPDATE` makes concurrent claims for the same
/// id serialize, so exactly one of them sees `Some`.
///
/// Returns the new star total, or `None` if the challenge was already recorded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn record_challenge_completion(
    pool: &PgPool,
    user_id: &str,
    challenge_id: u8,
    star_reward: i64,
) -> Result<Option<i64>, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let total = sqlx::query_scalar::<_, i64>(
        "UPDATE users \
         SET completed_challenge_ids = array_append(completed_challenge_ids, $2), \
             star_count = star_count + $3, \
             updated_at = NOW() \
         WHERE user_id = $1 AND NOT ($2 = ANY(completed_challenge_ids)) \
         RETURNING star_count",
    )
    .bind(user_id)
    .bind(i16::from(challenge_id))
    .bind(star_reward)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(total)
}
