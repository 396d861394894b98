//! Live integration tests for tribeline-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. `"../../migrations"` is relative to `crates/tribeline-db/`.

use chrono::{Duration, Utc};
use tribeline_core::{
    AggregatePatch, CounterDelta, DocumentStore, NewNotification, PointsBucket, RecordCollection,
    Subcollection, UserId,
};
use tribeline_db::{
    add_points, adjust_user_counters, count_followers, count_following, get_user, has_followers,
    has_following, has_owned_posts, insert_notification, list_notifications, list_owned_records,
    list_points, record_challenge_completion, upsert_user, PgStore,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_post(pool: &sqlx::PgPool, owner: &str, days_ago: i64, votes: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO posts (public_id, owner_id, genre, body, vote_count, created_at) \
         VALUES ($1, $2, 'music', 'hello', $3, $4) \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(owner)
    .bind(votes)
    .bind(Utc::now() - Duration::days(days_ago))
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("seed_post failed for {owner}: {e}"))
}

async fn seed_comment(pool: &sqlx::PgPool, post_id: i64, owner: &str) {
    sqlx::query(
        "INSERT INTO comments (public_id, post_id, owner_id, body, created_at) \
         VALUES ($1, $2, $3, 'nice', NOW())",
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(owner)
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("seed_comment failed for {owner}: {e}"));
}

async fn seed_follow(pool: &sqlx::PgPool, follower: &str, followee: &str) {
    sqlx::query(
        "INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2) \
         ON CONFLICT (follower_id, followee_id) DO NOTHING",
    )
    .bind(follower)
    .bind(followee)
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("seed_follow failed for {follower}: {e}"));
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_user_creates_zero_state_row(pool: sqlx::PgPool) {
    upsert_user(&pool, "new@example.com", &AggregatePatch::default())
        .await
        .expect("upsert");

    let row = get_user(&pool, "new@example.com")
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(row.tribe, "rookie");
    assert_eq!(row.likes_given, 0);
    assert_eq!(row.consecutive_login_days, 0);
    assert!(row.completed_challenge_ids.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_user_merges_only_set_fields(pool: sqlx::PgPool) {
    upsert_user(
        &pool,
        "merge@example.com",
        &AggregatePatch {
            profile_picture_url: Some("pfp.png".to_string()),
            tribe: Some("owls".to_string()),
            ..AggregatePatch::default()
        },
    )
    .await
    .expect("first upsert");

    upsert_user(
        &pool,
        "merge@example.com",
        &AggregatePatch {
            cover_photo_url: Some("cover.png".to_string()),
            ..AggregatePatch::default()
        },
    )
    .await
    .expect("second upsert");

    let row = get_user(&pool, "merge@example.com").await.unwrap().unwrap();
    assert_eq!(row.profile_picture_url.as_deref(), Some("pfp.png"));
    assert_eq!(row.cover_photo_url.as_deref(), Some("cover.png"));
    assert_eq!(row.tribe, "owls");
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_user_replaces_or_keeps_tribe_role(pool: sqlx::PgPool) {
    let leader = AggregatePatch {
        tribe: Some("owls".to_string()),
        tribe_role: Some(Some("leader".to_string())),
        ..AggregatePatch::default()
    };
    upsert_user(&pool, "role@example.com", &leader).await.expect("leader");

    upsert_user(&pool, "role@example.com", &AggregatePatch::default())
        .await
        .expect("untouched");
    let row = get_user(&pool, "role@example.com").await.unwrap().unwrap();
    assert_eq!(row.tribe_role.as_deref(), Some("leader"));

    let member = AggregatePatch {
        tribe: Some("wolves".to_string()),
        tribe_role: Some(None),
        ..AggregatePatch::default()
    };
    upsert_user(&pool, "role@example.com", &member).await.expect("member");
    let row = get_user(&pool, "role@example.com").await.unwrap().unwrap();
    assert_eq!(row.tribe, "wolves");
    assert!(row.tribe_role.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_user_returns_none_for_unknown(pool: sqlx::PgPool) {
    assert!(get_user(&pool, "ghost@example.com").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn adjust_user_counters_clamps_at_zero(pool: sqlx::PgPool) {
    adjust_user_counters(
        &pool,
        "likes@example.com",
        &CounterDelta {
            likes_given: 2,
            ..CounterDelta::default()
        },
    )
    .await
    .expect("increment");
    adjust_user_counters(
        &pool,
        "likes@example.com",
        &CounterDelta {
            likes_given: -5,
            comment_count: 1,
            ..CounterDelta::default()
        },
    )
    .await
    .expect("decrement");

    let row = get_user(&pool, "likes@example.com").await.unwrap().unwrap();
    assert_eq!(row.likes_given, 0);
    assert_eq!(row.comment_count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn record_challenge_completion_is_compare_and_set(pool: sqlx::PgPool) {
    let first = record_challenge_completion(&pool, "cas@example.com", 9, 3)
        .await
        .expect("first");
    let second = record_challenge_completion(&pool, "cas@example.com", 9, 3)
        .await
        .expect("second");
    let other = record_challenge_completion(&pool, "cas@example.com", 1, 1)
        .await
        .expect("other");

    assert_eq!(first, Some(3));
    assert_eq!(second, None);
    assert_eq!(other, Some(4));

    let row = get_user(&pool, "cas@example.com").await.unwrap().unwrap();
    assert_eq!(row.completed_challenge_ids, vec![9, 1]);
    assert_eq!(row.star_count, 4);
}

// ---------------------------------------------------------------------------
// activity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_owned_records_filters_by_owner_and_window(pool: sqlx::PgPool) {
    seed_post(&pool, "author@example.com", 1, 0).await;
    seed_post(&pool, "author@example.com", 10, 0).await;
    seed_post(&pool, "someone-else@example.com", 1, 0).await;

    let all = list_owned_records(&pool, RecordCollection::Posts, "author@example.com", None)
        .await
        .expect("all");
    assert_eq!(all.len(), 2);

    let recent = list_owned_records(
        &pool,
        RecordCollection::Posts,
        "author@example.com",
        Some(Utc::now() - Duration::days(7)),
    )
    .await
    .expect("recent");
    assert_eq!(recent.len(), 1);
    assert!(recent.iter().all(|r| r.owner_id == "author@example.com"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_owned_records_reads_comments(pool: sqlx::PgPool) {
    let post_id = seed_post(&pool, "author@example.com", 0, 0).await;
    seed_comment(&pool, post_id, "commenter@example.com").await;

    let comments = list_owned_records(
        &pool,
        RecordCollection::Comments,
        "commenter@example.com",
        None,
    )
    .await
    .expect("comments");
    assert_eq!(comments.len(), 1);
}

// ---------------------------------------------------------------------------
// follows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn follow_counts_are_directional(pool: sqlx::PgPool) {
    seed_follow(&pool, "a@example.com", "b@example.com").await;
    seed_follow(&pool, "c@example.com", "b@example.com").await;
    seed_follow(&pool, "c@example.com", "b@example.com").await;

    assert_eq!(count_followers(&pool, "b@example.com").await.unwrap(), 2);
    assert_eq!(count_following(&pool, "b@example.com").await.unwrap(), 0);
    assert_eq!(count_following(&pool, "c@example.com").await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn existence_checks_match_counts(pool: sqlx::PgPool) {
    assert!(!has_owned_posts(&pool, "a@example.com").await.unwrap());
    assert!(!has_following(&pool, "a@example.com").await.unwrap());

    seed_post(&pool, "a@example.com", 0, 0).await;
    seed_follow(&pool, "a@example.com", "b@example.com").await;

    assert!(has_owned_posts(&pool, "a@example.com").await.unwrap());
    assert!(has_following(&pool, "a@example.com").await.unwrap());
    assert!(!has_followers(&pool, "a@example.com").await.unwrap());
    assert!(has_followers(&pool, "b@example.com").await.unwrap());
}

// ---------------------------------------------------------------------------
// notifications and points
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn notifications_are_listed_newest_first(pool: sqlx::PgPool) {
    let older = NewNotification {
        category: "tribe".to_string(),
        message: "You are now in tribe owls".to_string(),
        related_entity_id: String::new(),
        created_at: Utc::now() - Duration::hours(1),
    };
    let newer = NewNotification {
        category: "challenge".to_string(),
        message: "Finished challenge: Tribal".to_string(),
        related_entity_id: String::new(),
        created_at: Utc::now(),
    };
    insert_notification(&pool, "n@example.com", &older).await.expect("older");
    insert_notification(&pool, "n@example.com", &newer).await.expect("newer");

    let rows = list_notifications(&pool, "n@example.com").await.expect("list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, "challenge");
    assert!(rows.iter().all(|r| !r.read));
}

#[sqlx::test(migrations = "../../migrations")]
async fn add_points_accumulates_per_key(pool: sqlx::PgPool) {
    let entries = vec![("music".to_string(), 5), ("art".to_string(), 2)];
    add_points(&pool, "p@example.com", PointsBucket::Genre, &entries)
        .await
        .expect("first");
    add_points(
        &pool,
        "p@example.com",
        PointsBucket::Genre,
        &[("music".to_string(), 5)],
    )
    .await
    .expect("second");

    let rows = list_points(&pool, "p@example.com", PointsBucket::Genre)
        .await
        .expect("list");
    let totals: Vec<(String, i64)> = rows.into_iter().map(|r| (r.key, r.points)).collect();
    assert_eq!(
        totals,
        vec![("art".to_string(), 2), ("music".to_string(), 10)]
    );

    let keywords = list_points(&pool, "p@example.com", PointsBucket::Keywords)
        .await
        .expect("keywords");
    assert!(keywords.is_empty());

    let store = PgStore::new(pool);
    let totals = store
        .list_points(&UserId::from("p@example.com"), PointsBucket::Genre)
        .await
        .expect("store list");
    assert_eq!(totals.get("music"), Some(&10));
    assert_eq!(totals.len(), 2);
}

// ---------------------------------------------------------------------------
// PgStore through the DocumentStore trait
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn pg_store_answers_collection_checks(pool: sqlx::PgPool) {
    let store = PgStore::new(pool.clone());
    let user = UserId::from("store@example.com");

    assert!(!store
        .collection_non_empty(&Subcollection::OwnPosts(user.clone()))
        .await
        .expect("empty posts"));

    seed_post(&pool, "store@example.com", 0, 3).await;
    seed_follow(&pool, "fan@example.com", "store@example.com").await;

    assert!(store
        .collection_non_empty(&Subcollection::OwnPosts(user.clone()))
        .await
        .expect("posts"));
    assert_eq!(
        store
            .collection_size(&Subcollection::Followers(user.clone()))
            .await
            .expect("followers"),
        1
    );
    assert!(!store
        .collection_non_empty(&Subcollection::Following(user))
        .await
        .expect("following"));
    store.ping().await.expect("ping");
}

#[sqlx::test(migrations = "../../migrations")]
async fn pg_store_round_trips_aggregate_patch(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let user = UserId::from("agg@example.com");
    let now = Utc::now();

    assert!(store.get_aggregate(&user).await.unwrap().is_none());

    store
        .put_aggregate(
            &user,
            &AggregatePatch {
                consecutive_login_days: Some(1),
                last_login_at: Some(now),
                current_login_at: Some(now),
                ..AggregatePatch::default()
            },
        )
        .await
        .expect("put");

    let agg = store.get_aggregate(&user).await.unwrap().expect("exists");
    assert_eq!(agg.consecutive_login_days, 1);
    assert!(agg.last_login_at.is_some());
    assert_eq!(agg.tribe, "rookie");
}
