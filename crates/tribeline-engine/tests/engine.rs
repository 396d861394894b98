//! End-to-end engine behaviour against the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use tribeline_core::{StreakUpdate, UserAggregate, UserId, STREAK_BASE};
use tribeline_engine::{
    ActivityKind, ClaimOutcome, Engine, EngineError, ManualClock, MemoryStore, NotificationStatus,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 10, 18, 30, 0).single().unwrap()
}

struct Harness {
    engine: Engine<MemoryStore>,
    store: MemoryStore,
    clock: Arc<ManualClock>,
}

fn harness_with_offset(offset: FixedOffset) -> Harness {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(start()));
    let engine = Engine::with_clock(store.clone(), offset, clock.clone());
    Harness {
        engine,
        store,
        clock,
    }
}

fn harness() -> Harness {
    harness_with_offset(FixedOffset::east_opt(0).unwrap())
}

fn alice() -> UserId {
    UserId::from("alice@example.com")
}

// ---------------------------------------------------------------------------
// Login streaks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_day_login_twice_keeps_the_streak() {
    let h = harness();
    h.engine.record_login(&alice()).await.unwrap();
    let after_first = h.store.aggregate(&alice()).await.unwrap().consecutive_login_days;

    h.clock.advance(Duration::hours(2));
    h.engine.record_login(&alice()).await.unwrap();
    let after_second = h.store.aggregate(&alice()).await.unwrap().consecutive_login_days;

    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn login_the_day_after_increments_the_streak() {
    let h = harness();
    let mut agg = UserAggregate::new(alice());
    agg.consecutive_login_days = 4;
    agg.last_login_at = Some(start() - Duration::days(1));
    agg.current_login_at = agg.last_login_at;
    h.store.insert_aggregate(agg).await;

    let report = h.engine.record_login(&alice()).await.unwrap();
    assert_eq!(report.update, StreakUpdate::Extended);
    assert_eq!(report.consecutive_login_days, 5);
}

#[tokio::test]
async fn login_after_three_days_resets_to_base() {
    let h = harness();
    let mut agg = UserAggregate::new(alice());
    agg.consecutive_login_days = 6;
    agg.last_login_at = Some(start() - Duration::days(3));
    h.store.insert_aggregate(agg).await;

    let report = h.engine.record_login(&alice()).await.unwrap();
    assert_eq!(report.consecutive_login_days, STREAK_BASE);
    assert_eq!(
        h.store.aggregate(&alice()).await.unwrap().last_login_at,
        Some(start())
    );
}

#[tokio::test]
async fn calendar_days_follow_the_configured_offset() {
    // 18:30 UTC on July 10 is already July 11 at +08:00.
    let h = harness_with_offset(FixedOffset::east_opt(8 * 3600).unwrap());
    let mut agg = UserAggregate::new(alice());
    agg.consecutive_login_days = 2;
    agg.last_login_at = Some(start() - Duration::hours(8));
    h.store.insert_aggregate(agg).await;

    let report = h.engine.record_login(&alice()).await.unwrap();
    assert_eq!(report.update, StreakUpdate::Extended);
    assert_eq!(report.consecutive_login_days, 3);
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn like_challenge_boundary() {
    let h = harness();
    let mut agg = UserAggregate::new(alice());
    agg.likes_given = 4;
    h.store.insert_aggregate(agg.clone()).await;
    assert!(!h.engine.evaluate(4, &alice()).await.unwrap());

    agg.likes_given = 5;
    h.store.insert_aggregate(agg).await;
    assert!(h.engine.evaluate(4, &alice()).await.unwrap());
}

#[tokio::test]
async fn weekly_posts_window() {
    let h = harness();
    for days in [1, 3, 6] {
        h.store.add_post(&alice(), start() - Duration::days(days), 0).await;
    }
    assert!(h.engine.evaluate(8, &alice()).await.unwrap());

    let h = harness();
    for days in [1, 3, 8] {
        h.store.add_post(&alice(), start() - Duration::days(days), 0).await;
    }
    assert!(!h.engine.evaluate(8, &alice()).await.unwrap());
}

#[tokio::test]
async fn same_day_posts_count_once_for_the_marathon() {
    let h = harness();
    for days in 1..30 {
        h.store.add_post(&alice(), start() - Duration::days(days), 0).await;
    }
    // Two posts today: still 30 distinct days, not 31 posts' worth.
    h.store.add_post(&alice(), start() - Duration::hours(3), 0).await;
    h.store.add_post(&alice(), start() - Duration::hours(1), 0).await;
    assert!(h.engine.evaluate(14, &alice()).await.unwrap());

    let h = harness();
    for days in 1..29 {
        h.store.add_post(&alice(), start() - Duration::days(days), 0).await;
    }
    h.store.add_post(&alice(), start() - Duration::hours(3), 0).await;
    h.store.add_post(&alice(), start() - Duration::hours(1), 0).await;
    assert!(!h.engine.evaluate(14, &alice()).await.unwrap());
}

#[tokio::test]
async fn any_single_viral_post_is_enough() {
    let h = harness();
    for votes in [5, 25, 3] {
        h.store.add_post(&alice(), start(), votes).await;
    }
    assert!(h.engine.evaluate(11, &alice()).await.unwrap());
}

#[tokio::test]
async fn unknown_user_fails_aggregate_predicates_without_error() {
    let h = harness();
    let ghost = UserId::from("ghost@example.com");
    for id in [2, 4, 5, 6, 7, 9, 12, 13, 15, 16, 17] {
        assert!(!h.engine.evaluate(id, &ghost).await.unwrap());
    }
}

#[tokio::test]
async fn challenge_eighteen_is_invalid() {
    let h = harness();
    let err = h.engine.evaluate(18, &alice()).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidChallengeId(18)));
}

#[tokio::test]
async fn tribal_notification_is_written_once() {
    let h = harness();
    let mut agg = UserAggregate::new(alice());
    agg.tribe = "falcons".to_string();
    h.store.insert_aggregate(agg).await;

    let outcome = h.engine.evaluate_and_notify(9, &alice()).await.unwrap();
    assert_eq!(outcome.notification, NotificationStatus::Sent);

    let challenge_notes: Vec<_> = h
        .engine
        .list_notifications(&alice())
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.category == "challenge")
        .collect();
    assert_eq!(challenge_notes.len(), 1);
}

// ---------------------------------------------------------------------------
// Application flows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn a_week_of_logins_then_claiming_daily_active() {
    let h = harness();
    for _ in 0..7 {
        h.engine.record_login(&alice()).await.unwrap();
        h.clock.advance(Duration::days(1));
    }

    let outcome = h.engine.claim(5, &alice()).await.unwrap();
    assert!(matches!(
        outcome,
        ClaimOutcome::Claimed {
            stars_awarded: 2,
            total_stars: 2,
            ..
        }
    ));
    assert_eq!(
        h.engine.claim(5, &alice()).await.unwrap(),
        ClaimOutcome::AlreadyClaimed
    );
}

#[tokio::test]
async fn registration_is_idempotent() {
    let h = harness();
    let first = h.engine.register(&alice()).await.unwrap();
    assert_eq!(first.tribe, "rookie");
    assert_eq!(first.star_count, 0);

    h.engine.join_tribe(&alice(), "falcons", None).await.unwrap();
    let second = h.engine.register(&alice()).await.unwrap();
    assert_eq!(second.tribe, "falcons");
}

#[tokio::test]
async fn commenting_streak_claims_the_commenter_challenge() {
    let h = harness();
    let mut claimed = Vec::new();
    for _ in 0..10 {
        let report = h
            .engine
            .record_activity(&alice(), ActivityKind::Comment)
            .await
            .unwrap();
        claimed.extend(report.claimed);
    }
    assert_eq!(claimed, vec![6]);
    assert_eq!(h.store.aggregate(&alice()).await.unwrap().comment_count, 10);
}
