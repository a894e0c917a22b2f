//! Votes, follows and comments keep their denormalized counters in step with the edges

mod helpers;

use colorhunt_api::db::{comments, follows, votes};
use colorhunt_api::services::counters::{
    add_comment, delete_comment, list_comments, toggle_follow, toggle_like, toggle_vote, MAX_COMMENT_CHARS,
};
use colorhunt_common::db::VoteState;
use colorhunt_common::Error;
use helpers::{TestContext, TEST_MAX_WAIT_MS};
use tokio::task::JoinSet;

async fn edge_sum(ctx: &TestContext, pack_id: &str) -> i64 {
    let mut conn = ctx.db.acquire().await.unwrap();
    votes::sum_votes(&mut conn, pack_id).await.unwrap()
}

// ============================================================================
// Votes
// ============================================================================

#[tokio::test]
async fn test_repeated_vote_is_idempotent() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;

    let first = toggle_vote(&ctx.db, "voter", &pack.id, VoteState::Up, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert!(first.changed);
    assert_eq!(first.likes_count, 1);

    let second = toggle_vote(&ctx.db, "voter", &pack.id, VoteState::Up, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert!(!second.changed);
    assert_eq!(second.previous, VoteState::Up);
    assert_eq!(second.likes_count, 1);

    assert_eq!(ctx.likes_count(&pack.id).await, 1);
}

#[tokio::test]
async fn test_flipping_vote_moves_counter_by_two() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;

    toggle_vote(&ctx.db, "voter", &pack.id, VoteState::Up, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    let down = toggle_vote(&ctx.db, "voter", &pack.id, VoteState::Down, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert_eq!(down.previous, VoteState::Up);
    assert_eq!(down.current, VoteState::Down);
    assert_eq!(down.likes_count, -1);

    let cleared = toggle_vote(&ctx.db, "voter", &pack.id, VoteState::None, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert_eq!(cleared.likes_count, 0);

    let mut conn = ctx.db.acquire().await.unwrap();
    assert_eq!(votes::load_vote(&mut conn, &pack.id, "voter").await.unwrap(), None);
}

#[tokio::test]
async fn test_clearing_absent_vote_is_noop() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;

    let outcome = toggle_vote(&ctx.db, "voter", &pack.id, VoteState::None, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.likes_count, 0);
}

#[tokio::test]
async fn test_legacy_vote_without_value_counts_as_up() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;

    sqlx::query(
        "INSERT INTO votes (pack_id, user_id, vote, created_at, updated_at) \
         VALUES (?, 'legacy', NULL, '2025-01-01T00:00:00.000Z', '2025-01-01T00:00:00.000Z')",
    )
    .bind(&pack.id)
    .execute(&ctx.db)
    .await
    .unwrap();
    sqlx::query("UPDATE packs SET likes_count = 1 WHERE id = ?")
        .bind(&pack.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    assert_eq!(edge_sum(&ctx, &pack.id).await, 1);

    // The legacy edge reads as +1, so the like toggle removes it
    let outcome = toggle_like(&ctx.db, "legacy", &pack.id, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert_eq!(outcome.previous, VoteState::Up);
    assert_eq!(outcome.current, VoteState::None);
    assert_eq!(outcome.likes_count, 0);
    assert_eq!(edge_sum(&ctx, &pack.id).await, 0);
}

#[tokio::test]
async fn test_like_toggles_between_up_and_none() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;

    let liked = toggle_like(&ctx.db, "fan", &pack.id, TEST_MAX_WAIT_MS).await.unwrap();
    assert_eq!(liked.current, VoteState::Up);
    assert_eq!(liked.likes_count, 1);

    let unliked = toggle_like(&ctx.db, "fan", &pack.id, TEST_MAX_WAIT_MS).await.unwrap();
    assert_eq!(unliked.current, VoteState::None);
    assert_eq!(unliked.likes_count, 0);

    // A down-vote is replaced by a like
    toggle_vote(&ctx.db, "fan", &pack.id, VoteState::Down, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    let relike = toggle_like(&ctx.db, "fan", &pack.id, TEST_MAX_WAIT_MS).await.unwrap();
    assert_eq!(relike.previous, VoteState::Down);
    assert_eq!(relike.likes_count, 1);
}

#[tokio::test]
async fn test_vote_on_missing_pack_is_not_found() {
    let ctx = TestContext::new().await;

    let result = toggle_vote(&ctx.db, "voter", "no-such-pack", VoteState::Up, TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let result = toggle_like(&ctx.db, "voter", "", TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_concurrent_votes_match_edge_sum() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;

    let mut tasks = JoinSet::new();
    for voter in 0..12 {
        let db = ctx.db.clone();
        let pack_id = pack.id.clone();
        tasks.spawn(async move {
            let user = format!("voter-{}", voter % 4);
            let desired = match voter % 3 {
                0 => VoteState::Up,
                1 => VoteState::Down,
                _ => VoteState::None,
            };
            toggle_vote(&db, &user, &pack_id, desired, TEST_MAX_WAIT_MS).await?;
            toggle_like(&db, &user, &pack_id, TEST_MAX_WAIT_MS).await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(ctx.likes_count(&pack.id).await, edge_sum(&ctx, &pack.id).await);
}

// ============================================================================
// Follows
// ============================================================================

#[tokio::test]
async fn test_follow_toggle_is_its_own_inverse() {
    let ctx = TestContext::new().await;
    ctx.user("alice", "Alice").await;
    ctx.user("bob", "Bob").await;

    let followed = toggle_follow(&ctx.db, "alice", "bob", TEST_MAX_WAIT_MS).await.unwrap();
    assert!(followed.following);
    assert_eq!(followed.following_count, 1);
    assert_eq!(followed.followers_count, 1);
    assert_eq!(ctx.follow_counts("alice").await, (0, 1));
    assert_eq!(ctx.follow_counts("bob").await, (1, 0));

    let unfollowed = toggle_follow(&ctx.db, "alice", "bob", TEST_MAX_WAIT_MS).await.unwrap();
    assert!(!unfollowed.following);
    assert_eq!(ctx.follow_counts("alice").await, (0, 0));
    assert_eq!(ctx.follow_counts("bob").await, (0, 0));

    let mut conn = ctx.db.acquire().await.unwrap();
    assert!(!follows::follow_exists(&mut conn, "alice", "bob").await.unwrap());
}

#[tokio::test]
async fn test_self_follow_rejected() {
    let ctx = TestContext::new().await;
    ctx.user("alice", "Alice").await;

    let result = toggle_follow(&ctx.db, "alice", "alice", TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(ctx.follow_counts("alice").await, (0, 0));
}

#[tokio::test]
async fn test_follow_unknown_user_not_found() {
    let ctx = TestContext::new().await;
    ctx.user("alice", "Alice").await;

    let result = toggle_follow(&ctx.db, "alice", "ghost", TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(ctx.follow_counts("alice").await, (0, 0));
}

#[tokio::test]
async fn test_concurrent_follows_match_edges() {
    let ctx = TestContext::new().await;
    let names = ["ann", "ben", "cat", "dan"];
    for name in names {
        ctx.user(name, name).await;
    }

    let mut tasks = JoinSet::new();
    for (i, follower) in names.iter().enumerate() {
        for (j, following) in names.iter().enumerate() {
            if i == j {
                continue;
            }
            // Odd pairs toggle twice and end unfollowed
            let times = if (i + j) % 2 == 0 { 1 } else { 2 };
            let db = ctx.db.clone();
            let (follower, following) = (follower.to_string(), following.to_string());
            tasks.spawn(async move {
                for _ in 0..times {
                    toggle_follow(&db, &follower, &following, TEST_MAX_WAIT_MS).await?;
                }
                Ok::<_, Error>(())
            });
        }
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let mut conn = ctx.db.acquire().await.unwrap();
    for name in names {
        let edges = follows::count_edges(&mut conn, name).await.unwrap();
        assert_eq!(ctx.follow_counts(name).await, edges, "counters drifted for {}", name);
    }
}

// ============================================================================
// Comments
// ============================================================================

#[tokio::test]
async fn test_comment_add_and_delete_track_count() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;
    ctx.user("alice", "Alice").await;

    let comment = add_comment(&ctx.db, "alice", &pack.id, "  Lovely reds  ", TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert_eq!(comment.text, "Lovely reds");
    assert_eq!(comment.user_display_name, "Alice");

    let anonymous = add_comment(&ctx.db, "stranger", &pack.id, "nice", TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert_eq!(anonymous.user_display_name, "Anonymous");

    let listed = list_comments(&ctx.db, &pack.id).await.unwrap();
    assert_eq!(listed.len(), 2);

    let deleted = delete_comment(&ctx.db, "alice", &comment.id, TEST_MAX_WAIT_MS)
        .await
        .unwrap();
    assert_eq!(deleted.pack_id, pack.id);
    assert_eq!(deleted.comments_count, 1);

    let mut conn = ctx.db.acquire().await.unwrap();
    assert_eq!(comments::count_comments(&mut conn, &pack.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_only_author_deletes_comment() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;
    let comment = add_comment(&ctx.db, "alice", &pack.id, "mine", TEST_MAX_WAIT_MS)
        .await
        .unwrap();

    let result = delete_comment(&ctx.db, "mallory", &comment.id, TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::Forbidden(_))));

    let result = delete_comment(&ctx.db, "alice", "missing", TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let stored = colorhunt_api::services::packs::get_pack(&ctx.db, &pack.id).await.unwrap();
    assert_eq!(stored.comments_count, 1);
}

#[tokio::test]
async fn test_comment_text_rules() {
    let ctx = TestContext::new().await;
    let pack = ctx.crimson_pack("owner").await;

    let result = add_comment(&ctx.db, "alice", &pack.id, "   ", TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let long = "x".repeat(MAX_COMMENT_CHARS + 1);
    let result = add_comment(&ctx.db, "alice", &pack.id, &long, TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let result = add_comment(&ctx.db, "alice", "no-such-pack", "hello", TEST_MAX_WAIT_MS).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}
