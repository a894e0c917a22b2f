//! Edge toggles and their denormalized counters
//!
//! Each operation reads the current edge, decides the delta, and writes the
//! edge together with the counter(s) in one transaction. Conflicting
//! concurrent toggles are rerun from the read, so every counter always
//! equals the sum over the edges that currently exist.

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use colorhunt_common::db::{Comment, VoteState, ANONYMOUS_DISPLAY_NAME};
use colorhunt_common::{time, Error, Result};

use crate::db::{comments, follows, packs, users, votes};
use crate::utils::{begin_monitored, retry_on_conflict};

/// Longest accepted comment, in characters
pub const MAX_COMMENT_CHARS: usize = 1000;

/// Comments returned per pack listing
pub const COMMENT_PAGE_SIZE: i64 = 50;

// ============================================================================
// Votes and likes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub pack_id: String,
    pub previous: VoteState,
    pub current: VoteState,
    pub likes_count: i64,
    /// False when the edge already had the requested state
    pub changed: bool,
}

/// Set the actor's vote on a pack to `desired`
pub async fn toggle_vote(
    db: &SqlitePool,
    actor_id: &str,
    pack_id: &str,
    desired: VoteState,
    max_wait_ms: u64,
) -> Result<VoteOutcome> {
    require_id(pack_id, "packId")?;
    retry_on_conflict("toggle_vote", max_wait_ms, || {
        apply_vote(db, actor_id, pack_id, move |_| desired)
    })
    .await
}

/// Binary like: no edge or a down-vote becomes +1, an up-vote is removed
pub async fn toggle_like(
    db: &SqlitePool,
    actor_id: &str,
    pack_id: &str,
    max_wait_ms: u64,
) -> Result<VoteOutcome> {
    require_id(pack_id, "packId")?;
    retry_on_conflict("toggle_like", max_wait_ms, || {
        apply_vote(db, actor_id, pack_id, |current| match current {
            VoteState::Up => VoteState::None,
            VoteState::Down | VoteState::None => VoteState::Up,
        })
    })
    .await
}

async fn apply_vote(
    db: &SqlitePool,
    actor_id: &str,
    pack_id: &str,
    choose: impl Fn(VoteState) -> VoteState,
) -> Result<VoteOutcome> {
    let mut tx = begin_monitored(db, "counters::apply_vote").await?;

    let pack = packs::require_pack_header(tx.conn(), pack_id).await?;
    let previous = VoteState::from_edge(votes::load_vote(tx.conn(), pack_id, actor_id).await?);
    let desired = choose(previous);

    if desired == previous {
        tx.rollback().await?;
        return Ok(VoteOutcome {
            pack_id: pack_id.to_string(),
            previous,
            current: previous,
            likes_count: pack.likes_count,
            changed: false,
        });
    }

    let now = time::now();
    match (previous.as_edge(), desired.as_edge()) {
        (Some(_), None) => votes::delete_vote(tx.conn(), pack_id, actor_id).await?,
        (Some(_), Some(value)) => votes::update_vote(tx.conn(), pack_id, actor_id, value, &now).await?,
        (None, Some(value)) => votes::insert_vote(tx.conn(), pack_id, actor_id, value, &now).await?,
        (None, None) => {}
    }

    let delta = desired.contribution() - previous.contribution();
    let likes_count = packs::adjust_likes(tx.conn(), pack_id, delta).await?;

    tx.commit().await?;

    tracing::debug!(
        pack_id = %pack_id,
        user_id = %actor_id,
        previous = previous.contribution(),
        current = desired.contribution(),
        likes_count,
        "Vote applied"
    );

    Ok(VoteOutcome {
        pack_id: pack_id.to_string(),
        previous,
        current: desired,
        likes_count,
        changed: true,
    })
}

// ============================================================================
// Follows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowOutcome {
    pub follower_id: String,
    pub following_id: String,
    /// Edge state after the toggle
    pub following: bool,
    /// Follower's `following_count` after the toggle
    pub following_count: i64,
    /// Target's `followers_count` after the toggle
    pub followers_count: i64,
}

/// Follow `target_user_id`, or unfollow if already following
pub async fn toggle_follow(
    db: &SqlitePool,
    actor_id: &str,
    target_user_id: &str,
    max_wait_ms: u64,
) -> Result<FollowOutcome> {
    require_id(target_user_id, "targetUserId")?;
    if actor_id == target_user_id {
        return Err(Error::InvalidInput("Cannot follow yourself".to_string()));
    }

    retry_on_conflict("toggle_follow", max_wait_ms, || {
        apply_follow(db, actor_id, target_user_id)
    })
    .await
}

async fn apply_follow(db: &SqlitePool, follower_id: &str, following_id: &str) -> Result<FollowOutcome> {
    let mut tx = begin_monitored(db, "counters::apply_follow").await?;

    for user_id in [follower_id, following_id] {
        if !users::user_exists(tx.conn(), user_id).await? {
            return Err(Error::NotFound(format!("User {} not found", user_id)));
        }
    }

    let was_following = follows::follow_exists(tx.conn(), follower_id, following_id).await?;
    let delta = if was_following {
        follows::delete_follow(tx.conn(), follower_id, following_id).await?;
        -1
    } else {
        follows::insert_follow(tx.conn(), follower_id, following_id, &time::now()).await?;
        1
    };

    let (following_count, followers_count) =
        users::adjust_follow_counts(tx.conn(), follower_id, following_id, delta).await?;

    tx.commit().await?;

    tracing::debug!(
        follower_id = %follower_id,
        following_id = %following_id,
        following = !was_following,
        "Follow toggled"
    );

    Ok(FollowOutcome {
        follower_id: follower_id.to_string(),
        following_id: following_id.to_string(),
        following: !was_following,
        following_count,
        followers_count,
    })
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDeleted {
    pub comment_id: String,
    pub pack_id: String,
    pub comments_count: i64,
}

/// Add a comment and bump the pack's `comments_count`
///
/// The author's display name and photo are copied onto the comment as they
/// are now; later profile edits do not rewrite old comments.
pub async fn add_comment(
    db: &SqlitePool,
    actor_id: &str,
    pack_id: &str,
    text: &str,
    max_wait_ms: u64,
) -> Result<Comment> {
    require_id(pack_id, "packId")?;
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidInput("text is required".to_string()));
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        return Err(Error::InvalidInput(format!(
            "text is longer than {} characters",
            MAX_COMMENT_CHARS
        )));
    }

    retry_on_conflict("add_comment", max_wait_ms, || {
        insert_comment_once(db, actor_id, pack_id, text)
    })
    .await
}

async fn insert_comment_once(db: &SqlitePool, actor_id: &str, pack_id: &str, text: &str) -> Result<Comment> {
    let mut tx = begin_monitored(db, "counters::add_comment").await?;

    packs::require_pack_header(tx.conn(), pack_id).await?;
    let author = users::load_user(tx.conn(), actor_id).await?;

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        pack_id: pack_id.to_string(),
        user_id: actor_id.to_string(),
        text: text.to_string(),
        user_display_name: author
            .as_ref()
            .and_then(|user| user.display_name.clone())
            .unwrap_or_else(|| ANONYMOUS_DISPLAY_NAME.to_string()),
        user_photo_url: author.and_then(|user| user.photo_url),
        created_at: time::now(),
    };

    comments::insert_comment(tx.conn(), &comment).await?;
    packs::adjust_comments(tx.conn(), pack_id, 1).await?;

    tx.commit().await?;

    tracing::debug!(pack_id = %pack_id, user_id = %actor_id, comment_id = %comment.id, "Comment added");

    Ok(comment)
}

/// Delete the actor's own comment and decrement the pack's `comments_count`
pub async fn delete_comment(
    db: &SqlitePool,
    actor_id: &str,
    comment_id: &str,
    max_wait_ms: u64,
) -> Result<CommentDeleted> {
    require_id(comment_id, "id")?;

    // Terminal errors are reported without opening a write transaction
    {
        let mut conn = db.acquire().await?;
        let comment = comments::load_comment(&mut conn, comment_id).await?;
        check_comment_owner(comment.as_ref(), actor_id, comment_id)?;
    }

    retry_on_conflict("delete_comment", max_wait_ms, || {
        delete_comment_once(db, actor_id, comment_id)
    })
    .await
}

async fn delete_comment_once(db: &SqlitePool, actor_id: &str, comment_id: &str) -> Result<CommentDeleted> {
    let mut tx = begin_monitored(db, "counters::delete_comment").await?;

    // Re-read: the comment may have been deleted since the first check
    let comment = comments::load_comment(tx.conn(), comment_id).await?;
    let comment = check_comment_owner(comment.as_ref(), actor_id, comment_id)?;

    if !comments::delete_comment(tx.conn(), comment_id).await? {
        return Err(Error::NotFound(format!("Comment {} not found", comment_id)));
    }
    let comments_count = packs::adjust_comments(tx.conn(), &comment.pack_id, -1).await?;

    tx.commit().await?;

    tracing::debug!(pack_id = %comment.pack_id, user_id = %actor_id, comment_id = %comment_id, "Comment deleted");

    Ok(CommentDeleted {
        comment_id: comment_id.to_string(),
        pack_id: comment.pack_id.clone(),
        comments_count,
    })
}

fn check_comment_owner<'a>(comment: Option<&'a Comment>, actor_id: &str, comment_id: &str) -> Result<&'a Comment> {
    let comment = comment.ok_or_else(|| Error::NotFound(format!("Comment {} not found", comment_id)))?;
    if comment.user_id != actor_id {
        return Err(Error::Forbidden("Only the author can delete a comment".to_string()));
    }
    Ok(comment)
}

/// Newest comments on a pack
pub async fn list_comments(db: &SqlitePool, pack_id: &str) -> Result<Vec<Comment>> {
    require_id(pack_id, "packId")?;
    let mut conn = db.acquire().await?;
    comments::list_comments(&mut conn, pack_id, COMMENT_PAGE_SIZE).await
}

fn require_id(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}
