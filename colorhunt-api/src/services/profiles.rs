//! User profiles

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use colorhunt_common::db::User;
use colorhunt_common::{time, Error, Result};

use crate::db::{follows, users};
use crate::utils::{begin_monitored, retry_on_conflict};

const NAME_TAKEN: &str = "Username is already taken";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProfileRequest {
    pub display_name: Option<String>,
    #[serde(alias = "photoURL")]
    pub photo_url: Option<String>,
}

/// Public profile as seen by an (optionally signed-in) viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub is_following: bool,
}

/// Create or refresh the actor's profile
///
/// Display names are unique; blank fields clear the stored value.
pub async fn sync_profile(
    db: &SqlitePool,
    actor_id: &str,
    request: &SyncProfileRequest,
    max_wait_ms: u64,
) -> Result<User> {
    let display_name = non_blank(request.display_name.as_deref());
    let photo_url = non_blank(request.photo_url.as_deref());

    retry_on_conflict("sync_profile", max_wait_ms, || {
        upsert_once(db, actor_id, display_name, photo_url)
    })
    .await
}

async fn upsert_once(
    db: &SqlitePool,
    actor_id: &str,
    display_name: Option<&str>,
    photo_url: Option<&str>,
) -> Result<User> {
    let mut tx = begin_monitored(db, "profiles::sync_profile").await?;

    if let Some(name) = display_name {
        if let Some(holder) = users::find_by_display_name(tx.conn(), name).await? {
            if holder != actor_id {
                return Err(Error::InvalidInput(NAME_TAKEN.to_string()));
            }
        }
    }

    users::upsert_profile(tx.conn(), actor_id, display_name, photo_url, &time::now())
        .await
        .map_err(|e| match e {
            Error::Database(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                Error::InvalidInput(NAME_TAKEN.to_string())
            }
            other => other,
        })?;

    let user = users::load_user(tx.conn(), actor_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Profile {} vanished after upsert", actor_id)))?;

    tx.commit().await?;

    tracing::info!(user_id = %actor_id, "Profile synced");

    Ok(user)
}

/// Profile of `user_id`, with whether `viewer_id` follows them
pub async fn get_profile(db: &SqlitePool, user_id: &str, viewer_id: Option<&str>) -> Result<UserProfile> {
    let mut conn = db.acquire().await?;

    let user = users::load_user(&mut conn, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))?;

    let is_following = match viewer_id {
        Some(viewer) if viewer != user_id => follows::follow_exists(&mut conn, viewer, user_id).await?,
        _ => false,
    };

    Ok(UserProfile { user, is_following })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
