//! Completed-pack feed

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;

use colorhunt_common::db::{Pack, VoteState};
use colorhunt_common::{Error, Result};

use crate::db::{packs, users, votes};

pub const FEED_SIZE: i64 = 20;

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFilter {
    #[default]
    All,
    Following,
}

/// Display details of a pack's owner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedOwner {
    pub user_id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    #[serde(flatten)]
    pub pack: Pack,
    pub owner: FeedOwner,
    /// Viewer's current vote; 0 for anonymous viewers
    pub user_vote: VoteState,
}

/// Latest complete packs, newest completion first
///
/// `Following` needs a signed-in viewer and narrows the feed to owners that
/// viewer follows.
pub async fn load_feed(db: &SqlitePool, viewer_id: Option<&str>, filter: FeedFilter) -> Result<Vec<FeedItem>> {
    let followed_by = match (filter, viewer_id) {
        (FeedFilter::All, _) => None,
        (FeedFilter::Following, Some(viewer)) => Some(viewer),
        (FeedFilter::Following, None) => {
            return Err(Error::Unauthorized(
                "Sign in to see packs from people you follow".to_string(),
            ))
        }
    };

    let mut conn = db.acquire().await?;
    let completed = packs::list_completed(&mut conn, followed_by, FEED_SIZE).await?;

    let mut owners: HashMap<String, FeedOwner> = HashMap::new();
    let mut items = Vec::with_capacity(completed.len());
    for pack in completed {
        let owner = match owners.get(&pack.owner_user_id) {
            Some(owner) => owner.clone(),
            None => {
                let user = users::load_user(&mut conn, &pack.owner_user_id).await?;
                let owner = FeedOwner {
                    user_id: pack.owner_user_id.clone(),
                    display_name: user
                        .as_ref()
                        .and_then(|u| u.display_name.clone())
                        .unwrap_or_else(|| ANONYMOUS.to_string()),
                    photo_url: user.and_then(|u| u.photo_url),
                };
                owners.insert(pack.owner_user_id.clone(), owner.clone());
                owner
            }
        };

        let user_vote = match viewer_id {
            Some(viewer) => VoteState::from_edge(votes::load_vote(&mut conn, &pack.id, viewer).await?),
            None => VoteState::None,
        };

        items.push(FeedItem { pack, owner, user_vote });
    }

    tracing::debug!(?filter, viewer = ?viewer_id, items = items.len(), "Feed loaded");

    Ok(items)
}
