//! Bearer token extraction
//!
//! Authenticated handlers take `AuthUser` as their first extractor, so a
//! missing or bad token is rejected before the body is even parsed.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::ApiError;
use crate::AppState;

/// Acting user resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Acting user when a valid token is present; anonymous otherwise
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Authorization header is not valid text".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".to_string()))?;
    Ok(Some(token))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
        let user_id = state.identity.verify_token(token).await?;
        Ok(AuthUser { user_id })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // An unusable token on a public route is treated as anonymous
        let user = match bearer_token(parts) {
            Ok(Some(token)) => state
                .identity
                .verify_token(token)
                .await
                .ok()
                .map(|user_id| AuthUser { user_id }),
            _ => None,
        };
        Ok(MaybeAuthUser(user))
    }
}
