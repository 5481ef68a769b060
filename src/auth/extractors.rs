use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use super::{claims::Claims, jwt::JwtKeys};
use crate::{error::ApiError, state::AppState};

/// Header carrying the identity token. Not a bearer scheme.
pub const AUTH_HEADER: &str = "auth-token";

/// An authenticated end user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
}

/// An authenticated administrator.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub id: Uuid,
    pub username: String,
}

// Missing and invalid tokens are reported identically.
fn authenticate(parts: &Parts, keys: &JwtKeys) -> Result<Claims, ApiError> {
    let token = parts
        .headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthenticated)?;

    keys.verify(token).map_err(|e| {
        warn!(error = %e, domain = ?keys.domain(), "rejected token");
        ApiError::Unauthenticated
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = authenticate(parts, &state.user_tokens)?;
        Ok(AuthUser {
            id: claims.sub,
            name: claims.name,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = authenticate(parts, &state.admin_tokens)?;
        // tokens outlive removed admins
        let Some(admin) = state.admins.find_by_id(claims.sub).await? else {
            warn!(admin_id = %claims.sub, "token for removed admin");
            return Err(ApiError::Unauthenticated);
        };
        Ok(AuthAdmin {
            id: admin.id,
            username: admin.username,
        })
    }
}
