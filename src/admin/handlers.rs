use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    admin::repo::Admin,
    auth::{
        dto::AuthResponse,
        extractors::AuthAdmin,
        password::{hash_password_blocking, verify_password_blocking},
    },
    db::RepoError,
    error::{ApiError, JsonBody},
    state::AppState,
    validation::Checks,
};

const USERNAME_TAKEN: &str = "User with this username already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct AdminCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub passkey: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub success: bool,
    pub message: &'static str,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/admin-login", post(admin_login))
        .route("/dashboard", get(dashboard))
        .route("/remove/:id", delete(remove))
}

/// Open while no admin exists; afterwards only an admin can add another.
/// The anonymous path creates the first admin atomically.
#[instrument(skip(state, caller, payload))]
pub async fn register(
    State(state): State<AppState>,
    caller: Option<AuthAdmin>,
    JsonBody(payload): JsonBody<AdminCredentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    Checks::new()
        .required("username", &payload.username, "Username is required")
        .min_len(
            "passkey",
            &payload.passkey,
            6,
            "Passkey must be at least 6 characters long",
        )
        .finish()?;

    let username = payload.username.trim().to_string();
    let admin = match &caller {
        None => {
            let hash = hash_password_blocking(payload.passkey).await?;
            let Some(admin) = state.admins.create_first(&username, &hash).await? else {
                warn!("admin registration without admin token after bootstrap");
                return Err(ApiError::Unauthenticated);
            };
            admin
        }
        Some(_) => {
            if state.admins.find_by_username(&username).await?.is_some() {
                return Err(ApiError::Conflict(USERNAME_TAKEN.into()));
            }
            let hash = hash_password_blocking(payload.passkey).await?;
            state
                .admins
                .create(&username, &hash)
                .await
                .map_err(|e| match e {
                    RepoError::Conflict => ApiError::Conflict(USERNAME_TAKEN.into()),
                    other => other.into(),
                })?
        }
    };

    let auth_token = state.admin_tokens.issue(admin.id, &admin.username)?;
    info!(admin_id = %admin.id, by = ?caller.map(|c| c.id), "admin registered");
    Ok(Json(AuthResponse {
        success: true,
        auth_token,
        user_id: admin.id,
    }))
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AdminCredentials>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    Checks::new()
        .required("username", &payload.username, "Username is required")
        .required("passkey", &payload.passkey, "Passkey is required")
        .finish()?;

    let Some(admin) = state
        .admins
        .find_by_username(payload.username.trim())
        .await?
    else {
        warn!(username = %payload.username, "admin login unknown username");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
    };

    if !verify_password_blocking(payload.passkey, admin.passkey_hash.clone()).await? {
        warn!(admin_id = %admin.id, "admin login invalid passkey");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    let token = state.admin_tokens.issue(admin.id, &admin.username)?;
    info!(admin_id = %admin.id, "admin logged in");
    Ok(Json(AdminLoginResponse {
        success: true,
        token,
    }))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AuthAdmin,
) -> Result<Json<Vec<Admin>>, ApiError> {
    let admins = state.admins.list().await?;
    if admins.is_empty() {
        return Err(ApiError::NotFound("No admins found"));
    }
    Ok(Json(admins))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<String>,
) -> Result<Json<RemoveResponse>, ApiError> {
    let id = Uuid::parse_str(id.trim())
        .map_err(|_| ApiError::BadRequest("Invalid admin ID format.".into()))?;
    if id == admin.id {
        warn!(admin_id = %id, "admin tried to remove itself");
        return Err(ApiError::Forbidden("You cannot remove yourself."));
    }
    if !state.admins.delete(id).await? {
        return Err(ApiError::NotFound("Admin not found."));
    }
    info!(removed = %id, by = %admin.username, "admin removed");
    Ok(Json(RemoveResponse {
        success: true,
        message: "Admin removed successfully.",
    }))
}
