use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, ChangePasswordRequest, GoogleLoginRequest, LoginRequest, MessageResponse, ProfileQuery},
        extractors::AuthUser,
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{NewUser, PublicProfile, User, UserPatch},
    },
    db::RepoError,
    error::{ApiError, JsonBody},
    images::services::{discard_image, read_form, store_image, ImageFolder},
    state::AppState,
    validation::{is_valid_email, normalize_email, Checks},
};

pub const INVALID_CREDENTIALS: &str = "Please try to login with correct credentials";
pub const EMAIL_TAKEN: &str = "User with this email already exists";
const INVALID_ID: &str = "Invalid user ID format.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/google-login", post(google_login))
        .route("/change-password", post(change_password))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/:id", get(get_public_profile))
        .route("/profileq", get(get_profile_by_query))
        .route("/update-profile", put(update_profile))
}

fn issue_user_token(state: &AppState, user: &User) -> Result<Json<AuthResponse>, ApiError> {
    let auth_token = state.user_tokens.issue(user.id, &user.name)?;
    Ok(Json(AuthResponse {
        success: true,
        auth_token,
        user_id: user.id,
    }))
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(INVALID_ID.into()))
}

#[instrument(skip(state, mp))]
pub async fn signup(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<Json<AuthResponse>, ApiError> {
    let form = read_form(mp, "photo").await?;
    let name = form.text("name");
    let email = form.text("email");
    let contact = form.text("contact");
    let address = form.text("address");
    let password = form.text("password");

    Checks::new()
        .min_len("name", &name, 3, "Enter a valid name")
        .email("email", &email, "Enter a valid email")
        .min_len("contact", &contact, 10, "Enter a valid mobile number")
        .min_len("address", &address, 5, "Proper address must be given")
        .min_len("password", &password, 8, "Password must be at least 8 characters long")
        .finish()?;

    let email = normalize_email(&email);
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
    }

    let password_hash = hash_password_blocking(password).await?;

    let photo = match form.image {
        Some(item) => Some(store_image(state.storage.as_ref(), ImageFolder::Profile, item).await?),
        None => None,
    };

    let created = state
        .users
        .create(NewUser {
            name: name.trim().to_string(),
            email,
            contact: contact.trim().to_string(),
            address: address.trim().to_string(),
            photo: photo.as_ref().map(|p| p.url.clone()),
            password_hash: Some(password_hash),
        })
        .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            if let Some(p) = &photo {
                discard_image(state.storage.as_ref(), &p.key).await;
            }
            return Err(match e {
                RepoError::Conflict => ApiError::Conflict(EMAIL_TAKEN.into()),
                other => other.into(),
            });
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    issue_user_token(&state, &user)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    Checks::new()
        .email("email", &payload.email, "Enter a valid email")
        .required("password", &payload.password, "Password cannot be blank")
        .finish()?;

    let email = normalize_email(&payload.email);
    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
    };

    let Some(hash) = user.password_hash.clone() else {
        warn!(user_id = %user.id, "password login on social-only account");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
    };

    if !verify_password_blocking(payload.password, hash).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    info!(user_id = %user.id, "user logged in");
    issue_user_token(&state, &user)
}

#[instrument(skip(state, payload))]
pub async fn google_login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.token.trim().is_empty() {
        return Err(ApiError::BadRequest("No token provided".into()));
    }

    let identity = state.identity.verify(payload.token.trim()).await.map_err(|e| {
        warn!(error = ?e, "google token rejected");
        ApiError::BadRequest("Google login failed".into())
    })?;

    let email = normalize_email(&identity.email);
    let user = match state.users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            let created = state
                .users
                .create(NewUser {
                    name: identity.name,
                    email: email.clone(),
                    contact: String::new(),
                    address: String::new(),
                    photo: identity.picture,
                    password_hash: None,
                })
                .await;
            match created {
                Ok(user) => {
                    info!(user_id = %user.id, "user registered via google");
                    user
                }
                // lost a race with a concurrent first login
                Err(RepoError::Conflict) => state
                    .users
                    .find_by_email(&email)
                    .await?
                    .ok_or(ApiError::Conflict(EMAIL_TAKEN.into()))?,
                Err(e) => return Err(e.into()),
            }
        }
    };

    issue_user_token(&state, &user)
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<User>, ApiError> {
    let found = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(found))
}

#[instrument(skip(state))]
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    let id = parse_user_id(&id)?;
    let found = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("User not found."))?;
    Ok(Json(found.into()))
}

#[instrument(skip(state))]
pub async fn get_profile_by_query(
    State(state): State<AppState>,
    Query(q): Query<ProfileQuery>,
) -> Result<Json<User>, ApiError> {
    let id = parse_user_id(q.user.as_deref().unwrap_or_default())?;
    let found = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("User not found."))?;
    Ok(Json(found))
}

#[instrument(skip(state, mp))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> Result<Json<User>, ApiError> {
    let form = read_form(mp, "profileImage").await?;
    let mut patch = UserPatch {
        name: form.non_blank("name"),
        email: form.non_blank("email").map(|e| normalize_email(&e)),
        contact: form.non_blank("contact"),
        address: form.non_blank("address"),
        photo: None,
    };

    if let Some(email) = &patch.email {
        if !is_valid_email(email) {
            return Err(ApiError::Validation(vec![crate::error::FieldError {
                field: "email",
                msg: "Enter a valid email",
            }]));
        }
        if let Some(other) = state.users.find_by_email(email).await? {
            if other.id != user.id {
                return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
            }
        }
    }

    let stored = match form.image {
        Some(item) => Some(store_image(state.storage.as_ref(), ImageFolder::Profile, item).await?),
        None => None,
    };
    patch.photo = stored.as_ref().map(|s| s.url.clone());

    let result = state.users.update_profile(user.id, patch).await;
    let updated = match result {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            if let Some(s) = &stored {
                discard_image(state.storage.as_ref(), &s.key).await;
            }
            return Err(ApiError::NotFound("User not found"));
        }
        Err(e) => {
            if let Some(s) = &stored {
                discard_image(state.storage.as_ref(), &s.key).await;
            }
            return Err(match e {
                RepoError::Conflict => ApiError::Conflict(EMAIL_TAKEN.into()),
                other => other.into(),
            });
        }
    };

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if [
        &payload.email,
        &payload.current_password,
        &payload.new_password,
        &payload.confirm_password,
    ]
    .iter()
    .any(|v| v.is_empty())
    {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let user = state
        .users
        .find_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let matches = match user.password_hash.clone() {
        Some(hash) => verify_password_blocking(payload.current_password, hash).await?,
        None => false,
    };
    if !matches {
        warn!(user_id = %user.id, "change-password with wrong current password");
        return Err(ApiError::BadRequest("Current password is incorrect".into()));
    }

    if payload.new_password != payload.confirm_password {
        return Err(ApiError::BadRequest("Passwords do not match".into()));
    }
    Checks::new()
        .min_len(
            "newPassword",
            &payload.new_password,
            8,
            "Password must be at least 8 characters long",
        )
        .finish()?;

    let hash = hash_password_blocking(payload.new_password).await?;
    if !state.users.set_password(user.id, &hash).await? {
        return Err(ApiError::NotFound("User not found"));
    }

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password updated successfully!",
    }))
}
