use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    error::{ApiError, JsonBody},
    feedback::repo::Feedback,
    state::AppState,
    validation::{normalize_email, Checks},
};

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub saved_feed: Feedback,
}

pub fn feedback_routes() -> Router<AppState> {
    Router::new().route("/addfeedback", post(add_feedback))
}

#[instrument(skip(state, payload))]
pub async fn add_feedback(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    Checks::new()
        .required("name", &payload.name, "Name is required")
        .email("email", &payload.email, "Enter a valid email")
        .required("feedback", &payload.feedback, "Feedback cannot be blank")
        .finish()?;

    let saved_feed = state
        .feedback
        .insert(
            payload.name.trim(),
            &normalize_email(&payload.email),
            payload.feedback.trim(),
        )
        .await?;

    info!(feedback_id = %saved_feed.id, "feedback received");
    Ok(Json(FeedbackResponse { saved_feed }))
}
