use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    appointments::repo::{Appointment, NewAppointment},
    auth::extractors::AuthUser,
    error::{ApiError, JsonBody},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub appointment_date: String,
    pub property_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub message: &'static str,
    pub appointment: Appointment,
}

pub fn appointment_routes() -> Router<AppState> {
    Router::new().route("/addappointment", post(add_appointment))
}

/// Works with or without a user token; a valid one links the booking to the user.
#[instrument(skip(state, payload))]
pub async fn add_appointment(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    JsonBody(payload): JsonBody<AppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ApiError> {
    let fields = [
        &payload.name,
        &payload.email,
        &payload.mobile,
        &payload.appointment_date,
    ];
    if fields.iter().any(|v| v.trim().is_empty()) {
        return Err(ApiError::BadRequest("Please provide all fields".into()));
    }

    let property_id = match payload.property_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let id = Uuid::parse_str(raw)
                .map_err(|_| ApiError::BadRequest("Invalid property ID format.".into()))?;
            state.listings.find(id).await?;
            Some(id)
        }
    };

    let appointment = state
        .appointments
        .insert(NewAppointment {
            user_id: user.map(|u| u.id),
            property_id,
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            mobile: payload.mobile.trim().to_string(),
            appointment_date: payload.appointment_date,
        })
        .await?;

    info!(appointment_id = %appointment.id, property_id = ?appointment.property_id, "appointment booked");
    Ok((
        StatusCode::CREATED,
        Json(AppointmentResponse {
            message: "Appointment added successfully",
            appointment,
        }),
    ))
}
