use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;

#[cfg(test)]
mod tests;

pub fn router() -> Router<AppState> {
    handlers::appointment_routes()
}
