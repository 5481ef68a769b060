use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;


pub fn router() -> Router<AppState> {
    handlers::feedback_routes()
}
