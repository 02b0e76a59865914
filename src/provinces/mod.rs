use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo;

pub fn router(state: &AppState) -> Router<AppState> {
    handlers::router(state)
}
