use crate::state::AppState;
use axum::Router;

pub mod cookie;
mod dto;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod session;
pub mod store;

pub fn router(state: &AppState) -> Router<AppState> {
    handlers::router(state)
}
