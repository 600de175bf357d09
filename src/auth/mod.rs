use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Public routes: login and registration.
pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

/// Routes for the authenticated caller's own account.
pub fn me_router() -> Router<AppState> {
    handlers::me_routes()
}
