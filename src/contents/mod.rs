use crate::state::AppState;
use axum::Router;

mod dto;
mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Content CRUD and image upload, mounted under the admin prefix.
pub fn router() -> Router<AppState> {
    handlers::routes()
}
