use crate::state::AppState;
use axum::Router;

mod dto;
mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod slug;

/// Category CRUD, mounted under the admin prefix.
pub fn router() -> Router<AppState> {
    handlers::routes()
}
