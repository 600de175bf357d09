use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{CategoryRequest, CategoryResponse};
use super::services;
use crate::{auth::extractors::AuthUser, db::Pagination, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let rows = services::list_categories(&state, page).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = services::get_category(&state, id).await?;
    Ok(Json(category.into()))
}

#[instrument(skip(state, body))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let category = services::create_category(&state, user_id, &body.title).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[instrument(skip(state, body))]
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = services::edit_category(&state, id, &body.title).await?;
    Ok(Json(category.into()))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_category(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
