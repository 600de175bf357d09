use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{ContentListQuery, ContentRequest, ContentResponse, UploadedImage};
use super::services;
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    images::services::{upload_content_image, MAX_IMAGE_BYTES},
    state::AppState,
};

// Room for multipart framing around a maximum-size image.
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contents", get(list_contents).post(create_content))
        .route(
            "/contents/upload-image",
            post(upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/contents/:id",
            get(get_content).put(update_content).delete(delete_content),
        )
}

#[instrument(skip(state))]
pub async fn list_contents(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<ContentListQuery>,
) -> Result<Json<Vec<ContentResponse>>, AppError> {
    let rows = services::list_contents(&state, q.page(), q.category_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_content(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ContentResponse>, AppError> {
    let content = services::get_content(&state, id).await?;
    Ok(Json(content.into()))
}

#[instrument(skip(state, body))]
pub async fn create_content(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ContentRequest>,
) -> Result<(StatusCode, Json<ContentResponse>), AppError> {
    let content = services::create_content(&state, user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(content.into())))
}

#[instrument(skip(state, body))]
pub async fn update_content(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<ContentRequest>,
) -> Result<Json<ContentResponse>, AppError> {
    let content = services::edit_content(&state, id, &body).await?;
    Ok(Json(content.into()))
}

#[instrument(skip(state))]
pub async fn delete_content(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_content(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /contents/upload-image (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>), AppError> {
    loop {
        let field = mp.next_field().await.map_err(|e| {
            warn!(error = %e, "malformed multipart body");
            AppError::BadRequest("malformed multipart body".into())
        })?;
        let Some(field) = field else { break };
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".into());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("unreadable image field: {e}")))?;

        let url = upload_content_image(&state, user_id, data, &content_type).await?;
        return Ok((StatusCode::CREATED, Json(UploadedImage { url })));
    }

    Err(AppError::BadRequest("image field is required".into()))
}
