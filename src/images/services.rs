use bytes::Bytes;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Stores a content image and returns its public URL.
pub async fn upload_content_image(
    st: &AppState,
    user_id: i64,
    body: Bytes,
    content_type: &str,
) -> Result<String, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("image is empty".into()));
    }
    if body.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest("image exceeds 10 MiB".into()));
    }
    let ext = ext_from_mime(content_type).ok_or_else(|| {
        AppError::BadRequest(format!("unsupported image type {content_type:?}"))
    })?;

    let key = format!("contents/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    let size = body.len();
    st.storage
        .put_object(&key, body, content_type)
        .await
        .map_err(|e| {
            error!(error = ?e, %key, "image upload failed");
            AppError::Internal(format!("upload {key}"))
        })?;

    info!(%key, size, user_id, "image uploaded");
    Ok(st.storage.public_url(&key))
}
