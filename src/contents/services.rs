use tracing::{info, warn};

use super::dto::ContentRequest;
use super::repo_types::{Content, ContentDraft};
use crate::db::{bounded, Pagination, StoreError};
use crate::error::AppError;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 255;

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("content {id} not found"))
}

fn missing_category(id: i64) -> AppError {
    AppError::BadRequest(format!("category {id} does not exist"))
}

/// Trims every tag and drops the empty ones, keeping order.
pub fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validates a request and resolves its category.
async fn build_draft(st: &AppState, req: &ContentRequest) -> Result<ContentDraft, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }

    let category = bounded(st.store_deadline(), st.categories.find_by_id(req.category_id)).await?;
    if category.is_none() {
        return Err(missing_category(req.category_id));
    }

    Ok(ContentDraft {
        title: title.to_string(),
        excerpt: req.excerpt.trim().to_string(),
        description: req.description.clone(),
        image: req
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        tags: clean_tags(&req.tags),
        status: req.status.unwrap_or_default(),
        category_id: req.category_id,
    })
}

pub async fn list_contents(
    st: &AppState,
    page: Pagination,
    category_id: Option<i64>,
) -> Result<Vec<Content>, AppError> {
    let rows = bounded(
        st.store_deadline(),
        st.contents.list(page.limit(), page.offset(), category_id),
    )
    .await?;
    Ok(rows)
}

pub async fn get_content(st: &AppState, id: i64) -> Result<Content, AppError> {
    bounded(st.store_deadline(), st.contents.find_by_id(id))
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn create_content(
    st: &AppState,
    user_id: i64,
    req: &ContentRequest,
) -> Result<Content, AppError> {
    let draft = build_draft(st, req).await?;
    match bounded(st.store_deadline(), st.contents.insert(user_id, &draft)).await {
        Ok(content) => {
            info!(content_id = content.id, category_id = content.category_id, user_id, "content created");
            Ok(content)
        }
        // The category vanished between the check and the insert.
        Err(StoreError::ForeignKeyViolation(constraint)) => {
            warn!(%constraint, "content insert lost a race with a delete");
            Err(missing_category(draft.category_id))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_content(
    st: &AppState,
    id: i64,
    req: &ContentRequest,
) -> Result<Content, AppError> {
    get_content(st, id).await?;
    let draft = build_draft(st, req).await?;
    match bounded(st.store_deadline(), st.contents.update(id, &draft)).await {
        Ok(Some(content)) => {
            info!(content_id = id, "content updated");
            Ok(content)
        }
        Ok(None) => Err(not_found(id)),
        Err(StoreError::ForeignKeyViolation(_)) => Err(missing_category(draft.category_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_content(st: &AppState, id: i64) -> Result<(), AppError> {
    if bounded(st.store_deadline(), st.contents.delete(id)).await? {
        info!(content_id = id, "content deleted");
        Ok(())
    } else {
        Err(not_found(id))
    }
}
