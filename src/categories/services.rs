use tracing::{info, warn};

use super::repo_types::{Category, NewCategory};
use super::slug::{first_free, slugify};
use crate::db::{bounded, Pagination, StoreError};
use crate::error::AppError;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 255;
// Attempts at allocating a slug when concurrent writers keep winning.
const MAX_SLUG_ATTEMPTS: usize = 5;

fn clean_title(title: &str) -> Result<&str, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title)
}

fn base_slug(title: &str) -> Result<String, AppError> {
    let base = slugify(title);
    if base.is_empty() {
        return Err(AppError::BadRequest(
            "title must contain at least one letter or digit".into(),
        ));
    }
    Ok(base)
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("category {id} not found"))
}

pub async fn list_categories(st: &AppState, page: Pagination) -> Result<Vec<Category>, AppError> {
    let rows = bounded(
        st.store_deadline(),
        st.categories.list(page.limit(), page.offset()),
    )
    .await?;
    Ok(rows)
}

pub async fn get_category(st: &AppState, id: i64) -> Result<Category, AppError> {
    bounded(st.store_deadline(), st.categories.find_by_id(id))
        .await?
        .ok_or_else(|| not_found(id))
}

/// Creates a category under the first free slug derived from its title.
pub async fn create_category(
    st: &AppState,
    user_id: i64,
    title: &str,
) -> Result<Category, AppError> {
    let title = clean_title(title)?;
    let base = base_slug(title)?;
    let deadline = st.store_deadline();

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let taken = bounded(deadline, st.categories.slugs_in_family(&base, None)).await?;
        let slug = first_free(&base, &taken);
        let new = NewCategory {
            title,
            slug: &slug,
            created_by: user_id,
        };

        match bounded(deadline, st.categories.insert(&new)).await {
            Ok(category) => {
                info!(category_id = category.id, slug = %category.slug, user_id, "category created");
                return Ok(category);
            }
            Err(StoreError::UniqueViolation(_)) => {
                warn!(attempt, %slug, "slug taken by a concurrent write, retrying");
            }
            Err(StoreError::ForeignKeyViolation(_)) => {
                return Err(AppError::NotFound(format!("user {user_id} not found")));
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Conflict(format!(
        "could not allocate a unique slug for {base:?}"
    )))
}

/// Renames a category. An unchanged title keeps the current slug untouched;
/// a new title gets a fresh slug chosen without counting the row itself.
pub async fn edit_category(st: &AppState, id: i64, title: &str) -> Result<Category, AppError> {
    let title = clean_title(title)?;
    let current = get_category(st, id).await?;
    if current.title == title {
        return Ok(current);
    }

    let base = base_slug(title)?;
    let deadline = st.store_deadline();

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let taken = bounded(deadline, st.categories.slugs_in_family(&base, Some(id))).await?;
        let slug = first_free(&base, &taken);

        match bounded(deadline, st.categories.update(id, title, &slug)).await {
            Ok(Some(category)) => {
                info!(category_id = id, slug = %category.slug, "category updated");
                return Ok(category);
            }
            Ok(None) => return Err(not_found(id)),
            Err(StoreError::UniqueViolation(_)) => {
                warn!(attempt, %slug, "slug taken by a concurrent write, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Conflict(format!(
        "could not allocate a unique slug for {base:?}"
    )))
}

fn still_referenced(id: i64, refs: i64) -> AppError {
    AppError::ReferentialConflict(format!(
        "category {id} is still referenced by {refs} content item(s)"
    ))
}

/// Deletes a category nobody references. All-or-nothing.
pub async fn delete_category(st: &AppState, id: i64) -> Result<(), AppError> {
    let deadline = st.store_deadline();
    get_category(st, id).await?;

    let refs = bounded(deadline, st.contents.count_by_category(id)).await?;
    if refs > 0 {
        warn!(category_id = id, refs, "refusing to delete referenced category");
        return Err(still_referenced(id, refs));
    }

    match bounded(deadline, st.categories.delete_unreferenced(id)).await {
        Ok(true) => {
            info!(category_id = id, "category deleted");
            Ok(())
        }
        // Lost a race: either content appeared or the row is already gone.
        Ok(false) => {
            let refs = bounded(deadline, st.contents.count_by_category(id)).await?;
            if refs > 0 {
                Err(still_referenced(id, refs))
            } else {
                Err(not_found(id))
            }
        }
        Err(StoreError::ForeignKeyViolation(_)) => Err(still_referenced(id, 1)),
        Err(e) => Err(e.into()),
    }
}
