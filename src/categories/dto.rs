use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Category;

/// Body of create and edit requests.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub created_by: i64,
    pub created_by_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            title: c.title,
            slug: c.slug,
            created_by: c.created_by,
            created_by_name: c.created_by_name,
            created_at: c.created_at,
        }
    }
}
