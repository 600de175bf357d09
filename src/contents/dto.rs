use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Content, ContentStatus};
use crate::db::Pagination;

/// Body of create and edit requests.
#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
    pub category_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ContentListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub category_id: Option<i64>,
}

impl ContentListQuery {
    pub fn page(&self) -> Pagination {
        let mut page = Pagination::default();
        if let Some(limit) = self.limit {
            page.limit = limit;
        }
        if let Some(offset) = self.offset {
            page.offset = offset;
        }
        page
    }
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub status: ContentStatus,
    pub category_id: i64,
    pub category_title: String,
    pub created_by: i64,
    pub author_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Content> for ContentResponse {
    fn from(c: Content) -> Self {
        Self {
            id: c.id,
            title: c.title,
            excerpt: c.excerpt,
            description: c.description,
            image: c.image,
            tags: c.tags,
            status: c.status,
            category_id: c.category_id,
            category_title: c.category_title,
            created_by: c.created_by,
            author_name: c.author_name,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
}
