use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            other => Err(format!("unknown content status {other:?}")),
        }
    }
}

/// Content row joined with its category title and author name.
#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub category_id: i64,
    pub category_title: String,
    pub created_by: i64,
    pub author_name: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Content {
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
    pub created_at: OffsetDateTime,
}

impl TryFrom<ContentRow> for Content {
    type Error = String;

    fn try_from(r: ContentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: r.status.parse()?,
            id: r.id,
            title: r.title,
            excerpt: r.excerpt,
            description: r.description,
            image: r.image,
            tags: r.tags,
            category_id: r.category_id,
            category_title: r.category_title,
            created_by: r.created_by,
            author_name: r.author_name,
            created_at: r.created_at,
        })
    }
}

/// Writable fields of a content item, already validated.
#[derive(Debug, Clone)]
pub struct ContentDraft {
    pub title: String,
    pub excerpt: String,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub status: ContentStatus,
    pub category_id: i64,
}
