use sqlx::FromRow;
use time::OffsetDateTime;

/// Category row joined with its creator's name.
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub created_by: i64,
    pub created_by_name: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCategory<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub created_by: i64,
}
