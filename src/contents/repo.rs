use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Content, ContentDraft, ContentRow};
use crate::db::StoreError;

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Content>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Content>, StoreError>;
    /// Fails with `ForeignKeyViolation` when the category or author is gone.
    async fn insert(&self, created_by: i64, draft: &ContentDraft) -> Result<Content, StoreError>;
    async fn update(&self, id: i64, draft: &ContentDraft) -> Result<Option<Content>, StoreError>;
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
    async fn count_by_category(&self, category_id: i64) -> Result<i64, StoreError>;
}

#[derive(Clone)]
pub struct PgContentStore {
    db: PgPool,
}

impl PgContentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn decode(row: ContentRow) -> Result<Content, StoreError> {
    Content::try_from(row).map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))
}

const SELECT_JOINED: &str = r#"
    SELECT t.id, t.title, t.excerpt, t.description, t.image, t.tags, t.status,
           t.category_id, c.title AS category_title,
           t.created_by, u.name AS author_name, t.created_at
"#;

#[async_trait]
impl ContentStore for PgContentStore {
    async fn list(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Content>, StoreError> {
        let sql = format!(
            r#"{SELECT_JOINED}
            FROM contents t
            JOIN categories c ON c.id = t.category_id
            JOIN users u ON u.id = t.created_by
            WHERE ($3::BIGINT IS NULL OR t.category_id = $3)
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $1 OFFSET $2
            "#
        );
        let rows = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(limit)
            .bind(offset)
            .bind(category_id)
            .fetch_all(&self.db)
            .await?;
        rows.into_iter().map(decode).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Content>, StoreError> {
        let sql = format!(
            r#"{SELECT_JOINED}
            FROM contents t
            JOIN categories c ON c.id = t.category_id
            JOIN users u ON u.id = t.created_by
            WHERE t.id = $1
            "#
        );
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(decode).transpose()
    }

    async fn insert(&self, created_by: i64, draft: &ContentDraft) -> Result<Content, StoreError> {
        let sql = format!(
            r#"
            WITH t AS (
                INSERT INTO contents
                    (title, excerpt, description, image, tags, status, category_id, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            {SELECT_JOINED}
            FROM t
            JOIN categories c ON c.id = t.category_id
            JOIN users u ON u.id = t.created_by
            "#
        );
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(&draft.title)
            .bind(&draft.excerpt)
            .bind(&draft.description)
            .bind(&draft.image)
            .bind(&draft.tags)
            .bind(draft.status.as_str())
            .bind(draft.category_id)
            .bind(created_by)
            .fetch_one(&self.db)
            .await?;
        decode(row)
    }

    async fn update(&self, id: i64, draft: &ContentDraft) -> Result<Option<Content>, StoreError> {
        let sql = format!(
            r#"
            WITH t AS (
                UPDATE contents
                SET title = $2, excerpt = $3, description = $4, image = $5,
                    tags = $6, status = $7, category_id = $8, updated_at = now()
                WHERE id = $1
                RETURNING *
            )
            {SELECT_JOINED}
            FROM t
            JOIN categories c ON c.id = t.category_id
            JOIN users u ON u.id = t.created_by
            "#
        );
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(id)
            .bind(&draft.title)
            .bind(&draft.excerpt)
            .bind(&draft.description)
            .bind(&draft.image)
            .bind(&draft.tags)
            .bind(draft.status.as_str())
            .bind(draft.category_id)
            .fetch_optional(&self.db)
            .await?;
        row.map(decode).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count_by_category(&self, category_id: i64) -> Result<i64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contents WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_one(&self.db)
        .await?;
        Ok(n)
    }
}
