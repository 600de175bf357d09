use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Category, NewCategory};
use crate::db::StoreError;

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Category>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, StoreError>;
    /// Slugs equal to `base` or starting with `base-`, skipping row `exclude`.
    async fn slugs_in_family(
        &self,
        base: &str,
        exclude: Option<i64>,
    ) -> Result<Vec<String>, StoreError>;
    /// Fails with `UniqueViolation` when the slug is already taken.
    async fn insert(&self, new: &NewCategory<'_>) -> Result<Category, StoreError>;
    async fn update(
        &self,
        id: i64,
        title: &str,
        slug: &str,
    ) -> Result<Option<Category>, StoreError>;
    /// Deletes only when no content references the row; false otherwise or
    /// when the row does not exist.
    async fn delete_unreferenced(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgCategoryStore {
    db: PgPool,
}

impl PgCategoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.title, c.slug, c.created_by, u.name AS created_by_name, c.created_at
            FROM categories c
            JOIN users u ON u.id = c.created_by
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.title, c.slug, c.created_by, u.name AS created_by_name, c.created_at
            FROM categories c
            JOIN users u ON u.id = c.created_by
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn slugs_in_family(
        &self,
        base: &str,
        exclude: Option<i64>,
    ) -> Result<Vec<String>, StoreError> {
        // `base` only holds [a-z0-9-], so it is safe inside LIKE.
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug
            FROM categories
            WHERE (slug = $1 OR slug LIKE $2)
              AND ($3::BIGINT IS NULL OR id <> $3)
            "#,
        )
        .bind(base)
        .bind(format!("{}-%", base))
        .bind(exclude)
        .fetch_all(&self.db)
        .await?;
        Ok(slugs)
    }

    async fn insert(&self, new: &NewCategory<'_>) -> Result<Category, StoreError> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            WITH inserted AS (
                INSERT INTO categories (title, slug, created_by)
                VALUES ($1, $2, $3)
                RETURNING id, title, slug, created_by, created_at
            )
            SELECT i.id, i.title, i.slug, i.created_by, u.name AS created_by_name, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.created_by
            "#,
        )
        .bind(new.title)
        .bind(new.slug)
        .bind(new.created_by)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        id: i64,
        title: &str,
        slug: &str,
    ) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            WITH updated AS (
                UPDATE categories
                SET title = $2, slug = $3, updated_at = now()
                WHERE id = $1
                RETURNING id, title, slug, created_by, created_at
            )
            SELECT d.id, d.title, d.slug, d.created_by, u.name AS created_by_name, d.created_at
            FROM updated d
            JOIN users u ON u.id = d.created_by
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(slug)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_unreferenced(&self, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            DELETE FROM categories
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM contents WHERE category_id = $1)
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}
