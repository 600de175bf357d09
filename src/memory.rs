//! In-memory store used by tests. Enforces the same constraints as the
//! Postgres schema: unique emails and slugs, the slug column width, foreign
//! keys, and the RESTRICT rule between contents and categories.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, MutexGuard,
};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::{password::hash_password, repo::UserStore, repo_types::User};
use crate::categories::{
    repo::CategoryStore,
    repo_types::{Category, NewCategory},
    slug::MAX_SLUG_LEN,
};
use crate::contents::{
    repo::ContentStore,
    repo_types::{Content, ContentDraft, ContentStatus},
};
use crate::db::StoreError;

#[derive(Debug, Clone)]
struct CategoryRow {
    id: i64,
    title: String,
    slug: String,
    created_by: i64,
    created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
struct ContentRow {
    id: i64,
    title: String,
    excerpt: String,
    description: String,
    image: Option<String>,
    tags: Vec<String>,
    status: ContentStatus,
    category_id: i64,
    created_by: i64,
    created_at: OffsetDateTime,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    categories: Vec<CategoryRow>,
    contents: Vec<ContentRow>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_name(&self, id: i64) -> Option<String> {
        self.users.iter().find(|u| u.id == id).map(|u| u.name.clone())
    }

    fn category(&self, row: &CategoryRow) -> Category {
        Category {
            id: row.id,
            title: row.title.clone(),
            slug: row.slug.clone(),
            created_by: row.created_by,
            created_by_name: self.user_name(row.created_by).unwrap_or_default(),
            created_at: row.created_at,
        }
    }

    fn content(&self, row: &ContentRow) -> Content {
        let category_title = self
            .categories
            .iter()
            .find(|c| c.id == row.category_id)
            .map(|c| c.title.clone())
            .unwrap_or_default();
        Content {
            id: row.id,
            title: row.title.clone(),
            excerpt: row.excerpt.clone(),
            description: row.description.clone(),
            image: row.image.clone(),
            tags: row.tags.clone(),
            status: row.status,
            category_id: row.category_id,
            category_title,
            created_by: row.created_by,
            author_name: self.user_name(row.created_by).unwrap_or_default(),
            created_at: row.created_at,
        }
    }

    fn check_slug_width(slug: &str) -> Result<(), StoreError> {
        if slug.len() > MAX_SLUG_LEN {
            return Err(StoreError::Database(sqlx::Error::Protocol(format!(
                "value too long for slug: {} bytes",
                slug.len()
            ))));
        }
        Ok(())
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.categories
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    touches: AtomicUsize,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().expect("memory store poisoned")
    }

    /// Number of store calls served so far.
    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    /// Inserts a user with a freshly hashed password.
    pub fn seed_user(&self, name: &str, email: &str, password: &str) -> User {
        let hash = hash_password(password).expect("hash seed password");
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let user = User {
            id: inner.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.push(user.clone());
        user
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        let user = User {
            id: inner.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        match inner.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Category>, StoreError> {
        let inner = self.lock();
        let mut rows: Vec<&CategoryRow> = inner.categories.iter().collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|r| inner.category(r))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|r| inner.category(r)))
    }

    async fn slugs_in_family(
        &self,
        base: &str,
        exclude: Option<i64>,
    ) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{}-", base);
        Ok(self
            .lock()
            .categories
            .iter()
            .filter(|c| Some(c.id) != exclude)
            .filter(|c| c.slug == base || c.slug.starts_with(&prefix))
            .map(|c| c.slug.clone())
            .collect())
    }

    async fn insert(&self, new: &NewCategory<'_>) -> Result<Category, StoreError> {
        let mut inner = self.lock();
        Inner::check_slug_width(new.slug)?;
        if inner.slug_taken(new.slug, None) {
            return Err(StoreError::UniqueViolation("categories_slug_key".into()));
        }
        if inner.user_name(new.created_by).is_none() {
            return Err(StoreError::ForeignKeyViolation(
                "categories_created_by_fkey".into(),
            ));
        }
        let row = CategoryRow {
            id: inner.next_id(),
            title: new.title.to_string(),
            slug: new.slug.to_string(),
            created_by: new.created_by,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.categories.push(row.clone());
        Ok(inner.category(&row))
    }

    async fn update(
        &self,
        id: i64,
        title: &str,
        slug: &str,
    ) -> Result<Option<Category>, StoreError> {
        let mut inner = self.lock();
        if !inner.categories.iter().any(|c| c.id == id) {
            return Ok(None);
        }
        Inner::check_slug_width(slug)?;
        if inner.slug_taken(slug, Some(id)) {
            return Err(StoreError::UniqueViolation("categories_slug_key".into()));
        }
        let Some(row) = inner.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        row.title = title.to_string();
        row.slug = slug.to_string();
        let row = row.clone();
        Ok(Some(inner.category(&row)))
    }

    async fn delete_unreferenced(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        if inner.contents.iter().any(|c| c.category_id == id) {
            return Ok(false);
        }
        let before = inner.categories.len();
        inner.categories.retain(|c| c.id != id);
        Ok(inner.categories.len() < before)
    }
}

fn check_content_refs(inner: &Inner, created_by: i64, category_id: i64) -> Result<(), StoreError> {
    if !inner.categories.iter().any(|c| c.id == category_id) {
        return Err(StoreError::ForeignKeyViolation(
            "contents_category_id_fkey".into(),
        ));
    }
    if inner.user_name(created_by).is_none() {
        return Err(StoreError::ForeignKeyViolation(
            "contents_created_by_fkey".into(),
        ));
    }
    Ok(())
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Content>, StoreError> {
        let inner = self.lock();
        let mut rows: Vec<&ContentRow> = inner
            .contents
            .iter()
            .filter(|c| category_id.map_or(true, |id| c.category_id == id))
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|r| inner.content(r))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Content>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .contents
            .iter()
            .find(|c| c.id == id)
            .map(|r| inner.content(r)))
    }

    async fn insert(&self, created_by: i64, draft: &ContentDraft) -> Result<Content, StoreError> {
        let mut inner = self.lock();
        check_content_refs(&inner, created_by, draft.category_id)?;
        let row = ContentRow {
            id: inner.next_id(),
            title: draft.title.clone(),
            excerpt: draft.excerpt.clone(),
            description: draft.description.clone(),
            image: draft.image.clone(),
            tags: draft.tags.clone(),
            status: draft.status,
            category_id: draft.category_id,
            created_by,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.contents.push(row.clone());
        Ok(inner.content(&row))
    }

    async fn update(&self, id: i64, draft: &ContentDraft) -> Result<Option<Content>, StoreError> {
        let mut inner = self.lock();
        let Some(created_by) = inner
            .contents
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.created_by)
        else {
            return Ok(None);
        };
        check_content_refs(&inner, created_by, draft.category_id)?;
        let Some(row) = inner.contents.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        row.title = draft.title.clone();
        row.excerpt = draft.excerpt.clone();
        row.description = draft.description.clone();
        row.image = draft.image.clone();
        row.tags = draft.tags.clone();
        row.status = draft.status;
        row.category_id = draft.category_id;
        let row = row.clone();
        Ok(Some(inner.content(&row)))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.contents.len();
        inner.contents.retain(|c| c.id != id);
        Ok(inner.contents.len() < before)
    }

    async fn count_by_category(&self, category_id: i64) -> Result<i64, StoreError> {
        Ok(self
            .lock()
            .contents
            .iter()
            .filter(|c| c.category_id == category_id)
            .count() as i64)
    }
}
