use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::{jwt::JwtKeys, repo::PgUserStore, repo::UserStore};
use crate::categories::repo::{CategoryStore, PgCategoryStore};
use crate::config::AppConfig;
use crate::contents::repo::{ContentStore, PgContentStore};
use crate::storage::{Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<JwtKeys>,
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub contents: Arc<dyn ContentStore>,
    pub storage: Arc<dyn StorageClient>,
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl AppState {
    pub async fn init(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let keys = JwtKeys::from_config(&config.jwt).context("build jwt keys")?;

        let storage = Arc::new(
            Storage::new(&config.storage)
                .await
                .context("init object storage")?,
        ) as Arc<dyn StorageClient>;

        Ok(Self {
            config: Arc::new(config),
            keys: Arc::new(keys),
            users: Arc::new(PgUserStore::new(db.clone())),
            categories: Arc::new(PgCategoryStore::new(db.clone())),
            contents: Arc::new(PgContentStore::new(db)),
            storage,
        })
    }

    /// Deadline applied to every store call.
    pub fn store_deadline(&self) -> Duration {
        self.config.store_timeout()
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(Arc::new(crate::memory::MemoryStore::default()))
    }

    #[cfg(test)]
    pub fn fake_with(store: Arc<crate::memory::MemoryStore>) -> Self {
        use async_trait::async_trait;
        use bytes::Bytes;

        struct FakeStorage;
        #[async_trait]
        impl StorageClient for FakeStorage {
            async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
                Ok(())
            }
            fn public_url(&self, k: &str) -> String {
                format!("https://cdn.fake.local/{}", k)
            }
        }

        let config = AppConfig::for_tests();
        let keys = JwtKeys::from_config(&config.jwt).expect("test jwt keys");

        Self {
            config: Arc::new(config),
            keys: Arc::new(keys),
            users: store.clone(),
            categories: store.clone(),
            contents: store,
            storage: Arc::new(FakeStorage),
        }
    }
}
