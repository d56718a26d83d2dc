use std::sync::Arc;

use sqlx::SqlitePool;

use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::db;
use crate::storage::{LocalStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub classifier: Arc<Classifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await?;

        let storage = Arc::new(LocalStorage::new(&config.upload_dir).await?) as Arc<dyn StorageClient>;

        let model_path = config.model_path.clone();
        let classifier = tokio::task::spawn_blocking(move || Classifier::load(&model_path)).await?;

        Ok(Self {
            db,
            config,
            storage,
            classifier: Arc::new(classifier),
        })
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        classifier: Arc<Classifier>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
            classifier,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use async_trait::async_trait;
        use bytes::Bytes;

        #[derive(Clone)]
        struct FakeStorage;
        #[async_trait]
        impl StorageClient for FakeStorage {
            async fn put_object(&self, _k: &str, _b: Bytes) -> anyhow::Result<()> {
                Ok(())
            }
            async fn delete_object(&self, _k: &str) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .connect_lazy("sqlite::memory:")
            .expect("lazy pool ok");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24,
            },
            upload_dir: "uploads".into(),
            model_path: "model/none.onnx".into(),
            max_upload_bytes: crate::config::DEFAULT_MAX_UPLOAD_BYTES,
        });

        Self {
            db,
            config,
            storage: Arc::new(FakeStorage),
            classifier: Arc::new(Classifier::Placeholder),
        }
    }
}
