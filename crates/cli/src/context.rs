use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mergebot_config::AppConfig;
use mergebot_formats::FormatRegistry;
use mergebot_state::{Database, Repository};
use mergebot_storage::backend::LocalBackend;
use mergebot_storage::{ArtifactStore, RawStore};
use std::sync::Arc;
use tracing::instrument;

/// Everything a command needs, opened from the configured data directory.
pub struct Context {
    pub config: AppConfig,
    pub db: Database,
    pub repo: Repository,
    pub raw: RawStore,
    pub artifacts: ArtifactStore,
    pub registry: FormatRegistry,
}

impl Context {
    #[instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
    pub async fn open(mut config: AppConfig) -> Result<Self> {
        // Local backends only accept absolute roots.
        config.data_dir = std::path::absolute(&config.data_dir).or_raise(|| ErrorKind::Storage)?;
        tokio::fs::create_dir_all(&config.data_dir).await.or_raise(|| ErrorKind::Storage)?;

        let raw = LocalBackend::new("raw", config.raw_dir()).or_raise(|| ErrorKind::Storage)?;
        let artifacts = LocalBackend::new("artifacts", config.artifact_dir()).or_raise(|| ErrorKind::Storage)?;
        let db = Database::connect(config.database_path()).await.or_raise(|| ErrorKind::State)?;

        Ok(Self {
            repo: Repository::from(&db),
            raw: RawStore::new(Arc::new(raw)),
            artifacts: ArtifactStore::new(Arc::new(artifacts)),
            registry: FormatRegistry::with_defaults(),
            config,
            db,
        })
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}
