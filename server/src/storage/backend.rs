use anyhow::{Context, Result};
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;

use super::config::StorageConfig;
use super::traits::DocumentStore;

pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBackend {
    pub fn from_config(config: StorageConfig) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = match config {
            StorageConfig::Local { path } => {
                std::fs::create_dir_all(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Arc::new(LocalFileSystem::new_with_prefix(path)?)
            }
            StorageConfig::Memory => Arc::new(InMemory::new()),
            StorageConfig::S3 { bucket } => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()?,
            ),
        };
        Ok(Self { store })
    }

    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DocumentStore for ObjectStoreBackend {
    async fn load(&self, location: &str) -> Result<Option<serde_json::Value>> {
        let path = Path::from(location);
        match self.store.get(&path).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                let document = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Failed to parse document at {location}"))?;
                Ok(Some(document))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, location: &str, document: &serde_json::Value) -> Result<()> {
        let path = Path::from(location);
        let json = serde_json::to_vec(document)?;
        self.store.put(&path, PutPayload::from(json)).await?;
        Ok(())
    }
}
