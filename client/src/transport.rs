use anyhow::Result;
use async_trait::async_trait;
use shared_types::ContentKey;
use std::collections::HashMap;

/// Network seam between [`crate::DataService`] and the gateway.
///
/// [`crate::ContentClient`] is the production implementation; tests swap in
/// an in-memory fake.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, key: ContentKey) -> Result<serde_json::Value>;
    async fn fetch_batch(
        &self,
        keys: &[ContentKey],
    ) -> Result<HashMap<ContentKey, serde_json::Value>>;
    async fn store(&self, key: ContentKey, data: &serde_json::Value) -> Result<()>;
}
