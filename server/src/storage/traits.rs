use anyhow::Result;
use async_trait::async_trait;
use shared_types::ContentKey;

/// Raw JSON documents addressed by a slash-separated location.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, location: &str) -> Result<Option<serde_json::Value>>;
    async fn save(&self, location: &str, document: &serde_json::Value) -> Result<()>;
}

/// Content addressed by [`ContentKey`], as seen by the gateway.
#[async_trait]
pub trait ContentStorage: Send + Sync {
    /// Current value of `key`; `Null` (or `[]` for collections) when never written.
    async fn read(&self, key: ContentKey) -> Result<serde_json::Value>;
    /// Replace the value of `key`.
    async fn write(&self, key: ContentKey, data: &serde_json::Value) -> Result<()>;
    async fn save_submission(
        &self,
        form: &str,
        id: &str,
        submission: &serde_json::Value,
    ) -> Result<()>;
}
