//! Fire-and-forget page revalidation after content writes.

use shared_types::ContentKey;
use tracing::{debug, info, warn};

/// Signals downstream page caches that content behind `key` changed.
///
/// Implementations must not block the caller and must not fail the write
/// that triggered them; outcomes are only logged.
pub trait Revalidator: Send + Sync {
    fn revalidate(&self, key: ContentKey);
}

/// Used when no revalidation endpoint is configured.
pub struct LogRevalidator;

impl Revalidator for LogRevalidator {
    fn revalidate(&self, key: ContentKey) {
        debug!(%key, pages = ?key.pages(), "No revalidation endpoint configured");
    }
}

/// Posts `{key, paths}` to a page-cache revalidation endpoint.
pub struct HttpRevalidator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRevalidator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Revalidator for HttpRevalidator {
    fn revalidate(&self, key: ContentKey) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let body = serde_json::json!({ "key": key.as_str(), "paths": key.pages() });

        tokio::spawn(async move {
            let result = client
                .post(&endpoint)
                .json(&body)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);

            match result {
                Ok(_) => info!(%key, "Revalidated pages"),
                Err(e) => warn!(%key, error = %e, "Page revalidation failed"),
            }
        });
    }
}
