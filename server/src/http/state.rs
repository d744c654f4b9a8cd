use axum::http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ApiError, ApiResult};
use crate::cache::ResponseCache;
use crate::revalidate::{LogRevalidator, Revalidator};
use crate::storage::ContentStorage;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ContentStorage>,
    pub cache: Arc<ResponseCache>,
    pub revalidator: Arc<dyn Revalidator>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(storage: Arc<dyn ContentStorage>) -> Self {
        Self {
            storage,
            cache: Arc::new(ResponseCache::new(Some(DEFAULT_CACHE_TTL))),
            revalidator: Arc::new(LogRevalidator),
            admin_token: None,
        }
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache = Arc::new(ResponseCache::new(ttl));
        self
    }

    #[must_use]
    pub fn with_revalidator(mut self, revalidator: Arc<dyn Revalidator>) -> Self {
        self.revalidator = revalidator;
        self
    }

    #[must_use]
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token;
        self
    }

    /// Admin gate for write endpoints. Open when no token is configured.
    pub fn authorize(&self, headers: &HeaderMap) -> ApiResult<()> {
        let Some(expected) = &self.admin_token else {
            return Ok(());
        };

        let provided = headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if provided == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}
