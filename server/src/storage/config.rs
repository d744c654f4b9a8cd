use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageConfig {
    Local { path: PathBuf },
    Memory,
    S3 { bucket: String },
}

impl StorageConfig {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    pub fn s3(bucket: impl Into<String>) -> Self {
        Self::S3 {
            bucket: bucket.into(),
        }
    }

    /// Parse a store connection string.
    ///
    /// Accepted forms: `file://<dir>`, a bare directory path, `memory://` and
    /// `s3://<bucket>`. S3 credentials and region come from the usual `AWS_*`
    /// environment variables.
    pub fn from_url(url: &str) -> anyhow::Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            anyhow::bail!("Content store URL is empty");
        }

        if let Some(path) = url.strip_prefix("file://") {
            return Ok(Self::local(path));
        }
        if url == "memory://" || url == "memory:" {
            return Ok(Self::Memory);
        }
        if let Some(rest) = url.strip_prefix("s3://") {
            let bucket = rest.split('/').next().unwrap_or_default();
            if bucket.is_empty() {
                anyhow::bail!("S3 content store URL is missing a bucket: {url}");
            }
            return Ok(Self::s3(bucket));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            anyhow::bail!(
                "Unknown content store scheme: {scheme}. Must be 'file', 'memory' or 's3'"
            );
        }

        Ok(Self::local(url))
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let url =
            std::env::var("CONTENT_STORE_URL").unwrap_or_else(|_| "file://./data".to_string());
        Self::from_url(&url)
    }
}
