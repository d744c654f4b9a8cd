use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

use crate::storage::StorageConfig;

const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Server settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub storage: StorageConfig,
    /// `None` keeps cached values for the lifetime of the process.
    pub cache_ttl: Option<Duration>,
    pub revalidate_url: Option<String>,
    pub admin_token: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDRESS must be a socket address")?;

        let cache_ttl = match std::env::var("SERVER_CACHE_TTL_SECS") {
            Ok(raw) => parse_cache_ttl(&raw)?,
            Err(_) => Some(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
        };

        Ok(Self {
            bind_address,
            storage: StorageConfig::from_env()?,
            cache_ttl,
            revalidate_url: non_empty_var("REVALIDATE_URL"),
            admin_token: non_empty_var("ADMIN_TOKEN"),
        })
    }
}

fn parse_cache_ttl(raw: &str) -> Result<Option<Duration>> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("SERVER_CACHE_TTL_SECS must be a number, got {raw:?}"))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_means_process_lifetime() {
        assert_eq!(parse_cache_ttl("0").unwrap(), None);
        assert_eq!(
            parse_cache_ttl(" 30 ").unwrap(),
            Some(Duration::from_secs(30))
        );
        assert!(parse_cache_ttl("soon").is_err());
    }
}
