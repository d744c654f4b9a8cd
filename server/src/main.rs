use anyhow::Result;
use server::config::ServerConfig;
use server::http::{self, AppState};
use server::revalidate::{HttpRevalidator, LogRevalidator, Revalidator};
use server::storage::{ObjectStoreBackend, RoutedContentStore};
use std::sync::Arc;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .init();

    info!("Starting site content server");

    let config = ServerConfig::from_env()?;
    info!(storage = ?config.storage, cache_ttl = ?config.cache_ttl, "Loaded configuration");

    let documents = Arc::new(ObjectStoreBackend::from_config(config.storage.clone())?);
    let storage = Arc::new(RoutedContentStore::new(documents));

    let revalidator: Arc<dyn Revalidator> = match &config.revalidate_url {
        Some(url) => {
            info!("Revalidating pages via {}", url);
            Arc::new(HttpRevalidator::new(url.clone()))
        }
        None => Arc::new(LogRevalidator),
    };

    let state = AppState::new(storage)
        .with_cache_ttl(config.cache_ttl)
        .with_revalidator(revalidator)
        .with_admin_token(config.admin_token.clone());

    http::start_server(Arc::new(state), config.bind_address).await?;

    Ok(())
}
