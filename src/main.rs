use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trailer_proxy_server::cache::TrailerCache;
use trailer_proxy_server::config::Config;
use trailer_proxy_server::proxy::ProxyServer;
use trailer_proxy_server::service::TrailerService;
use trailer_proxy_server::upstream::TmdbClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailer_proxy_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(?config, "Configuration loaded");

    // an unreachable cache must not keep the service down
    let cache = match TrailerCache::connect(&config.cache_backend, config.cache_capacity).await {
        Ok(cache) => cache,
        Err(err) => {
            warn!(
                backend = %config.cache_backend.describe(),
                error = %err,
                "Cache backend unavailable, continuing with memory cache only"
            );
            TrailerCache::memory_only(config.cache_capacity)
        }
    };

    let client = TmdbClient::from_config(&config);
    let service = Arc::new(TrailerService::new(Arc::new(client), cache, config.ttl));

    let server = ProxyServer::bind(config.bind_addr, service, config.max_connections).await?;
    server.run().await?;

    Ok(())
}
