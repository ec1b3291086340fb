// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::observation_cache::ObservationCache;
use crate::domain::city::CityRegistry;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::open_meteo_repository::OpenMeteoRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(OpenMeteoRepository::new(
        config.open_meteo.base_url.clone(),
        config.open_meteo.timeout(),
    )?);

    // Create services (application layer)
    let cache = ObservationCache::new(repository, config.cache.ttl());
    let cache_ttl = cache.ttl();
    let dashboard_service = DashboardService::new(cache, CityRegistry)
        .with_fetch_timeout(config.open_meteo.timeout());

    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!(
        "Starting weather dashboard on {} (provider {}, cache ttl {}s)",
        addr,
        config.open_meteo.base_url,
        cache_ttl.as_secs()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
