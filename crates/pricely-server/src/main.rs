mod api;
mod error;
mod middleware;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use api::build_app;
use pricely_content::PgContentStore;
use pricely_embeddings::EmbeddingClient;
use pricely_geocoder::GeocoderClient;
use pricely_orchestrator::Orchestrator;
use pricely_proxy::ProxyClient;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match pricely_core::load_app_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load configuration: {error}");
            std::process::exit(1);
        }
    };

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_options = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.db_acquire_timeout_secs));
    let pool = pool_options.connect(&config.content_store_url).await?;

    let content = PgContentStore::new(pool);
    content.ensure_schema().await?;

    let proxy = ProxyClient::new(config.proxy_endpoint.clone(), config.proxy_api_key.clone());
    let geocoder = GeocoderClient::new(config.map_provider_api_keys.clone());
    let embeddings = EmbeddingClient::new(config.embedding_api_key.clone());
    let orchestrator = Orchestrator::with_settings(
        proxy,
        geocoder.clone(),
        embeddings,
        std::time::Duration::from_secs(config.orchestrator_deadline_secs),
        config.platform_max_attempts,
    );

    let state = AppState {
        content: Arc::new(content),
        orchestrator: Arc::new(orchestrator),
        geocoder: Arc::new(geocoder),
        config: Arc::new(config.clone()),
    };

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "pricely-server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
