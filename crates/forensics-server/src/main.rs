mod auth;
mod config;
mod dto;
mod errors;
mod orchestrator;
mod routes;
mod state;

use config::ServerConfig;
use dns_resolver::DohResolver;
use forensics_audit::{AuditStore, LocalDiskObjectStore, SqliteCatalog};
use state::AppState;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::load()?;

    // Force the confusables table and heuristic regex corpora to compile
    // now, so a bad build fails before we ever bind a socket.
    let _ = forensics_confusables::analyze_domain("example.com");

    std::fs::create_dir_all(&config.base_dir)?;
    let catalog_path = config.base_dir.join("catalog.sqlite");
    let eml_dir = config.base_dir.join("eml");

    let object_store = Arc::new(LocalDiskObjectStore::new(eml_dir));
    let catalog = Arc::new(SqliteCatalog::open(
        catalog_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("base-dir path is not valid UTF-8"))?,
    )?);
    let audit = Arc::new(AuditStore::new(
        object_store,
        catalog,
        config.hmac_secret.clone(),
        format!("http://{}/api", config.listen),
    ));

    let resolver: Arc<dyn dns_resolver::Resolver> = Arc::new(DohResolver::new(config.doh_base_url.clone()));

    let listen = config.listen;
    let state = AppState {
        config: Arc::new(config),
        resolver,
        audit,
        started_at: Instant::now(),
    };

    let router = routes::build_router(state);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(%listen, "forensics-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
}
