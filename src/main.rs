use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::filter::Directive;

use quest_service::config::ServiceConfig;
use quest_service::quest::{api, HotReloadEvent, QuestCatalog, QuestRegistry};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                config
                    .log_filter
                    .parse::<Directive>()
                    .context("invalid log_filter directive")?,
            ),
        )
        .init();

    let data_dir = config.data_dir.clone();
    let catalog = tokio::task::spawn_blocking(move || QuestCatalog::load_from_directory(&data_dir))
        .await?
        .inspect_err(|e| error!("Quest catalog build failed: {}", e))
        .context("failed to build quest catalog")?;
    info!("Loaded {} quests", catalog.len());

    let registry = Arc::new(QuestRegistry::new(catalog));

    if config.hot_reload {
        match registry.start_file_watcher(config.data_dir.clone()) {
            Ok(mut events) => {
                tokio::spawn(async move {
                    while let Some(event) = events.recv().await {
                        match event {
                            HotReloadEvent::Reloaded(path) => {
                                info!("Quests reloaded after change to {}", path)
                            }
                            HotReloadEvent::Error(e) => warn!("Quest reload failed: {}", e),
                        }
                    }
                });
            }
            Err(e) => warn!("Failed to start quest hot-reload watcher: {}", e),
        }
    }

    let app = api::router(registry, &config.base_path);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Quest service listening on http://{}{}", addr, config.base_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Quest service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
