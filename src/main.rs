use anyhow::Context;
use catfolio::api::{self, app_state::AppState};
use catfolio::client::{HttpCatApi, PageOrchestrator};
use catfolio::config::{AppConfig, ConfigLoader};
use catfolio::llm::OpenAiChatModel;
use catfolio::observability::{
    ObservabilityState, create_observability_router, init_tracing, startup_checks,
};
use catfolio::store::{KeyValueStore, TtlStore};
use std::sync::Arc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    ConfigLoader::validate(&config).context("invalid configuration")?;
    let _log_guard = init_tracing(&config.logging, &config.app_name)?;

    // 客户端模式：对运行中的服务完整生成一次
    if let Ok(url) = std::env::var("CATFOLIO_CLIENT_URL") {
        info!("Starting Catfolio in client mode against {}...", url);
        return run_client(&url).await;
    }

    info!("Starting Catfolio ({})...", config.environment);
    run_server(config).await
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(TtlStore::new(config.cache.backstory_ttl()));
    info!(
        "Backstory store initialized, ttl {}s",
        config.cache.backstory_ttl_secs
    );

    let model = Arc::new(OpenAiChatModel::new(&config.openai)?);
    info!("Chat model client initialized: {}", config.openai.model);

    let observability = Arc::new(ObservabilityState::new(env!("CARGO_PKG_VERSION")));
    for check in startup_checks(&config) {
        if !check.healthy {
            tracing::warn!("Startup check '{}' failed: {}", check.name, check.message);
        }
        observability.add_health_check(check).await;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app_state = AppState::new(config, model, store);
    info!("Application state created");

    let router = create_observability_router(observability).merge(api::create_router(app_state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn run_client(url: &str) -> anyhow::Result<()> {
    let mut page = PageOrchestrator::new(HttpCatApi::new(url)?);

    let mut updates = page.subscribe();
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            debug!(
                "Page {:?}, backstory {} chars",
                snapshot.state,
                snapshot.profile.backstory.len()
            );
        }
    });

    page.new_cat().await?;
    page.suggest_name().await?;
    page.discover_story().await?;

    let snapshot = page.snapshot();
    if let Some(personality) = &snapshot.profile.personality_type {
        info!(
            "Personality {} ({}): {}",
            personality.code,
            personality.title,
            personality.description().unwrap_or("no description")
        );
    }
    for notice in &snapshot.notices {
        tracing::warn!("Fallback data served: {}", notice);
    }
    info!(
        "Generated profile:\n{}",
        serde_json::to_string_pretty(&snapshot.profile)?
    );

    drop(page);
    watcher.await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
