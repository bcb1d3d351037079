//! AgentX Assistant API
//!
//! Hosts the rule-based yield assistant over HTTP, one dialogue engine per
//! conversation session.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agentx_assistant::{routes, AppState, Config, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentx_assistant=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let catalog = config.load_catalog()?;
    match &config.catalog_path {
        Some(path) => tracing::info!(
            "Loaded {} topic(s) from {}",
            catalog.topics.len(),
            path.display()
        ),
        None => tracing::info!("Using built-in catalog ({} topics)", catalog.topics.len()),
    }
    if let Some(seed) = config.rng_seed {
        tracing::info!(seed, "Reply selection is seeded");
    }

    let sessions = Arc::new(
        SessionStore::new(catalog, config.rng_seed).with_max_sessions(config.max_sessions),
    );

    // Sweep abandoned conversations
    let idle = chrono::Duration::seconds(config.session_idle_secs.min(i64::MAX as u64 / 1000) as i64);
    let sweep_every = Duration::from_secs((config.session_idle_secs / 4).max(1));
    let sweeper = Arc::clone(&sessions);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sweeper.evict_idle(idle).await;
        }
    });

    let state = AppState { config, sessions };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("AgentX assistant running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
