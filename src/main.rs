use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staybook::booking::PricingPolicy;
use staybook::config::{Config, StoreBackend};
use staybook::store::{BookingStore, MemoryStore, PgStore};
use staybook::{app, cache, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staybook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let store: Arc<dyn BookingStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::connect(&config)
                .await
                .context("failed to connect to database")?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(
        store.clone(),
        PricingPolicy::new(config.service_fee_rate),
        config.currency.clone(),
    );

    tokio::spawn(cache::start_cache_warmer(state.cache.clone(), store));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        "Listening on {} (service fee {}, currency {})",
        config.bind_addr, config.service_fee_rate, config.currency
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
