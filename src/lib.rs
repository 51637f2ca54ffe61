//! Staybook: booking, pricing and availability service for vacation rentals.

pub mod booking;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;
pub mod store;

use axum::Router;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::booking::PricingPolicy;
use crate::cache::AppCache;
use crate::store::BookingStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub cache: AppCache,
    pub pricing: PricingPolicy,
    pub currency: String,
}

impl AppState {
    pub fn new(store: Arc<dyn BookingStore>, pricing: PricingPolicy, currency: impl Into<String>) -> Self {
        Self {
            store,
            cache: AppCache::new(),
            pricing,
            currency: currency.into(),
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .merge(booking::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
