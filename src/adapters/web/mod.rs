//! JSON web API adapter.
//!
//! Exposes screening, stock snapshots and position sizing over HTTP. Screening
//! and snapshot lookups hit the market-data port synchronously, so handlers run
//! them on the blocking pool.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::domain::error::EdgeFinderError;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::universe_port::UniversePort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";

pub struct AppState {
    pub market_data: Arc<dyn MarketDataPort + Send + Sync>,
    pub universe: Arc<dyn UniversePort + Send + Sync>,
    pub max_workers: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/screener", post(handlers::run_screener))
        .route("/stocks/{symbol}", get(handlers::stock_snapshot))
        .route("/sizer", post(handlers::run_sizer))
        .fallback(handlers::not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(Arc::new(state))
}

/// Binds `listen` and serves the API until the process is stopped.
pub async fn serve(state: AppState, listen: &str) -> Result<(), EdgeFinderError> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(listen, "web API listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
