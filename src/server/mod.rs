use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::storage::ScoreBackend;

pub mod routes;

/// Server state
pub struct AppState {
    pub store: Mutex<Box<dyn ScoreBackend>>,
    /// Rows returned by `GET /scores` when no limit is given
    pub default_limit: usize,
}

impl AppState {
    pub fn new(store: Box<dyn ScoreBackend>, default_limit: usize) -> Self {
        Self {
            store: Mutex::new(store),
            default_limit,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scores", get(routes::get_scores).post(routes::post_score))
        .route("/diagnostics", get(routes::get_diagnostics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the score API until the process is stopped.
///
/// The store should already have run its legacy migration.
pub async fn start_server(port: u16, store: Box<dyn ScoreBackend>, default_limit: usize) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(store, default_limit));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
