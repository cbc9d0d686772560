//! NetShield AI Engine
//!
//! Prediction-serving façade for network-traffic intrusion detection. Loads
//! a fixed set of pre-trained classifiers (one deep-learning model and one
//! classical model per dataset) plus fitted feature scalers at startup, and
//! exposes HTTP endpoints that run uploaded or manually-entered feature
//! vectors through the matching model.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   NETSHIELD AI ENGINE                      │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │  API      │   │ Preprocess   │   │  Asset Registry  │  │
//! │  │  (Axum)   ├──▶│ align+scale  ├──▶│  ONNX / trees /  │  │
//! │  │           │   │ +reshape     │   │  scalers         │  │
//! │  └───────────┘   └──────────────┘   └──────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod explain;
mod handlers;
mod preprocess;
mod registry;
mod table;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};
use registry::AssetRegistry;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "netshield_engine=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("NetShield AI Engine starting...");
    tracing::info!("Model directory: {}", config.models_dir.display());

    // Load models and scalers; a failure here is logged, not fatal, and the
    // server keeps serving with whatever partial registry was built.
    let registry = AssetRegistry::load(&config.models_dir);

    let state = AppState {
        registry: Arc::new(registry),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind server address");
    axum::serve(listener, app).await.expect("server error");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AssetRegistry>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::check))
        .route("/analyze/:dataset/:model_type", post(handlers::analyze::analyze))
        .route("/analyze-manual", post(handlers::manual::analyze_manual))
        .route("/explain-manual", post(handlers::manual::explain_manual))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
