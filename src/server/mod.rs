//! HTTP surface
//!
//! `POST /analyze-planning` and `POST /quick-advice` require an inbound key;
//! `GET /`, `GET /health` and `GET /supported-providers` do not.

mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use plancoach_gate::AccessGate;
use plancoach_orchestrator::Orchestrator;
use plancoach_utils::types::ServiceInfo;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ErrorBody, UNAUTHORIZED_DETAIL};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY: &str = "api_key";

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no provider could be built; advisory routes then fail with 500.
    pub orchestrator: Option<Arc<Orchestrator>>,
    pub gate: Arc<AccessGate>,
    pub info: Arc<ServiceInfo>,
    /// Strings scrubbed from every error body: provider key and inbound keys.
    pub secrets: Arc<[String]>,
}

impl AppState {
    pub fn new(
        orchestrator: Option<Arc<Orchestrator>>,
        gate: AccessGate,
        info: ServiceInfo,
        secrets: Vec<String>,
    ) -> Self {
        Self {
            orchestrator,
            gate: Arc::new(gate),
            info: Arc::new(info),
            secrets: secrets.into(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &self.orchestrator)
            .field("gate", &self.gate)
            .field("info", &self.info)
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

/// Service identity reported at `GET /`.
pub fn service_info(orchestrator: Option<&Orchestrator>) -> ServiceInfo {
    ServiceInfo {
        service: "plancoach".to_string(),
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm_provider: orchestrator
            .map(|o| o.provider_kind().to_string())
            .unwrap_or_else(|| "none".to_string()),
        llm_model: orchestrator
            .map(|o| o.model().to_string())
            .unwrap_or_default(),
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(API_KEY_HEADER),
        ]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/supported-providers", get(handlers::providers))
        .route("/analyze-planning", post(handlers::analyze_planning))
        .route("/quick-advice", post(handlers::quick_advice))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(host: &str, port: u16, state: AppState) -> std::io::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(addr = %listener.local_addr()?, "plancoach listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
