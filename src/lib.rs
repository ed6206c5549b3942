use axum::{
    extract::{Query, State},
    http::Method,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod engines;
pub mod models;
pub mod proxy;

use config::{Config, ProxyConfig};
use engines::{Extractor, InstagramExtractor, Orchestrator, YtDlpExtractor};
use models::{ExtractRequest, ProxyQuery};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub proxy: ProxyConfig,
}

impl AppState {
    /// Primary `yt-dlp` engine first, Instagram GraphQL second.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let engines: Vec<Box<dyn Extractor>> = vec![
            Box::new(YtDlpExtractor::new(config.ytdlp.clone())),
            Box::new(InstagramExtractor::new(config.instagram.clone())?),
        ];
        Ok(Self::new(Orchestrator::new(engines)).with_proxy(config.proxy.clone()))
    }

    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            proxy: ProxyConfig::default(),
        }
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_endpoint))
        .route("/proxy", get(proxy_endpoint))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn extract_endpoint(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Response {
    tracing::info!(url = %req.url, "ingesting url");
    Json(state.orchestrator.resolve(&req.url).await).into_response()
}

async fn proxy_endpoint(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    tracing::info!(url = %query.url, "proxying media");
    match proxy::relay(&query.url, &state.proxy).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}
