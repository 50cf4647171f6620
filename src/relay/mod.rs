//! HTTP relay that forwards model requests upstream and keeps the API key server-side.

mod forward;
mod middleware;

pub use forward::candidate_text;
pub use middleware::{Decision, RateLimiter};

use crate::config::RelayConfig;
use crate::log_debug;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use reqwest::Client;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use url::Url;

/// Shared by every relay request
pub struct RelayState {
    client: Client,
    upstream_url: Url,
    api_key: String,
}

impl RelayState {
    pub fn new(config: &RelayConfig, api_key: String) -> Result<Self> {
        let upstream_url = Url::parse(&format!(
            "{}/models/{}:generateContent",
            config.upstream_base.trim_end_matches('/'),
            config.model
        ))
        .with_context(|| format!("Invalid upstream URL for model {}", config.model))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            client,
            upstream_url,
            api_key,
        })
    }

    pub fn upstream_url(&self) -> &Url {
        &self.upstream_url
    }
}

/// Build the relay router: forwarding route, health check, optional static files
pub fn router(state: Arc<RelayState>, config: &RelayConfig) -> Router {
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    let mut app = Router::new()
        .route(&config.route, post(forward::forward))
        .route_layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit,
        ))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    if let Some(dir) = &config.static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {}", dir.display());
            let serve = ServeDir::new(dir)
                .append_index_html_on_directories(true)
                .fallback(ServeFile::new(dir.join("index.html")));
            app = app.fallback_service(serve);
        } else {
            tracing::warn!("Static dir not found: {}", dir.display());
        }
    }

    if config.cors {
        app = app.layer(CorsLayer::permissive());
    }

    // outermost, so static files get the headers too
    app.with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// A bound, not yet running relay
pub struct RelayServer {
    listener: TcpListener,
    router: Router,
}

impl RelayServer {
    /// Resolve the API key, build the router and bind the listener
    pub async fn bind(config: &RelayConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let state = Arc::new(RelayState::new(config, api_key)?);
        log_debug!("Relay forwarding to {}", state.upstream_url());

        let address = format!("{}:{}", config.listen_address, config.port);
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind relay to {address}"))?;

        Ok(Self {
            listener,
            router: router(state, config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Relay listener has no local address")
    }

    /// Serve until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let address = self.local_addr()?;
        tracing::info!(%address, "Relay listening");

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Relay server failed")
    }
}
