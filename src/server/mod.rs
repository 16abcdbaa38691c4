use crate::cache::{self, CacheStore, HandleCache, MemoryStore, NullStore, ResponseCache};
use crate::config::Config;
use crate::engine::{ResolutionEngine, YtDlpEngine};
use crate::error::Error;
use crate::resolver::Resolver;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod routes_check;
pub mod routes_download;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub resolver: Arc<Resolver>,
    /// Read side of the handle cache, used by the range proxy.
    pub handles: HandleCache,
    /// Client for upstream origin fetches. Connect timeout only; a full
    /// request timeout would cut off long-lived streaming bodies.
    pub upstream: reqwest::Client,
    /// Whether the cache store persists across requests.
    pub cache_enabled: bool,
}

impl AppContext {
    /// Build a context from explicit collaborators. Used by `start_server`
    /// and by the integration test harness.
    pub fn new(
        config: Config,
        engine: Arc<dyn ResolutionEngine>,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        let cache_enabled = store.is_enabled();
        let handles = HandleCache::new(
            store.clone(),
            Duration::from_secs(config.cache.handle_ttl_secs),
        );
        let responses = ResponseCache::new(
            store,
            Duration::from_secs(config.cache.response_ttl_secs),
        );

        let resolver = Resolver::new(
            engine,
            handles.clone(),
            responses,
            config.engine.filesize_cap_mb,
            config.proxy.max_response_size,
        );

        let upstream = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.proxy.connect_timeout_secs))
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            handles,
            upstream,
            cache_enabled,
        })
    }
}

/// Error responses use the `{"success": false, "error": ...}` body shape on
/// every non-2xx status.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }

        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::RANGE])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
        ]);

    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api",
            routes_check::routes().merge(routes_download::routes()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check(
    axum::extract::State(ctx): axum::extract::State<AppContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "cache_enabled": ctx.cache_enabled,
    }))
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let engine: Arc<dyn ResolutionEngine> = Arc::new(YtDlpEngine::new(
        config.engine.binary.clone(),
        Duration::from_secs(config.engine.timeout_secs),
    ));

    let store: Arc<dyn CacheStore> = if config.cache.enabled {
        Arc::new(MemoryStore::new(config.cache.max_entries))
    } else {
        tracing::warn!("cache disabled, operating without persistence");
        Arc::new(NullStore)
    };

    if store.is_enabled() {
        cache::start_cleanup_task(store.clone(), config.cache.cleanup_interval_secs);
    }

    let ctx = AppContext::new(config, engine, store)?;
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
