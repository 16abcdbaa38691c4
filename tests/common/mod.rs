//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which builds a full [`AppContext`] around an
//! in-memory cache store and a caller-supplied engine, and [`StubEngine`],
//! a programmable [`ResolutionEngine`] that records how it was called.
//! The [`TestHarness::with_server`] constructors start Axum on a random
//! port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use streamgate::cache::{CacheStore, MemoryStore};
use streamgate::config::Config;
use streamgate::engine::{
    EngineError, EngineStream, Provider, Resolution, ResolutionEngine,
};
use streamgate::model::MediaKind;
use streamgate::server::{create_router, AppContext};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory cache store.
pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new(engine: Arc<dyn ResolutionEngine>) -> Self {
        Self::with_config(Config::default(), engine)
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config, engine: Arc<dyn ResolutionEngine>) -> Self {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new(config.cache.max_entries));
        let ctx = AppContext::new(config, engine, store).expect("failed to build context");
        Self { ctx }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(engine: Arc<dyn ResolutionEngine>) -> (Self, SocketAddr) {
        Self::with_server_config(Config::default(), engine).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(
        config: Config,
        engine: Arc<dyn ResolutionEngine>,
    ) -> (Self, SocketAddr) {
        let harness = Self::with_config(config, engine);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

type Outcome = Box<dyn Fn() -> Result<Resolution, EngineError> + Send + Sync>;

/// Programmable engine double recording every call.
pub struct StubEngine {
    pub calls: AtomicUsize,
    pub last_expr: Mutex<Option<String>>,
    delay: Option<Duration>,
    outcome: Outcome,
}

impl StubEngine {
    pub fn ok(resolution: Resolution) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_expr: Mutex::new(None),
            delay: None,
            outcome: Box::new(move || Ok(resolution.clone())),
        })
    }

    pub fn ok_with_delay(resolution: Resolution, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_expr: Mutex::new(None),
            delay: Some(delay),
            outcome: Box::new(move || Ok(resolution.clone())),
        })
    }

    pub fn not_found() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_expr: Mutex::new(None),
            delay: None,
            outcome: Box::new(|| Err(EngineError::NotFound)),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let message = message.to_string();
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_expr: Mutex::new(None),
            delay: None,
            outcome: Box::new(move || Err(EngineError::Extraction(message.clone()))),
        })
    }
}

#[async_trait]
impl ResolutionEngine for StubEngine {
    async fn resolve(
        &self,
        _query: &str,
        _provider: Provider,
        format_expr: &str,
    ) -> Result<Resolution, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_expr.lock().unwrap() = Some(format_expr.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.outcome)()
    }
}

/// A single-stream audio resolution pointing at `url`.
pub fn audio_resolution(url: &str, size: u64) -> Resolution {
    Resolution {
        title: "A Song".into(),
        ext: "m4a".into(),
        needs_mux: false,
        streams: vec![EngineStream {
            url: url.to_string(),
            ext: "m4a".into(),
            format_id: "140".into(),
            approx_size: size,
            kind: MediaKind::Audio,
        }],
    }
}

/// A merged audio+video resolution that needs client-side muxing.
pub fn muxed_resolution(video_url: &str, audio_url: &str) -> Resolution {
    Resolution {
        title: "A Video".into(),
        ext: "mp4".into(),
        needs_mux: true,
        streams: vec![
            EngineStream {
                url: video_url.to_string(),
                ext: "mp4".into(),
                format_id: "137".into(),
                approx_size: 52_428_800,
                kind: MediaKind::Video,
            },
            EngineStream {
                url: audio_url.to_string(),
                ext: "m4a".into(),
                format_id: "140".into(),
                approx_size: 4_194_304,
                kind: MediaKind::Audio,
            },
        ],
    }
}
