// src/lib.rs
pub mod cache;
pub mod cache_control;
pub mod config;
pub mod error;
pub mod hash;
pub mod http_handlers;
pub mod negotiate;
pub mod response;
pub mod transcode;
pub mod types;
pub mod upstream;

use axum::{http::Method, routing::get, Router};
use cache::{CacheStore, CacheWriter, FsCacheStore};
use config::Config;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transcode::{ImageTranscoder, Transcoder};

/// Shared by every request. Nothing in here is mutated after startup; the
/// only cross-request state is what the cache store keeps on disk.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
    pub cache: Arc<dyn CacheStore>,
    pub cache_writer: CacheWriter,
    pub transcoder: Arc<dyn Transcoder>,
}

impl ServerState {
    /// Spawns the cache writer, so it has to run inside a tokio runtime.
    ///
    /// The returned handle finishes once every clone of the state is gone and
    /// the pending cache writes have been flushed.
    pub fn new(
        config: Arc<Config>,
        http_client: reqwest::Client,
        cache: Arc<dyn CacheStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> (Self, JoinHandle<()>) {
        let (cache_writer, writer_handle) = CacheWriter::spawn(cache.clone());
        let state = Self {
            config,
            http_client,
            cache,
            cache_writer,
            transcoder,
        };
        (state, writer_handle)
    }
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resize_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Production wiring: disk cache under `config.cache_dir` and the `image`
/// crate transcoder.
pub fn setup_shared_state(config: Arc<Config>) -> Result<(ServerState, JoinHandle<()>), reqwest::Error> {
    let http_client = upstream::build_client(config.upstream_timeout)?;
    let cache = Arc::new(FsCacheStore::new(config.cache_dir.clone()));

    info!(
        "🗂️ Cache root: {:?} | allowed domains: {:?} | base url: {:?}",
        cache.root(),
        config.allow_domains,
        config.base_url.as_ref().map(|u| u.as_str())
    );

    Ok(ServerState::new(config, http_client, cache, Arc::new(ImageTranscoder)))
}

/// `GET /` only; other methods get 405 from the method router.
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(http_handlers::image_proxy_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::HEAD])
                .allow_headers(Any),
        )
}
