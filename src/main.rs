// src/main.rs
use anyhow::Context;
use clap::Parser;
use resize_proxy::{
    build_router,
    config::{Args, Config},
    init_tracing, setup_shared_state,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(Config::from(Args::parse()));
    let (state, cache_writer) =
        setup_shared_state(config.clone()).context("Failed to build upstream HTTP client")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    info!("🚀 Resize proxy is running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    // 路由已释放，写入通道关闭，等待队列中的缓存写入完成
    info!("Server stopped, flushing pending cache writes");
    if let Err(e) = cache_writer.await {
        tracing::error!("Cache writer failed: {}", e);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
