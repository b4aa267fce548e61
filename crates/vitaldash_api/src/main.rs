use std::sync::Arc;

use tokio::signal;
use vitaldash_api::{AppState, Config, router};
use vitaldash_engine::memory::MemoryHealthStore;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Configure logging from env var `VITALDASH_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("VITALDASH_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("vitaldash_api: log filter = {}", log_env);

    let config = Config::from_env();
    let state = AppState::new(Arc::new(MemoryHealthStore::new()));
    let app = router(state, config.request_timeout);

    tracing::info!(address = %config.address, "starting dashboard API server");
    let listener = match tokio::net::TcpListener::bind(config.address).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to address {}: {e}", config.address);
            std::process::exit(1);
        }
    };
    let server = axum::serve(listener, app.into_make_service());
    if let Err(e) = server
        .with_graceful_shutdown(async {
            signal::ctrl_c()
                .await
                .expect("failed to install ctrl+c handler");
        })
        .await
    {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
    Ok(())
}
