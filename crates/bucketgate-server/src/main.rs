use bucketgate_core::{bind, serve, Gateway, ServerConfig};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Use mimalloc for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> bucketgate_core::Result<()> {
    let config = ServerConfig::from_env()?;
    tracing::info!(
        address = %config.address(),
        store = ?config.store,
        max_body_size = config.max_body_size,
        "starting bucketgate"
    );

    let gateway = Arc::new(Gateway::new(config.store.build(), &config));
    let listener = bind(&config).await?;

    serve(listener, gateway, &config, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
