use anyhow::Context;
use tracing::{info, warn};

use diagram_api::config::ApiConfig;
use diagram_api::middleware::observability::init_tracing;
use diagram_api::routes::{create_app, create_app_state_with_storage};

// Panic hook to catch and log panics
fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC occurred!");
        if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            eprintln!("Panic message: {}", s);
        }
        if let Some(location) = panic_info.location() {
            eprintln!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
    }));
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    setup_panic_hook();

    let config = ApiConfig::from_env().context("Invalid configuration")?;

    init_tracing(&config)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize tracing")?;
    info!("Application starting...");

    if config.is_dev_jwt_secret() {
        warn!("JWT_SECRET not set! Using default secret for development. DO NOT USE IN PRODUCTION!");
    }

    let addr = config.listen_addr;
    let app_state = create_app_state_with_storage(config)
        .await
        .context("Failed to initialize storage")?;
    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind listener on {}", addr))?;
    info!("Server listening on {}", addr);
    info!("Health check available at http://{}/health", addr);
    info!("OpenAPI document available at http://{}/api/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix (Docker stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
