mod app_state;
mod config;
mod error;
mod github;
mod routes;

use axum::routing::get;
use axum::{routing::post, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::build_app_state;
use crate::config::AppConfig;
use crate::routes::webhook_handler::webhook_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let app_state = build_app_state(&config)?;
    info!(
        app_id = app_state.token_issuer.app_id(),
        api = %app_state.api_base_url,
        "GitHub App credentials loaded"
    );
    // Deliveries are not HMAC-verified; put the endpoint behind something that is.
    warn!("webhook signature verification is disabled");

    let app = Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/", get(|| async { "pr-title-bot is running" }))
        .with_state(Arc::new(app_state));

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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

    info!("Signal received, starting graceful shutdown");
}
