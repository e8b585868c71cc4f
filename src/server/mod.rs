//! HTTP surface
//!
//! One streaming endpoint plus a health probe. Each request gets its own
//! generation session; the only shared state is read-only.

mod form;
mod routes;

pub use form::parse_generation_form;
pub use routes::{ApiError, create_router};

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::ai::provider::SharedProvider;
use crate::config::Config;
use crate::generation::ContinuationController;
use crate::templates::TemplateStore;
use crate::types::Result;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub provider: SharedProvider,
    pub templates: TemplateStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, provider: SharedProvider) -> Self {
        Self {
            provider,
            templates: TemplateStore::new(config.templates.dir.clone()),
            config: Arc::new(config),
        }
    }

    /// Fresh controller for one session
    pub fn controller(&self) -> ContinuationController {
        ContinuationController::new(self.provider.clone())
            .with_session_timeout(self.config.generation.session_timeout())
    }
}

/// Bind and serve until Ctrl-C (or SIGTERM on unix)
pub async fn serve(config: Config, provider: SharedProvider) -> Result<()> {
    let listener = TcpListener::bind(&config.server.bind).await?;
    let state = AppState::new(config, provider);

    info!(
        "Listening on http://{} (provider: {}, model: {})",
        listener.local_addr()?,
        state.provider.name(),
        state.provider.model()
    );
    info!("Templates: {}", state.templates.dir().display());

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
