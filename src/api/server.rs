use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{
    auth::{Credentials, require_basic_auth},
    services::{get_job, health, submit_form, submit_job},
    state::AppState,
};
use crate::config::Config;
use crate::observability::Metrics;
use crate::queue::JobQueue;
use crate::worker::{CommandFetcher, DownloadWorker};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the application router.
///
/// With credentials present every route, `/health` included, requires
/// HTTP Basic authentication.
pub fn router(state: AppState, credentials: Option<Arc<Credentials>>) -> Router {
    let app = Router::new()
        .route("/", get(submit_form).post(submit_job))
        .route("/health", get(health))
        .route("/{id}", get(get_job))
        .with_state(state);

    let app = match credentials {
        Some(credentials) => {
            app.layer(middleware::from_fn_with_state(credentials, require_basic_auth))
        }
        None => app,
    };

    app.layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    for dir in [&config.storage.results_dir, &config.storage.work_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    }

    let credentials = match &config.auth.users_file {
        Some(path) => {
            let credentials = Credentials::from_file(path)
                .map_err(|e| format!("Failed to load users: {}", e))?;
            info!(users = credentials.len(), "Basic authentication enabled");
            Some(Arc::new(credentials))
        }
        None => {
            warn!("No users file configured, authentication disabled");
            None
        }
    };

    let metrics = Arc::new(Metrics::new());
    let (queue, jobs) = JobQueue::new(config.queue.capacity);

    let fetcher = CommandFetcher::new(config.fetch.program.clone());
    info!(program = %fetcher.program(), "Using fetch program");
    let worker = DownloadWorker::new(
        jobs,
        config.worker_config(),
        config.retention.result_ttl(),
        fetcher,
        metrics.clone(),
    );
    let worker_handle = tokio::spawn(worker.run());

    let address = config.server.listen_addr();
    let state = AppState::new(config, queue, metrics);
    let app = router(state, credentials);

    let listener = TcpListener::bind(address.as_str())
        .await
        .map_err(|e| format!("Failed to bind {address}: {e}"))?;
    info!(%address, local_addr = %listener.local_addr()?, "vidbox listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // An in-flight fetch is not awaited; the child process is killed with it.
    worker_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
