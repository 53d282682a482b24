mod backend;
mod config;
mod routes;
mod services;
mod session;
mod state;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backend::memory::MemoryBackend;
use crate::backend::supabase::SupabaseBackend;
use crate::backend::Backend;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let backend: Arc<dyn Backend> = match &config.supabase {
        Some(supabase) => Arc::new(SupabaseBackend::new(supabase.clone()).expect("backend client init failed")),
        None => {
            tracing::warn!("SUPABASE_URL / SUPABASE_ANON_KEY not set, using in-memory backend");
            Arc::new(MemoryBackend::new())
        }
    };
    tracing::info!(backend = backend.name(), "backend configured");

    let state = state::AppState::new(backend, config);

    // Spawn background session sweeper.
    let _sweeper = session::spawn_sweeper(
        state.sessions.clone(),
        state.config.sweep_interval,
        state.config.session_idle_ttl,
        state.config.session_signed_in_ttl,
        state.shutdown.clone(),
    );

    let shutdown = state.shutdown.clone();
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "inkpost listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .expect("server failed");
}

/// Resolve on Ctrl-C or SIGTERM, cancelling every view scope and the sweeper.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
    token.cancel();
}
