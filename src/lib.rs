use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod config;
pub mod error;
mod middleware;
pub mod models;
mod routes;
mod schema;
pub mod session;
pub mod store;
mod utils;
mod views;

use self::config::Config;
pub use self::middleware::AppState;
use self::middleware::logging_middleware;
use self::routes::{add, click, dashboard, delete, edit, home, login, login_form, logout};
pub use self::utils::{generate_secret, resolve_secret};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/click/:id", get(click))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/dashboard", get(dashboard))
        .route("/add", post(add))
        .route("/delete/:id", get(delete))
        .route("/edit/:id", post(edit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}

pub async fn run(host: &str, port: u16, config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    info!("Using {} link store", state.store.backend_name());

    let listener = TcpListener::bind((host, port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
