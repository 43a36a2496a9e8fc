use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response};

use super::config::Config;
use super::error::StoreResult;
use super::session::SessionKeys;
use super::store::{LinkStore, open_store};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn LinkStore>,
    pub sessions: SessionKeys,
}

impl AppState {
    pub fn new(config: Config) -> StoreResult<Self> {
        let store = open_store(&config)?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn LinkStore>) -> Self {
        let sessions = SessionKeys::new(&config.secret, config.session_hours);

        Self {
            config: Arc::new(config),
            store,
            sessions,
        }
    }
}

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    tracing::debug!("{} {}", method, uri);

    let response = next.run(request).await;

    tracing::debug!("{} {} -> {}", method, uri, response.status());

    response
}
