use anyhow::Result;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{ConfigLoader, ResolverSettings, StaticConfig};
use crate::storage::Storage;

pub mod resolve;
pub mod slots;
pub mod venues;

pub struct AppState {
    pub storage: Storage,
    pub loader: Mutex<ConfigLoader>,
    pub resolver: ResolverSettings,
}

impl AppState {
    pub async fn static_config(&self) -> Result<Arc<StaticConfig>> {
        self.loader.lock().await.get()
    }
}

/// 500 with the error chain as body
pub fn internal_error(context: &str, error: anyhow::Error) -> Response {
    log::error!("{}: {:?}", context, error);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{}: {:#}", context, error)).into_response()
}
