use anyhow::Result;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{AppState, create_router};
use crate::config::{AppConfig, ConfigLoader};
use crate::storage::Storage;

/// Read-only HTTP API over the saved documents and the venue resolver
pub struct ServerService {
    port: u16,
    config: AppConfig,
}

impl ServerService {
    pub fn new(port: u16, config: AppConfig) -> Self {
        Self { port, config }
    }

    pub fn app(&self) -> Result<axum::Router> {
        let state = Arc::new(AppState {
            storage: Storage::from_settings(&self.config.storage, &self.config.scraper)?,
            loader: Mutex::new(ConfigLoader::new(self.config.registry.clone())),
            resolver: self.config.resolver.clone(),
        });

        let middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        Ok(create_router(state).layer(middleware))
    }

    pub async fn run(&self) -> Result<()> {
        let app = self.app()?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
