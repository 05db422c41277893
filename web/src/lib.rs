//! HTTP and WebSocket surface of the postboard service.

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use events::EventPublisher;
use hub::HubHandle;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::{Error, Result};

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod protect;
pub mod router;
mod ws;

/// Everything a request handler can reach. Cloned per route, so each field is
/// a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub hub: HubHandle,
    pub event_publisher: EventPublisher,
}

impl AppState {
    pub fn new(
        service_state: service::AppState,
        hub: HubHandle,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            service_state,
            hub,
            event_publisher,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.config().clone();
    let interface = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listen_addr = format!("{interface}:{}", config.port);

    info!(
        "Server starting... listening for connections on http://{listen_addr} ({} mode)",
        config.runtime_env()
    );

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_origin(allowed_origins);

    let hub = app_state.hub.clone();
    let listener = TcpListener::bind(&listen_addr).await?;

    axum::serve(listener, router::define_routes(app_state).layer(cors_layer))
        .with_graceful_shutdown(shutdown_signal(hub))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C. Open WebSocket connections are closed by shutting the
/// hub down before the server waits for in-flight HTTP requests.
async fn shutdown_signal(hub: HubHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {e}");
    }
    info!("Shutdown signal received, closing WebSocket connections");
    hub.shutdown();
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppState;
    use clap::Parser;
    use events::EventPublisher;
    use hub::{ConnectionSettings, Hub};
    use sea_orm::DatabaseConnection;
    use service::config::Config;
    use std::sync::Arc;

    /// State backed by a disconnected database, for routes that never query it.
    pub(crate) fn app_state(args: &[&str]) -> AppState {
        app_state_with_db(DatabaseConnection::Disconnected, args)
    }

    pub(crate) fn app_state_with_db(db: DatabaseConnection, args: &[&str]) -> AppState {
        let config = Config::parse_from(std::iter::once("postboard").chain(args.iter().copied()));
        let service_state = service::AppState::new(config, &Arc::new(db));
        AppState::new(
            service_state,
            Hub::spawn(ConnectionSettings::default()),
            EventPublisher::new(),
        )
    }
}
