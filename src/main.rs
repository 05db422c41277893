use events::EventPublisher;
use hub::{ConnectionSettings, Hub, HubDomainEventHandler};
use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Connecting to database [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let hub = Hub::spawn(ConnectionSettings::new(
        config.ws_outbound_queue_capacity,
        Duration::from_secs(config.ws_ping_interval_secs),
    ));
    info!(
        "WebSocket hub started (queue capacity {}, ping every {}s)",
        hub.settings().outbound_queue_capacity,
        hub.settings().ping_interval.as_secs()
    );

    let event_publisher =
        EventPublisher::new().with_handler(Arc::new(HubDomainEventHandler::new(hub.clone())));

    let service_state = service::AppState::new(config, &db);
    let app_state = web::AppState::new(service_state, hub, event_publisher);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server exited with an error: {e}");
        std::process::exit(1);
    }
}
