use crate::middleware::auth::bearer_token;
use crate::AppState;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::jwt;
use futures::StreamExt;
use hub::HubHandle;
use log::*;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WsParams {
    /// Login token for clients that cannot set an `Authorization` header.
    token: Option<String>,
}

/// GET /ws
///
/// Clients receive `{"type": ..., "payload": ...}` text frames for every
/// broadcast event. Anything the client sends is ignored.
pub(crate) async fn ws_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<WsParams>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            warn!("Rejected WebSocket handshake: {rejection}");
            return rejection.into_response();
        }
    };

    if app_state.config().ws_require_auth {
        let token = bearer_token(&headers).or(params.token.as_deref());
        let authorized = token
            .map(|token| jwt::validate_token(app_state.config(), token).is_ok())
            .unwrap_or(false);
        if !authorized {
            debug!("Rejecting unauthenticated WebSocket handshake");
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    }

    let hub = app_state.hub.clone();
    upgrade
        .on_failed_upgrade(|e| warn!("WebSocket upgrade failed: {e}"))
        .on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: HubHandle) {
    let connection = hub.connect();
    debug!("WebSocket upgraded, serving connection {}", connection.id());

    let (sink, stream) = socket.split();
    connection.serve(sink, stream).await;
}
