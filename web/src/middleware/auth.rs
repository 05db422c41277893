use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::jwt;
use log::*;

/// Authentication middleware that returns 401 Unauthorized unless the request
/// carries a valid `Authorization: Bearer <token>` header.
///
/// The decoded [`jwt::Claims`] are stored in the request extensions for the
/// `AuthenticatedUser` extractor.
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    match jwt::validate_token(app_state.config(), token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            debug!("Rejecting request with invalid token: {e}");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

/// The token part of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
