use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::{jwt::Claims, user as UserApi, users};
use log::*;

pub(crate) struct AuthenticatedUser(pub users::Model);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    // Reads the claims `require_auth` stored on the request and loads the user
    // they name. A token for a user that no longer exists is rejected.
    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(claims) = parts.extensions.get::<Claims>() else {
            warn!("AuthenticatedUser used on a route without require_auth");
            return Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
        };

        match UserApi::find_by_id(app_state.db_conn_ref(), claims.sub).await {
            Ok(user) => Ok(AuthenticatedUser(user)),
            Err(e) => {
                debug!("No user for token subject {}: {e}", claims.sub);
                Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))
            }
        }
    }
}
