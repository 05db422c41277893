use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use domain::user::{self as UserApi, Credentials};
use domain::users;
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct LoginResponse {
    /// Bearer token to send as `Authorization: Bearer <token>`.
    token: String,
    /// The authenticated user's id.
    sub: String,
    user: users::Model,
}

/// Logs the user in and returns a signed bearer token.
///
/// Pass the token back on every protected call, e.g.:
/// curl --header "Authorization: Bearer <token>" --request PUT http://localhost:4000/users
#[utoipa::path(
    post,
    path = "/login",
    request_body = domain::user::Credentials,
    responses(
        (status = 200, description = "Logs in and returns a bearer token", body = LoginResponse),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<impl IntoResponse, Error> {
    let email = creds.email.clone();
    let (user, jwt) = UserApi::login(app_state.db_conn_ref(), app_state.config(), creds)
        .await
        .inspect_err(|_| warn!("Authentication failed for {email:?}"))?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        LoginResponse {
            token: jwt.token,
            sub: jwt.sub,
            user,
        },
    )))
}
