use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{controller::ApiResponse, params::user::UpdateParams};
use crate::{AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{user as UserApi, users, Id};

use log::*;

/// CREATE a new User
#[utoipa::path(
    post,
    path = "/users",
    request_body = domain::users::Model,
    responses(
        (status = 201, description = "Successfully created a new User", body = domain::users::Model),
        (status = 422, description = "Invalid email address or empty password"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(user_model): Json<users::Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("CREATE new User with email {}", user_model.email);

    let user: users::Model = UserApi::create(app_state.db_conn_ref(), user_model).await?;

    info!("Created User {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), user)),
    ))
}

/// GET a User by id
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the User", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let user = UserApi::find_by_id(app_state.db_conn_ref(), id).await?;
    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}

/// UPDATE the authenticated User
#[utoipa::path(
    put,
    path = "/users",
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the User", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid email address")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    let user_id = user.id;
    let updated = UserApi::update(app_state.db_conn_ref(), user_id, params.apply_to(user)).await?;
    Ok(Json(ApiResponse::new(StatusCode::OK.into(), updated)))
}
