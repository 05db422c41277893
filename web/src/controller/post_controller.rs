use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::post::{IndexParams, UpdateParams};
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::post as PostApi;
use domain::{posts::Model, Id};

use log::*;

/// POST create a new Post owned by the authenticated user. Connected
/// WebSocket clients are sent a `Post_Created` notification.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = domain::posts::Model,
    responses(
        (status = 201, description = "Successfully created a new Post", body = domain::posts::Model),
        (status = 422, description = "Unprocessable Entity"),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(post_model): Json<Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new Post for user {}", user.id);

    let post = PostApi::create(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        post_model,
        user.id,
    )
    .await?;

    debug!("New Post: {post:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), post)),
    ))
}

/// GET all Posts, newest first
#[utoipa::path(
    get,
    path = "/posts",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved Posts", body = [domain::posts::Model]),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Posts with {params:?}");

    let posts = PostApi::find_all(app_state.db_conn_ref(), params.user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), posts)))
}

/// GET a particular Post specified by its id.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(
        ("id" = String, Path, description = "Post id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved a specific Post by its id", body = domain::posts::Model),
        (status = 404, description = "Post not found"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let post = PostApi::find_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), post)))
}

/// PUT new content into a Post the authenticated user owns
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(
        ("id" = String, Path, description = "Id of the Post to update")
    ),
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the Post", body = domain::posts::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Post belongs to another user"),
        (status = 404, description = "Post not found"),
        (status = 422, description = "Unprocessable Entity")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Post {id}");

    let post = PostApi::update(app_state.db_conn_ref(), id, params.post_content).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), post)))
}

/// DELETE a Post the authenticated user owns
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(
        ("id" = String, Path, description = "Id of the Post to delete")
    ),
    responses(
        (status = 204, description = "Successfully deleted the Post"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Post belongs to another user"),
        (status = 404, description = "Post not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Post {id}");

    PostApi::delete_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}
