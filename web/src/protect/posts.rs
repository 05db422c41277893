use crate::protect::{authorize, Predicate, UserIsAuthor};
use crate::{extractors::authenticated_user::AuthenticatedUser, AppState, Error};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use domain::{post as PostApi, Id};
use log::*;

/// Checks that the authenticated user wrote the post specified by `id`.
/// Intended to be given to axum::middleware::from_fn_with_state in the router
pub(crate) async fn author(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Id>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    match PostApi::find_by_id(app_state.db_conn_ref(), id).await {
        Ok(post) => {
            let checks = vec![Predicate::new(UserIsAuthor, vec![post.user_id])];
            authorize(&app_state, user, request, next, checks)
                .await
                .into_response()
        }
        Err(e) => {
            warn!("Could not load post {id} for an ownership check: {e}");
            Error::from(e).into_response()
        }
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::middleware::auth::require_auth;
    use crate::test_support::app_state_with_db;
    use axum::{
        body::Body,
        http::Request,
        middleware::from_fn_with_state,
        routing::put,
        Router,
    };
    use chrono::Utc;
    use axum::http::StatusCode;
    use domain::{jwt, posts, users};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use tower::ServiceExt;

    async fn edited() -> &'static str {
        "edited"
    }

    fn user() -> users::Model {
        users::Model {
            id: Id::new_v4(),
            email: "jane@example.com".to_string(),
            display_name: None,
            password: "hash".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn post_by(user_id: Id) -> posts::Model {
        posts::Model {
            id: Id::new_v4(),
            post_content: "hello".to_string(),
            user_id,
            created_at: Utc::now().into(),
        }
    }

    async fn put_post(db: MockDatabase, caller: &users::Model, post_id: Id) -> StatusCode {
        let app_state = app_state_with_db(
            db.into_connection(),
            &["--jwt-signing-key", "test-signing-key"],
        );
        let jwt = jwt::issue_token(app_state.config(), caller.id).unwrap();
        let app = Router::new()
            .route("/posts/{id}", put(edited))
            .route_layer(from_fn_with_state(app_state.clone(), author))
            .route_layer(from_fn_with_state(app_state.clone(), require_auth))
            .with_state(app_state);

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/posts/{post_id}"))
            .header("authorization", format!("Bearer {}", jwt.token))
            .body(Body::empty())
            .unwrap();

        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn authors_may_edit_their_posts() {
        let author = user();
        let post = post_by(author.id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[author.clone()]])
            .append_query_results([[post.clone()]]);

        assert_eq!(put_post(db, &author, post.id).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn other_users_are_forbidden() {
        let caller = user();
        let post = post_by(Id::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[caller.clone()]])
            .append_query_results([[post.clone()]]);

        assert_eq!(put_post(db, &caller, post.id).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_posts_are_not_found() {
        let caller = user();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[caller.clone()]])
            .append_query_results([Vec::<posts::Model>::new()]);

        assert_eq!(
            put_post(db, &caller, Id::new_v4()).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn database_failures_are_server_errors() {
        let caller = user();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[caller.clone()]])
            .append_query_errors([DbErr::Custom("connection reset".to_string())]);

        assert_eq!(
            put_post(db, &caller, Id::new_v4()).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
