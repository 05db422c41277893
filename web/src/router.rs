use crate::{
    controller::health_check_controller, middleware::auth::require_auth, params, protect,
    ws::handler::ws_handler, AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::controller::{post_controller, user_controller, user_session_controller};

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Postboard API"
        ),
        paths(
            health_check_controller::health_check,
            post_controller::create,
            post_controller::index,
            post_controller::read,
            post_controller::update,
            post_controller::delete,
            user_controller::create,
            user_controller::read,
            user_controller::update,
            user_session_controller::login,
        ),
        components(
            schemas(
                domain::posts::Model,
                domain::users::Model,
                domain::user::Credentials,
                params::post::UpdateParams,
                params::user::UpdateParams,
                user_session_controller::LoginResponse,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "postboard", description = "Users, posts and live post notifications")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines the bearer token authentication requirement for gaining access to
// protected API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned from a successful POST /login"))
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(post_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(user_session_routes(app_state.clone()))
        .merge(ws_routes(app_state))
        // **** FIXME: protect the OpenAPI web UI
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn post_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/posts", post(post_controller::create))
        .merge(
            // PUT/DELETE /posts/{id}
            Router::new()
                .route(
                    "/posts/{id}",
                    put(post_controller::update).delete(post_controller::delete),
                )
                .route_layer(from_fn_with_state(app_state.clone(), protect::posts::author)),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .merge(
            // Reading posts doesn't require auth
            Router::new()
                .route("/posts", get(post_controller::index))
                .route("/posts/{id}", get(post_controller::read)),
        )
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/users", put(user_controller::update))
        .route("/users/{id}", get(user_controller::read))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .merge(
            // Signing up doesn't require auth
            Router::new().route("/users", post(user_controller::create)),
        )
        .with_state(app_state)
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/login", post(user_session_controller::login))
        .with_state(app_state)
}

fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::app_state;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_check_responds_healthy() {
        let app = define_routes(app_state(&[]));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn creating_a_post_requires_a_token() {
        let app = define_routes(app_state(&["--jwt-signing-key", "test-signing-key"]));

        let request = Request::builder()
            .method("POST")
            .uri("/posts")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"post_content":"hello"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn openapi_document_lists_every_route() {
        let openapi = ApiDoc::openapi();
        for path in ["/health", "/login", "/posts", "/posts/{id}", "/users", "/users/{id}"] {
            assert!(openapi.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
