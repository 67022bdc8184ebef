// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP API: router assembly and OpenAPI documentation.
//!
//! Every route below also appears in the access policy's route table
//! (`auth::policy`); the auth gate resolves the logical method name from the
//! matched path, so the two must stay in sync — `router_routes_resolve_in_policy`
//! guards that. The swagger UI is merged outside the gate, like any other
//! static documentation.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::gate::auth_gate,
    models::{
        AuthResponse, CreateTemplateRequest, ListTemplatesResponse, LoginRequest, NameCount,
        ProfileResponse, RegisterRequest, Template, ToggleResponse, UpdateProfileRequest,
        UpdateTemplateRequest, Visibility,
    },
    state::AppState,
};

pub mod discovery;
pub mod health;
pub mod reactions;
pub mod templates;
pub mod users;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/v1/auth/register", post(users::register))
        .route("/v1/auth/login", post(users::login))
        .route("/v1/users/me", get(users::me).put(users::update_me))
        .route(
            "/v1/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/v1/templates/{template_id}",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route(
            "/v1/templates/{template_id}/like",
            post(reactions::toggle_like),
        )
        .route(
            "/v1/templates/{template_id}/favorite",
            post(reactions::toggle_favorite),
        )
        .route("/v1/categories", get(discovery::list_categories))
        .route("/v1/tags", get(discovery::list_tags))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::register,
        users::login,
        users::me,
        users::update_me,
        templates::list_templates,
        templates::create_template,
        templates::get_template,
        templates::update_template,
        templates::delete_template,
        reactions::toggle_like,
        reactions::toggle_favorite,
        discovery::list_categories,
        discovery::list_tags,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Template,
            Visibility,
            CreateTemplateRequest,
            UpdateTemplateRequest,
            ListTemplatesResponse,
            ToggleResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            ProfileResponse,
            UpdateProfileRequest,
            NameCount,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Templates", description = "Template management and listing"),
        (name = "Reactions", description = "Like/favorite toggles"),
        (name = "Users", description = "Registration, login, and profiles"),
        (name = "Discovery", description = "Category and tag aggregates"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::auth::AccessPolicy;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = AppState::for_tests();
        let app = router(state);
        let _ = app.into_make_service();
    }

    #[test]
    fn router_routes_resolve_in_policy() {
        // Every route wired above must resolve to a method name, otherwise
        // the gate fails it closed and the endpoint is unreachable.
        let policy = AccessPolicy::new();
        let routes = [
            ("POST", "/v1/auth/register"),
            ("POST", "/v1/auth/login"),
            ("GET", "/v1/users/me"),
            ("PUT", "/v1/users/me"),
            ("GET", "/v1/templates"),
            ("POST", "/v1/templates"),
            ("GET", "/v1/templates/{template_id}"),
            ("PUT", "/v1/templates/{template_id}"),
            ("DELETE", "/v1/templates/{template_id}"),
            ("POST", "/v1/templates/{template_id}/like"),
            ("POST", "/v1/templates/{template_id}/favorite"),
            ("GET", "/v1/categories"),
            ("GET", "/v1/tags"),
            ("GET", "/health"),
            ("GET", "/health/live"),
            ("GET", "/health/ready"),
        ];
        for (verb, path) in routes {
            assert!(
                policy.method_for(verb, path).is_some(),
                "{verb} {path} is missing from the policy route table"
            );
        }
    }

    #[tokio::test]
    async fn end_to_end_register_create_list() {
        let (state, _dir) = AppState::for_tests();
        let app = router(state);

        // Register (public method, no token).
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"id":"alice","email":"alice@example.com","password":"hunter2"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let auth: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let token = auth["token"].as_str().unwrap().to_string();

        // Create a template with the issued token.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/templates")
                    .header("content-type", "application/json")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::from(
                        r#"{"title":"First","visibility":"public","tags":["demo"]}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Anonymous listing sees it.
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/v1/templates")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let listing: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(listing["templates"][0]["title"], "First");
    }

    #[tokio::test]
    async fn anonymous_mutation_is_rejected_by_the_gate() {
        let (state, _dir) = AppState::for_tests();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/templates")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"x","visibility":"public"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
