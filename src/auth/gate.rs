// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth gate middleware and the `Ctx` principal extractor.
//!
//! The gate runs once per inbound call and ends in one of two terminal
//! states: the handler is invoked with a resolved [`Principal`] in request
//! extensions, or the call is rejected with `unauthenticated`.
//!
//! The flow:
//!
//! 1. A bearer token, if present, is **always** verified — even when the
//!    target method is public. Presenting a bad credential is a hard
//!    failure, never silently downgraded to anonymous access.
//! 2. With no token, the call proceeds only if the access policy lists the
//!    matched method as public.

use axum::{
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, Principal};
use crate::error::ApiError;
use crate::state::AppState;

/// Auth gate middleware. Apply to every API route.
pub async fn auth_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_principal(&state, &request) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(error) => {
            tracing::debug!(error = %error, path = %request.uri().path(), "request rejected");
            error.into_response()
        }
    }
}

/// Run the authentication state machine for one request.
fn resolve_principal(state: &AppState, request: &Request) -> Result<Principal, AuthError> {
    if let Some(token) = bearer_token(request.headers())? {
        // Token present: verified unconditionally, public method or not.
        let user_id = state.tokens.verify(token)?;
        return Ok(Principal::User(user_id));
    }

    // No token: only public methods may proceed. An unmatched route has no
    // method name and falls through to rejection.
    let method = request
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| state.policy.method_for(request.method().as_str(), path.as_str()));

    match method {
        Some(method) if state.policy.is_public(method) => Ok(Principal::Anonymous),
        _ => Err(AuthError::MissingToken),
    }
}

/// Extract the bearer token, if any. A present-but-malformed header is an
/// error, not an absent token.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(Some(token))
}

/// Extractor handing the resolved principal to handlers.
///
/// ```rust,ignore
/// async fn my_handler(Ctx(principal): Ctx) -> impl IntoResponse {
///     // principal is Principal::User(..) or Principal::Anonymous
/// }
/// ```
pub struct Ctx(pub Principal);

impl FromRequestParts<AppState> for Ctx {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Ctx)
            .ok_or_else(|| ApiError::unauthenticated("request bypassed principal resolution"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::{get, post},
        Json, Router,
    };
    use tower::ServiceExt;

    use crate::state::AppState;

    async fn whoami(Ctx(principal): Ctx) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "user": principal.user_id(),
            "anonymous": principal.is_anonymous(),
        }))
    }

    /// Router mirroring the shape of the real one: a public listing route
    /// and a principal-required create route behind the gate.
    fn test_app() -> (Router, AppState, tempfile::TempDir) {
        let (state, dir) = AppState::for_tests();
        let app = Router::new()
            .route("/v1/templates", get(whoami).post(whoami))
            .route("/v1/auth/register", post(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
            .with_state(state.clone());
        (app, state, dir)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn no_token_on_public_method_is_anonymous() {
        let (app, _state, _dir) = test_app();
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("GET")
                    .uri("/v1/templates")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["anonymous"], true);
    }

    #[tokio::test]
    async fn no_token_on_private_method_is_rejected() {
        let (app, _state, _dir) = test_app();
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/v1/templates")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "unauthenticated");
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let (app, state, _dir) = test_app();
        let token = state.tokens.issue("alice").unwrap();

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("GET")
                    .uri("/v1/templates")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"], "alice");
    }

    #[tokio::test]
    async fn bad_token_is_rejected_even_on_public_method() {
        let (app, _state, _dir) = test_app();
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("GET")
                    .uri("/v1/templates")
                    .header("Authorization", "Bearer garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_header_is_rejected() {
        let (app, _state, _dir) = test_app();
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("GET")
                    .uri("/v1/templates")
                    .header("Authorization", "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unrouted_paths_fail_closed() {
        let (state, _dir) = AppState::for_tests();
        // A catch-all route that the policy table does not know about.
        let app = Router::new()
            .route("/v1/unlisted", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
            .with_state(state);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("GET")
                    .uri("/v1/unlisted")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
