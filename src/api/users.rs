// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User registration, login, and profile endpoints.
//!
//! Register and login are the two public mutation methods; both return a
//! signed bearer token. Login accepts either the email address or the user
//! id as the identifier and answers every failure with the same
//! "invalid credentials" message, so it cannot be used to probe which
//! accounts exist.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::{
    auth::{password, Ctx},
    error::ApiError,
    models::{
        AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UpdateProfileRequest,
    },
    state::AppState,
    storage::StoredUser,
};

/// Check a caller-chosen user id: non-empty, `[A-Za-z0-9_]+`.
fn valid_user_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    tag = "Users",
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid id, email, or password"),
        (status = 409, description = "Id or email already taken"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if request.id.is_empty() || request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::invalid_argument(
            "id, email, and password are required",
        ));
    }
    if !valid_user_id(&request.id) {
        return Err(ApiError::invalid_argument(
            "id must contain only alphanumeric characters and underscores",
        ));
    }
    if !request.email.contains('@') {
        return Err(ApiError::invalid_argument("email is not valid"));
    }

    let user = StoredUser {
        id: request.id,
        email: request.email,
        display_name: request.display_name,
        password_hash: password::hash_password(&request.password),
        created_at: Utc::now(),
    };
    state.users.create(&user)?;

    let token = state.tokens.issue(&user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user.id,
            token,
            display_name: user.display_name,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Login succeeded", body = AuthResponse),
        (status = 401, description = "Unknown identifier or wrong password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if request.identifier.is_empty() || request.password.is_empty() {
        return Err(ApiError::invalid_argument(
            "identifier and password are required",
        ));
    }

    // Email first, then id; the error stays constant either way.
    let user = match state.users.get_by_email(&request.identifier)? {
        Some(user) => Some(user),
        None => state.users.get(&request.identifier)?,
    };
    let Some(user) = user else {
        return Err(ApiError::unauthenticated("invalid credentials"));
    };

    if !password::verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthenticated("invalid credentials"));
    }

    let token = state.tokens.issue(&user.id)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        id: user.id,
        token,
        display_name: user.display_name,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile of the calling user", body = ProfileResponse),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = principal.require_user()?;
    let user = state
        .users
        .get(user_id)?
        .ok_or_else(|| ApiError::not_found("user"))?;

    Ok(Json(ProfileResponse {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
        created_at: user.created_at,
    }))
}

#[utoipa::path(
    put,
    path = "/v1/users/me",
    request_body = UpdateProfileRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = principal.require_user()?;
    let mut user = state
        .users
        .get(user_id)?
        .ok_or_else(|| ApiError::not_found("user"))?;

    if let Some(display_name) = request.display_name {
        if !display_name.is_empty() {
            user.display_name = display_name;
        }
    }
    if let Some(new_password) = request.password {
        if !new_password.trim().is_empty() {
            user.password_hash = password::hash_password(&new_password);
        }
    }

    state.users.update(&user)?;

    Ok(Json(ProfileResponse {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
        created_at: user.created_at,
    }))
}
