// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Like/favorite toggle endpoints.
//!
//! Each call flips one membership and returns the refreshed counter. The
//! flip and the counter write happen in one storage transaction; a failure
//! surfaces as `internal` and is never retried here — the caller may safely
//! retry the whole call, since a second toggle of the same state is just
//! the inverse flip.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::Ctx, error::ApiError, models::ToggleResponse, state::AppState, storage::ReactionKind,
};

#[utoipa::path(
    post,
    path = "/v1/templates/{template_id}/like",
    params(("template_id" = String, Path, description = "Template identifier")),
    tag = "Reactions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New like state and count", body = ToggleResponse),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "No such template"),
    )
)]
pub async fn toggle_like(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Path(template_id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    toggle(state, principal, template_id, ReactionKind::Like).await
}

#[utoipa::path(
    post,
    path = "/v1/templates/{template_id}/favorite",
    params(("template_id" = String, Path, description = "Template identifier")),
    tag = "Reactions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New favorite state and count", body = ToggleResponse),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "No such template"),
    )
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Path(template_id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    toggle(state, principal, template_id, ReactionKind::Favorite).await
}

async fn toggle(
    state: AppState,
    principal: crate::auth::Principal,
    template_id: String,
    kind: ReactionKind,
) -> Result<Json<ToggleResponse>, ApiError> {
    let user_id = principal.require_user()?;
    let (active, count) = state.templates.toggle(kind, user_id, &template_id)?;
    Ok(Json(ToggleResponse { active, count }))
}
