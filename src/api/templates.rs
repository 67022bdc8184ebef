// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Template CRUD and listing endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::Ctx,
    error::ApiError,
    listing::{to_api_template, VisibilityLister},
    models::{
        CreateTemplateRequest, ListTemplatesQuery, ListTemplatesResponse, Template,
        UpdateTemplateRequest,
    },
    state::AppState,
    storage::{ReactionKind, StoredTemplate, TemplateReader},
};

#[utoipa::path(
    get,
    path = "/v1/templates",
    params(ListTemplatesQuery),
    tag = "Templates",
    responses(
        (status = 200, description = "Paged template listing", body = ListTemplatesResponse),
        (status = 401, description = "Invalid credential presented"),
    )
)]
pub async fn list_templates(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<ListTemplatesResponse>, ApiError> {
    let lister = VisibilityLister::new(state.templates.as_ref());
    let listing = lister.list(&query, &principal)?;

    let (private_templates, private_next_page_token) = match listing.private {
        Some(page) => (Some(page.items), page.next_page_token),
        None => (None, None),
    };

    Ok(Json(ListTemplatesResponse {
        templates: listing.primary.items,
        next_page_token: listing.primary.next_page_token,
        private_templates,
        private_next_page_token,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/templates",
    request_body = CreateTemplateRequest,
    tag = "Templates",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Template created", body = Template),
        (status = 400, description = "Invalid fields"),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn create_template(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    let user_id = principal.require_user()?;

    if request.title.trim().is_empty() {
        return Err(ApiError::invalid_argument("title is required"));
    }

    let now = Utc::now();
    let template = StoredTemplate {
        id: Uuid::new_v4().to_string(),
        owner_id: user_id.to_string(),
        title: request.title,
        description: request.description.filter(|d| !d.is_empty()),
        visibility: request.visibility,
        category: request.category.filter(|c| !c.is_empty()),
        tags: request.tags,
        like_count: 0,
        favorite_count: 0,
        created_at: now,
        updated_at: now,
    };

    state.templates.create(&template)?;
    tracing::info!(template_id = %template.id, owner_id = user_id, "template created");

    Ok((
        StatusCode::CREATED,
        Json(to_api_template(template, false, false)),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/templates/{template_id}",
    params(("template_id" = String, Path, description = "Template identifier")),
    tag = "Templates",
    responses(
        (status = 200, description = "The template", body = Template),
        (status = 403, description = "Private template of another principal"),
        (status = 404, description = "No such template"),
    )
)]
pub async fn get_template(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Path(template_id): Path<String>,
) -> Result<Json<Template>, ApiError> {
    let template = state
        .templates
        .get(&template_id)?
        .ok_or_else(|| ApiError::not_found("template"))?;

    if template.visibility == crate::models::Visibility::Private
        && principal.user_id() != Some(template.owner_id.as_str())
    {
        return Err(ApiError::permission_denied("not authorized"));
    }

    let (is_liked, is_favorited) = reaction_flags(&state, &principal, &template.id)?;
    Ok(Json(to_api_template(template, is_liked, is_favorited)))
}

#[utoipa::path(
    put,
    path = "/v1/templates/{template_id}",
    params(("template_id" = String, Path, description = "Template identifier")),
    request_body = UpdateTemplateRequest,
    tag = "Templates",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated template", body = Template),
        (status = 403, description = "Caller does not own the template"),
        (status = 404, description = "No such template"),
    )
)]
pub async fn update_template(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Path(template_id): Path<String>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<Template>, ApiError> {
    let user_id = principal.require_user()?;

    let mut template = state
        .templates
        .get(&template_id)?
        .ok_or_else(|| ApiError::not_found("template"))?;

    if template.owner_id != user_id {
        return Err(ApiError::permission_denied("not authorized"));
    }

    if let Some(title) = request.title {
        if title.trim().is_empty() {
            return Err(ApiError::invalid_argument("title cannot be empty"));
        }
        template.title = title;
    }
    if let Some(description) = request.description {
        template.description = Some(description).filter(|d| !d.is_empty());
    }
    if let Some(visibility) = request.visibility {
        template.visibility = visibility;
    }
    if let Some(category) = request.category {
        template.category = Some(category).filter(|c| !c.is_empty());
    }
    if let Some(tags) = request.tags {
        template.tags = tags;
    }
    template.updated_at = Utc::now();

    state.templates.update(&template)?;

    let (is_liked, is_favorited) = reaction_flags(&state, &principal, &template.id)?;
    Ok(Json(to_api_template(template, is_liked, is_favorited)))
}

#[utoipa::path(
    delete,
    path = "/v1/templates/{template_id}",
    params(("template_id" = String, Path, description = "Template identifier")),
    tag = "Templates",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 403, description = "Caller does not own the template"),
        (status = 404, description = "No such template"),
    )
)]
pub async fn delete_template(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Path(template_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = principal.require_user()?;

    let template = state
        .templates
        .get(&template_id)?
        .ok_or_else(|| ApiError::not_found("template"))?;

    if template.owner_id != user_id {
        return Err(ApiError::permission_denied("not authorized"));
    }

    state.templates.delete(&template_id)?;
    tracing::info!(template_id, owner_id = user_id, "template deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve the caller's reaction flags for one template.
fn reaction_flags(
    state: &AppState,
    principal: &crate::auth::Principal,
    template_id: &str,
) -> Result<(bool, bool), ApiError> {
    match principal.user_id() {
        Some(user_id) => Ok((
            state
                .templates
                .is_member(ReactionKind::Like, user_id, template_id)?,
            state
                .templates
                .is_member(ReactionKind::Favorite, user_id, template_id)?,
        )),
        None => Ok((false, false)),
    }
}
