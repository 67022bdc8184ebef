// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! ## Model Categories
//!
//! - **Templates**: prompt templates with ownership, visibility and reaction
//!   counters
//! - **Listing**: paged template views, including the dual-stream mixed view
//! - **Reactions**: like/favorite toggle results
//! - **Users**: registration, login and profile models
//! - **Discovery**: category/tag aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// =============================================================================
// Visibility
// =============================================================================

/// Who can see a template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone, including anonymous callers.
    Public,
    /// Visible only to the owner.
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

// =============================================================================
// Template Models
// =============================================================================

/// A prompt template as returned by the API.
///
/// `is_liked`/`is_favorited` are transient per-caller flags, resolved against
/// the requesting principal; they are never stored on the template row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Template {
    /// Server-assigned identifier.
    pub id: String,
    /// Identifier of the owning user.
    pub owner_id: String,
    /// Short human-readable title.
    pub title: String,
    /// Longer free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Public or private.
    pub visibility: Visibility,
    /// Optional category name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Unordered tag set.
    pub tags: Vec<String>,
    /// Denormalized like count; equals the like-membership cardinality.
    pub like_count: u64,
    /// Denormalized favorite count; equals the favorite-membership cardinality.
    pub favorite_count: u64,
    /// Whether the calling principal has liked this template.
    pub is_liked: bool,
    /// Whether the calling principal has favorited this template.
    pub is_favorited: bool,
    /// Creation time; sole sort key for listings (descending).
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new template.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request to update an existing template. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

// =============================================================================
// Listing Models
// =============================================================================

/// Query parameters for template listing.
///
/// `tags` is a comma-separated list; a matching template must carry every
/// requested tag. `page_token` is an opaque cursor — a decimal offset for
/// single-stream views, or `"<public>:<private>"` for the mixed view (a bare
/// decimal is also accepted there and applied to both streams).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListTemplatesQuery {
    /// Page size; `<= 0` or unset selects the server default.
    #[serde(default)]
    pub page_size: i32,
    /// Opaque resume cursor; empty means start.
    #[serde(default)]
    pub page_token: String,
    /// Restrict to templates owned by this user.
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Restrict to templates in this category.
    #[serde(default)]
    pub category: Option<String>,
    /// Comma-separated tag set; all must be present.
    #[serde(default)]
    pub tags: Option<String>,
    /// Explicit visibility filter; unset means "mixed" when authenticated.
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl ListTemplatesQuery {
    /// Split the comma-separated tag filter into a clean set.
    pub fn tag_set(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Paged template listing response.
///
/// For the mixed view the private stream rides alongside the public one,
/// each with its own cursor; for single-stream views the private fields are
/// absent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListTemplatesResponse {
    /// Primary (public or explicitly-filtered) stream.
    pub templates: Vec<Template>,
    /// Cursor resuming the primary stream, if it may have more rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// Caller's private stream (mixed view only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_templates: Option<Vec<Template>>,
    /// Cursor resuming the private stream, if it may have more rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_next_page_token: Option<String>,
}

// =============================================================================
// Reaction Models
// =============================================================================

/// Result of a like/favorite toggle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToggleResponse {
    /// Whether the membership now exists for the caller.
    pub active: bool,
    /// Refreshed denormalized counter.
    pub count: u64,
}

// =============================================================================
// User Models
// =============================================================================

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Caller-chosen identifier (`[A-Za-z0-9_]+`).
    pub id: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

/// Request to log in with email or id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address or user id.
    pub identifier: String,
    pub password: String,
}

/// Token-bearing response for register/login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub id: String,
    /// Signed bearer token for subsequent requests.
    pub token: String,
    pub display_name: String,
}

/// Profile view of the calling user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Request to update the calling user's profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// =============================================================================
// Discovery Models
// =============================================================================

/// A category (or tag) name with the number of visible templates carrying it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NameCount {
    pub name: String,
    pub count: u64,
}

/// Query parameters for category listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListCategoriesQuery {
    /// When set, list the private categories of this owner (must be the
    /// caller); otherwise public categories.
    #[serde(default)]
    pub owner_id: Option<String>,
}
