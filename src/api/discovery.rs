// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only discovery endpoints: category and tag aggregates.
//!
//! Both are public methods. Category counts default to the public corpus;
//! naming an owner switches to that owner's private categories, which is
//! only honored for the caller themselves — anyone else gets an empty list,
//! the same no-leak posture as the listing engine.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    auth::Ctx,
    error::ApiError,
    models::{ListCategoriesQuery, NameCount, Visibility},
    state::AppState,
    storage::TemplateFilters,
};

#[utoipa::path(
    get,
    path = "/v1/categories",
    params(ListCategoriesQuery),
    tag = "Discovery",
    responses(
        (status = 200, description = "Categories with template counts", body = [NameCount]),
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Ctx(principal): Ctx,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<Vec<NameCount>>, ApiError> {
    let filters = match query.owner_id {
        Some(owner_id) => {
            if principal.user_id() != Some(owner_id.as_str()) {
                return Ok(Json(Vec::new()));
            }
            TemplateFilters {
                visibility: Some(Visibility::Private),
                owner_id: Some(owner_id),
                ..Default::default()
            }
        }
        None => TemplateFilters {
            visibility: Some(Visibility::Public),
            ..Default::default()
        },
    };

    let stats = state.templates.list_categories(&filters)?;
    Ok(Json(into_name_counts(stats)))
}

#[utoipa::path(
    get,
    path = "/v1/tags",
    tag = "Discovery",
    responses(
        (status = 200, description = "Public tags with template counts", body = [NameCount]),
    )
)]
pub async fn list_tags(
    State(state): State<AppState>,
    Ctx(_principal): Ctx,
) -> Result<Json<Vec<NameCount>>, ApiError> {
    let filters = TemplateFilters {
        visibility: Some(Visibility::Public),
        ..Default::default()
    };
    let stats = state.templates.list_tags(&filters)?;
    Ok(Json(into_name_counts(stats)))
}

fn into_name_counts(stats: Vec<(String, u64)>) -> Vec<NameCount> {
    stats
        .into_iter()
        .map(|(name, count)| NameCount { name, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::storage::StoredTemplate;
    use chrono::Utc;

    fn seed(state: &AppState, id: &str, owner: &str, visibility: Visibility, category: &str) {
        let now = Utc::now();
        state
            .templates
            .create(&StoredTemplate {
                id: id.to_string(),
                owner_id: owner.to_string(),
                title: id.to_string(),
                description: None,
                visibility,
                category: Some(category.to_string()),
                tags: vec![format!("{category}-tag")],
                like_count: 0,
                favorite_count: 0,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    #[tokio::test]
    async fn categories_default_to_public_corpus() {
        let (state, _dir) = AppState::for_tests();
        seed(&state, "a", "alice", Visibility::Public, "writing");
        seed(&state, "b", "bob", Visibility::Public, "writing");
        seed(&state, "c", "bob", Visibility::Private, "hidden");

        let Json(stats) = list_categories(
            State(state),
            Ctx(Principal::Anonymous),
            Query(ListCategoriesQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(
            stats,
            vec![NameCount {
                name: "writing".to_string(),
                count: 2
            }]
        );
    }

    #[tokio::test]
    async fn owner_categories_require_matching_principal() {
        let (state, _dir) = AppState::for_tests();
        seed(&state, "c", "bob", Visibility::Private, "hidden");

        let owner_query = || ListCategoriesQuery {
            owner_id: Some("bob".to_string()),
        };

        let Json(own) = list_categories(
            State(state.clone()),
            Ctx(Principal::User("bob".to_string())),
            Query(owner_query()),
        )
        .await
        .unwrap();
        assert_eq!(own[0].name, "hidden");

        // Anyone else asking for bob's private categories sees nothing.
        let Json(other) = list_categories(
            State(state.clone()),
            Ctx(Principal::User("alice".to_string())),
            Query(owner_query()),
        )
        .await
        .unwrap();
        assert!(other.is_empty());

        let Json(anon) = list_categories(
            State(state),
            Ctx(Principal::Anonymous),
            Query(owner_query()),
        )
        .await
        .unwrap();
        assert!(anon.is_empty());
    }

    #[tokio::test]
    async fn tags_are_public_only() {
        let (state, _dir) = AppState::for_tests();
        seed(&state, "a", "alice", Visibility::Public, "writing");
        seed(&state, "c", "bob", Visibility::Private, "hidden");

        let Json(stats) = list_tags(State(state), Ctx(Principal::Anonymous))
            .await
            .unwrap();

        assert_eq!(
            stats,
            vec![NameCount {
                name: "writing-tag".to_string(),
                count: 1
            }]
        );
    }
}
