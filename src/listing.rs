// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Visibility-aware listing engine.
//!
//! Produces paged, principal-scoped template views over a [`TemplateReader`]
//! port. Three mutually exclusive modes, selected by principal presence and
//! the requested visibility filter:
//!
//! 1. **Anonymous** — only public rows, single cursor stream. Owner,
//!    category and tag filters still compose; none of them can reach
//!    private rows.
//! 2. **Authenticated + explicit visibility** — `public` is the anonymous
//!    view plus the caller's like/favorite flags; `private` is restricted
//!    to the caller's own rows. Asking for another principal's private rows
//!    yields an empty page, never an error: existence of private content
//!    must not leak through error responses.
//! 3. **Authenticated + no visibility (mixed view)** — two independently
//!    paginated streams (public + caller's private) in one response, each
//!    with its own cursor and exhaustion signal. Advancing one stream never
//!    disturbs the other. The request cursor is `"pub:priv"`; a bare
//!    integer is the legacy single-stream form and applies to both streams.
//!
//! `has more` is signaled by reading exactly `limit` rows — no extra
//! existence probe. On an exact boundary this produces one false-positive
//! next cursor whose follow-up page is empty; that trade is deliberate and
//! pinned down in the tests below.

use crate::auth::Principal;
use crate::cursor;
use crate::models::{ListTemplatesQuery, Template, Visibility};
use crate::storage::{ReactionKind, StoreResult, StoredTemplate, TemplateFilters, TemplateReader};

/// Page size used when the request leaves it unset or non-positive.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One paginated stream of templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Template>,
    /// Cursor resuming this stream, present when it may have more rows.
    pub next_page_token: Option<String>,
}

impl Page {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
        }
    }
}

/// A principal-scoped listing: the primary stream, plus the caller's
/// private stream in the mixed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub primary: Page,
    pub private: Option<Page>,
}

/// The listing engine. Stateless; all persistence goes through the reader.
pub struct VisibilityLister<'a, R: TemplateReader> {
    reader: &'a R,
}

impl<'a, R: TemplateReader> VisibilityLister<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// Produce the paged view for this query and principal.
    pub fn list(&self, query: &ListTemplatesQuery, principal: &Principal) -> StoreResult<Listing> {
        let limit = effective_limit(query.page_size);
        let base = TemplateFilters {
            visibility: None,
            owner_id: query.owner_id.clone(),
            category: query.category.clone(),
            tags: query.tag_set(),
        };

        match principal {
            Principal::Anonymous => {
                // Anonymous callers get public rows only, whatever
                // visibility the request asked for.
                let filters = TemplateFilters {
                    visibility: Some(Visibility::Public),
                    ..base
                };
                let offset = cursor::decode_single(&query.page_token);
                Ok(Listing {
                    primary: self.fetch_page(limit, offset, &filters, None)?,
                    private: None,
                })
            }
            Principal::User(user_id) => match query.visibility {
                Some(Visibility::Public) => {
                    let filters = TemplateFilters {
                        visibility: Some(Visibility::Public),
                        ..base
                    };
                    let offset = cursor::decode_single(&query.page_token);
                    Ok(Listing {
                        primary: self.fetch_page(limit, offset, &filters, Some(user_id))?,
                        private: None,
                    })
                }
                Some(Visibility::Private) => {
                    if let Some(owner_id) = &query.owner_id {
                        if owner_id != user_id {
                            // Someone else's private rows: empty, not an error.
                            return Ok(Listing {
                                primary: Page::empty(),
                                private: None,
                            });
                        }
                    }
                    let filters = TemplateFilters {
                        visibility: Some(Visibility::Private),
                        owner_id: Some(user_id.clone()),
                        ..base
                    };
                    let offset = cursor::decode_single(&query.page_token);
                    Ok(Listing {
                        primary: self.fetch_page(limit, offset, &filters, Some(user_id))?,
                        private: None,
                    })
                }
                None => self.list_mixed(limit, query, user_id, base),
            },
        }
    }

    /// Mixed view: public stream + caller's private stream, independently
    /// paginated.
    fn list_mixed(
        &self,
        limit: usize,
        query: &ListTemplatesQuery,
        user_id: &str,
        base: TemplateFilters,
    ) -> StoreResult<Listing> {
        let (public_offset, private_offset) = cursor::decode_dual(&query.page_token);

        let public_filters = TemplateFilters {
            visibility: Some(Visibility::Public),
            ..base.clone()
        };
        let primary = self.fetch_page(limit, public_offset, &public_filters, Some(user_id))?;

        // An owner filter naming someone other than the caller suppresses
        // the private stream: "mixed, owner=them" must not expose my rows
        // or probe theirs.
        let private = if base.owner_id.as_deref().is_none_or(|owner| owner == user_id) {
            let private_filters = TemplateFilters {
                visibility: Some(Visibility::Private),
                owner_id: Some(user_id.to_string()),
                ..base
            };
            self.fetch_page(limit, private_offset, &private_filters, Some(user_id))?
        } else {
            Page::empty()
        };

        Ok(Listing {
            primary,
            private: Some(private),
        })
    }

    /// Fetch one page and derive its continuation cursor.
    fn fetch_page(
        &self,
        limit: usize,
        offset: u64,
        filters: &TemplateFilters,
        viewer: Option<&str>,
    ) -> StoreResult<Page> {
        let rows = self.reader.list(limit, offset, filters)?;

        // Exactly `limit` rows back means the stream may continue; fewer
        // means exhausted. No extra probe is made.
        let has_more = rows.len() == limit;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(self.annotate(row, viewer)?);
        }

        Ok(Page {
            items,
            next_page_token: has_more.then(|| cursor::encode_single(offset + limit as u64)),
        })
    }

    /// Convert a stored row to its API view, resolving the caller's
    /// reaction flags.
    fn annotate(&self, row: StoredTemplate, viewer: Option<&str>) -> StoreResult<Template> {
        let (is_liked, is_favorited) = match viewer {
            Some(user_id) => (
                self.reader.is_member(ReactionKind::Like, user_id, &row.id)?,
                self.reader
                    .is_member(ReactionKind::Favorite, user_id, &row.id)?,
            ),
            None => (false, false),
        };
        Ok(to_api_template(row, is_liked, is_favorited))
    }
}

/// Clamp the requested page size to the default when unset or non-positive.
fn effective_limit(page_size: i32) -> usize {
    if page_size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size as usize
    }
}

/// Stored row → API view with per-caller reaction flags.
pub(crate) fn to_api_template(row: StoredTemplate, is_liked: bool, is_favorited: bool) -> Template {
    Template {
        id: row.id,
        owner_id: row.owner_id,
        title: row.title,
        description: row.description,
        visibility: row.visibility,
        category: row.category,
        tags: row.tags,
        like_count: row.like_count,
        favorite_count: row.favorite_count,
        is_liked,
        is_favorited,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
