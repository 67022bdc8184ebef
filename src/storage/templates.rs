// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Template store: rows, recency index, and reaction membership relations.
//!
//! ## Ordering
//!
//! Listings are ordered by creation time descending. The `templates_by_age`
//! index keys are `inverted_created_at_be | id`, so a plain ascending scan
//! yields newest-first without sorting. The index is maintained in the same
//! write transaction as the row it points at; an index entry whose row is
//! gone is skipped by readers, never an error.
//!
//! ## Reaction toggles
//!
//! `toggle` flips one `(user, template)` membership and refreshes the
//! denormalized counter on the template row inside a single write
//! transaction. The counter is recomputed from the membership relation by a
//! prefix range scan rather than incremented: this costs one extra scan per
//! toggle but means the counter can never drift from the relation, even if
//! an earlier toggle aborted partway. Keep the recompute; do not replace it
//! with `count ± 1`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::{StoreError, StoreResult};
use crate::models::Visibility;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: template id → serialized StoredTemplate (JSON bytes).
const TEMPLATES: TableDefinition<&str, &[u8]> = TableDefinition::new("templates");

/// Recency index: `inverted_created_at_be | id` → template id.
const TEMPLATES_BY_AGE: TableDefinition<&[u8], &str> = TableDefinition::new("templates_by_age");

/// Like membership: `"template_id|user_id"` → ().
const LIKES: TableDefinition<&str, ()> = TableDefinition::new("likes");

/// Favorite membership: `"template_id|user_id"` → ().
const FAVORITES: TableDefinition<&str, ()> = TableDefinition::new("favorites");

// =============================================================================
// Stored Model
// =============================================================================

/// Template row as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredTemplate {
    /// Server-assigned identifier (UUID).
    pub id: String,
    /// Owner user id.
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Denormalized like count; maintained only by `toggle`.
    pub like_count: u64,
    /// Denormalized favorite count; maintained only by `toggle`.
    pub favorite_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which membership relation a toggle operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Favorite,
}

impl ReactionKind {
    fn table(self) -> TableDefinition<'static, &'static str, ()> {
        match self {
            ReactionKind::Like => LIKES,
            ReactionKind::Favorite => FAVORITES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Favorite => "favorite",
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Conjunctive listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFilters {
    pub visibility: Option<Visibility>,
    pub owner_id: Option<String>,
    pub category: Option<String>,
    /// A matching template must carry every tag in this set.
    pub tags: Vec<String>,
}

impl TemplateFilters {
    /// Check whether a template satisfies every filter.
    pub fn matches(&self, template: &StoredTemplate) -> bool {
        if let Some(visibility) = self.visibility {
            if template.visibility != visibility {
                return false;
            }
        }
        if let Some(ref owner_id) = self.owner_id {
            if &template.owner_id != owner_id {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if template.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        self.tags
            .iter()
            .all(|tag| template.tags.iter().any(|t| t == tag))
    }
}

// =============================================================================
// Read Port
// =============================================================================

/// Read port consumed by the listing engine.
///
/// The engine depends on this trait rather than on [`TemplateStore`] so its
/// pagination behavior can be exercised against an in-memory reader.
pub trait TemplateReader {
    /// Fetch up to `limit` templates at `offset` within the filtered,
    /// newest-first sequence.
    fn list(
        &self,
        limit: usize,
        offset: u64,
        filters: &TemplateFilters,
    ) -> StoreResult<Vec<StoredTemplate>>;

    /// Whether `(user, template)` is in the given membership relation.
    fn is_member(
        &self,
        kind: ReactionKind,
        user_id: &str,
        template_id: &str,
    ) -> StoreResult<bool>;
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a recency index key: 8 bytes of inverted creation time
/// (microseconds, big-endian) followed by the id bytes.
///
/// Inverting the timestamp makes an ascending scan yield newest-first; the
/// id suffix keeps keys unique for equal timestamps.
fn make_age_key(created_at: &DateTime<Utc>, id: &str) -> Vec<u8> {
    let micros = created_at.timestamp_micros() as u64;
    let mut key = Vec::with_capacity(8 + id.len());
    key.extend_from_slice(&(!micros).to_be_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}

/// Membership key for one `(template, user)` pair.
///
/// Template ids are UUIDs and user ids are `[A-Za-z0-9_]+`, so `|` cannot
/// occur in either side.
fn membership_key(template_id: &str, user_id: &str) -> String {
    format!("{template_id}|{user_id}")
}

/// Half-open key range covering every membership of one template.
/// `}` is the byte after `|`, so the range is exactly the `"id|"` prefix.
fn membership_bounds(template_id: &str) -> (String, String) {
    (format!("{template_id}|"), format!("{template_id}}}"))
}

// =============================================================================
// TemplateStore
// =============================================================================

/// Template repository over the shared embedded database.
pub struct TemplateStore {
    db: Arc<Database>,
}

impl TemplateStore {
    /// Create the store, pre-creating its tables so read transactions never
    /// observe a missing table.
    pub fn new(db: Arc<Database>) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TEMPLATES)?;
            let _ = write_txn.open_table(TEMPLATES_BY_AGE)?;
            let _ = write_txn.open_table(LIKES)?;
            let _ = write_txn.open_table(FAVORITES)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Insert a new template row and its index entry.
    pub fn create(&self, template: &StoredTemplate) -> StoreResult<()> {
        let json = serde_json::to_vec(template)?;
        let age_key = make_age_key(&template.created_at, &template.id);

        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(TEMPLATES)?;
            if rows.get(template.id.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(format!(
                    "template {}",
                    template.id
                )));
            }
            rows.insert(template.id.as_str(), json.as_slice())?;

            let mut index = write_txn.open_table(TEMPLATES_BY_AGE)?;
            index.insert(age_key.as_slice(), template.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> StoreResult<Option<StoredTemplate>> {
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(TEMPLATES)?;
        match rows.get(id)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    /// Rewrite an existing template row.
    ///
    /// `created_at` never changes after creation, so the recency index entry
    /// stays valid.
    pub fn update(&self, template: &StoredTemplate) -> StoreResult<()> {
        let json = serde_json::to_vec(template)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(TEMPLATES)?;
            if rows.get(template.id.as_str())?.is_none() {
                return Err(StoreError::NotFound(format!("template {}", template.id)));
            }
            rows.insert(template.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Hard-delete a template: row, index entry, and both membership
    /// relations go in one transaction.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(TEMPLATES)?;
            let template: StoredTemplate = match rows.remove(id)? {
                Some(raw) => serde_json::from_slice(raw.value())?,
                None => return Err(StoreError::NotFound(format!("template {id}"))),
            };

            let mut index = write_txn.open_table(TEMPLATES_BY_AGE)?;
            let age_key = make_age_key(&template.created_at, id);
            index.remove(age_key.as_slice())?;

            for kind in [ReactionKind::Like, ReactionKind::Favorite] {
                let mut members = write_txn.open_table(kind.table())?;
                let (start, end) = membership_bounds(id);
                let keys: Vec<String> = {
                    let mut keys = Vec::new();
                    for entry in members.range(start.as_str()..end.as_str())? {
                        keys.push(entry?.0.value().to_string());
                    }
                    keys
                };
                for key in keys {
                    members.remove(key.as_str())?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Flip one membership and refresh the denormalized counter.
    ///
    /// Runs as a single write transaction (redb serializes writers, so
    /// concurrent toggles on the same template cannot lose counter updates).
    /// Returns `(now_active, new_count)`.
    pub fn toggle(
        &self,
        kind: ReactionKind,
        user_id: &str,
        template_id: &str,
    ) -> StoreResult<(bool, u64)> {
        let write_txn = self.db.begin_write()?;
        let (active, count) = {
            let mut rows = write_txn.open_table(TEMPLATES)?;
            let raw = rows
                .get(template_id)?
                .map(|g| g.value().to_vec())
                .ok_or_else(|| StoreError::NotFound(format!("template {template_id}")))?;
            let mut template: StoredTemplate = serde_json::from_slice(&raw)?;

            let mut members = write_txn.open_table(kind.table())?;
            let key = membership_key(template_id, user_id);
            let active = if members.remove(key.as_str())?.is_some() {
                false
            } else {
                members.insert(key.as_str(), ())?;
                true
            };

            // Recompute from the relation instead of incrementing; see the
            // module docs for why this must stay a recompute.
            let (start, end) = membership_bounds(template_id);
            let mut count = 0u64;
            for entry in members.range(start.as_str()..end.as_str())? {
                entry?;
                count += 1;
            }

            match kind {
                ReactionKind::Like => template.like_count = count,
                ReactionKind::Favorite => template.favorite_count = count,
            }

            let json = serde_json::to_vec(&template)?;
            rows.insert(template_id, json.as_slice())?;
            (active, count)
        };
        write_txn.commit()?;

        tracing::debug!(
            kind = kind.as_str(),
            user_id,
            template_id,
            active,
            count,
            "reaction toggled"
        );
        Ok((active, count))
    }

    /// Count one template's memberships in a relation (read-only).
    pub fn member_count(&self, kind: ReactionKind, template_id: &str) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let members = read_txn.open_table(kind.table())?;
        let (start, end) = membership_bounds(template_id);
        let mut count = 0u64;
        for entry in members.range(start.as_str()..end.as_str())? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Aggregate visible categories with their template counts, descending.
    pub fn list_categories(&self, filters: &TemplateFilters) -> StoreResult<Vec<(String, u64)>> {
        self.aggregate(filters, |template, counts| {
            if let Some(category) = template
                .category
                .as_deref()
                .filter(|c| !c.is_empty())
            {
                *counts.entry(category.to_string()).or_default() += 1;
            }
        })
    }

    /// Aggregate visible tags with their template counts, descending.
    pub fn list_tags(&self, filters: &TemplateFilters) -> StoreResult<Vec<(String, u64)>> {
        self.aggregate(filters, |template, counts| {
            for tag in &template.tags {
                *counts.entry(tag.clone()).or_default() += 1;
            }
        })
    }

    fn aggregate(
        &self,
        filters: &TemplateFilters,
        mut accumulate: impl FnMut(&StoredTemplate, &mut HashMap<String, u64>),
    ) -> StoreResult<Vec<(String, u64)>> {
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(TEMPLATES)?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for entry in rows.iter()? {
            let entry = entry?;
            let template: StoredTemplate = serde_json::from_slice(entry.1.value())?;
            if filters.matches(&template) {
                accumulate(&template, &mut counts);
            }
        }

        let mut stats: Vec<(String, u64)> = counts.into_iter().collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(stats)
    }
}

impl TemplateReader for TemplateStore {
    fn list(
        &self,
        limit: usize,
        offset: u64,
        filters: &TemplateFilters,
    ) -> StoreResult<Vec<StoredTemplate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TEMPLATES_BY_AGE)?;
        let rows = read_txn.open_table(TEMPLATES)?;

        let mut skipped = 0u64;
        let mut results = Vec::with_capacity(limit);
        for entry in index.iter()? {
            let entry = entry?;
            let id = entry.1.value();

            // A row can be gone while its index entry lingers in an older
            // snapshot; skip, never backfill.
            let template: StoredTemplate = match rows.get(id)? {
                Some(raw) => serde_json::from_slice(raw.value())?,
                None => continue,
            };

            if !filters.matches(&template) {
                continue;
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }

            results.push(template);
            if results.len() == limit {
                break;
            }
        }

        Ok(results)
    }

    fn is_member(
        &self,
        kind: ReactionKind,
        user_id: &str,
        template_id: &str,
    ) -> StoreResult<bool> {
        let read_txn = self.db.begin_read()?;
        let members = read_txn.open_table(kind.table())?;
        let key = membership_key(template_id, user_id);
        Ok(members.get(key.as_str())?.is_some())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_store() -> (TemplateStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = super::super::open_database(&dir.path().join("test.redb")).unwrap();
        (TemplateStore::new(db).unwrap(), dir)
    }

    fn sample(id: &str, owner: &str, visibility: Visibility, age_secs: i64) -> StoredTemplate {
        let created = Utc::now() - Duration::seconds(age_secs);
        StoredTemplate {
            id: id.to_string(),
            owner_id: owner.to_string(),
            title: format!("template {id}"),
            description: None,
            visibility,
            category: None,
            tags: Vec::new(),
            like_count: 0,
            favorite_count: 0,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn create_and_get() {
        let (store, _dir) = temp_store();
        let template = sample("t-1", "alice", Visibility::Public, 0);
        store.create(&template).unwrap();

        let loaded = store.get("t-1").unwrap().unwrap();
        assert_eq!(loaded, template);
    }

    #[test]
    fn create_duplicate_id_fails() {
        let (store, _dir) = temp_store();
        let template = sample("t-1", "alice", Visibility::Public, 0);
        store.create(&template).unwrap();

        let err = store.create(&template).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn update_missing_fails() {
        let (store, _dir) = temp_store();
        let template = sample("ghost", "alice", Visibility::Public, 0);
        let err = store.update(&template).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn list_is_newest_first() {
        let (store, _dir) = temp_store();
        store
            .create(&sample("old", "alice", Visibility::Public, 30))
            .unwrap();
        store
            .create(&sample("new", "alice", Visibility::Public, 10))
            .unwrap();
        store
            .create(&sample("newest", "alice", Visibility::Public, 0))
            .unwrap();

        let listed = store.list(10, 0, &TemplateFilters::default()).unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "new", "old"]);
    }

    #[test]
    fn list_applies_offset_after_filters() {
        let (store, _dir) = temp_store();
        store
            .create(&sample("pub-1", "alice", Visibility::Public, 3))
            .unwrap();
        store
            .create(&sample("priv", "alice", Visibility::Private, 2))
            .unwrap();
        store
            .create(&sample("pub-2", "alice", Visibility::Public, 1))
            .unwrap();

        let filters = TemplateFilters {
            visibility: Some(Visibility::Public),
            ..Default::default()
        };
        // Offset 1 within the *public* sequence skips pub-2 only.
        let listed = store.list(10, 1, &filters).unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["pub-1"]);
    }

    #[test]
    fn filters_compose_conjunctively() {
        let filters = TemplateFilters {
            visibility: Some(Visibility::Public),
            owner_id: Some("alice".to_string()),
            category: Some("writing".to_string()),
            tags: vec!["rust".to_string(), "api".to_string()],
        };

        let mut template = sample("t", "alice", Visibility::Public, 0);
        template.category = Some("writing".to_string());
        template.tags = vec!["rust".to_string(), "api".to_string(), "extra".to_string()];
        assert!(filters.matches(&template));

        template.tags = vec!["rust".to_string()];
        assert!(!filters.matches(&template), "missing tag must fail the subset filter");

        template.tags = vec!["rust".to_string(), "api".to_string()];
        template.owner_id = "bob".to_string();
        assert!(!filters.matches(&template));
    }

    #[test]
    fn delete_removes_row_and_memberships() {
        let (store, _dir) = temp_store();
        store
            .create(&sample("t-1", "alice", Visibility::Public, 0))
            .unwrap();
        store.toggle(ReactionKind::Like, "bob", "t-1").unwrap();
        store.toggle(ReactionKind::Favorite, "bob", "t-1").unwrap();

        store.delete("t-1").unwrap();

        assert!(store.get("t-1").unwrap().is_none());
        assert!(store.list(10, 0, &TemplateFilters::default()).unwrap().is_empty());
        assert_eq!(store.member_count(ReactionKind::Like, "t-1").unwrap(), 0);
        assert_eq!(store.member_count(ReactionKind::Favorite, "t-1").unwrap(), 0);

        let err = store.delete("t-1").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn toggle_twice_is_identity() {
        let (store, _dir) = temp_store();
        store
            .create(&sample("t-1", "alice", Visibility::Public, 0))
            .unwrap();

        let (active, count) = store.toggle(ReactionKind::Like, "bob", "t-1").unwrap();
        assert!(active);
        assert_eq!(count, 1);

        let (active, count) = store.toggle(ReactionKind::Like, "bob", "t-1").unwrap();
        assert!(!active);
        assert_eq!(count, 0);

        let reloaded = store.get("t-1").unwrap().unwrap();
        assert_eq!(reloaded.like_count, 0);
        assert!(!store.is_member(ReactionKind::Like, "bob", "t-1").unwrap());
    }

    #[test]
    fn toggle_counter_tracks_membership_cardinality() {
        let (store, _dir) = temp_store();
        store
            .create(&sample("t-1", "alice", Visibility::Public, 0))
            .unwrap();

        for user in ["bob", "carol", "dave"] {
            store.toggle(ReactionKind::Like, user, "t-1").unwrap();
        }
        let (_, count) = store.toggle(ReactionKind::Like, "carol", "t-1").unwrap();
        assert_eq!(count, 2);

        let reloaded = store.get("t-1").unwrap().unwrap();
        assert_eq!(reloaded.like_count, 2);
        assert_eq!(
            store.member_count(ReactionKind::Like, "t-1").unwrap(),
            reloaded.like_count
        );
    }

    #[test]
    fn toggle_relations_are_independent() {
        let (store, _dir) = temp_store();
        store
            .create(&sample("t-1", "alice", Visibility::Public, 0))
            .unwrap();

        store.toggle(ReactionKind::Like, "bob", "t-1").unwrap();
        let (active, count) = store.toggle(ReactionKind::Favorite, "bob", "t-1").unwrap();
        assert!(active);
        assert_eq!(count, 1);

        let reloaded = store.get("t-1").unwrap().unwrap();
        assert_eq!(reloaded.like_count, 1);
        assert_eq!(reloaded.favorite_count, 1);
    }

    #[test]
    fn toggle_missing_template_fails() {
        let (store, _dir) = temp_store();
        let err = store.toggle(ReactionKind::Like, "bob", "ghost").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn category_and_tag_aggregates() {
        let (store, _dir) = temp_store();

        let mut a = sample("a", "alice", Visibility::Public, 2);
        a.category = Some("writing".to_string());
        a.tags = vec!["rust".to_string(), "api".to_string()];
        store.create(&a).unwrap();

        let mut b = sample("b", "bob", Visibility::Public, 1);
        b.category = Some("writing".to_string());
        b.tags = vec!["rust".to_string()];
        store.create(&b).unwrap();

        let mut c = sample("c", "bob", Visibility::Private, 0);
        c.category = Some("hidden".to_string());
        c.tags = vec!["secret".to_string()];
        store.create(&c).unwrap();

        let public = TemplateFilters {
            visibility: Some(Visibility::Public),
            ..Default::default()
        };

        let categories = store.list_categories(&public).unwrap();
        assert_eq!(categories, vec![("writing".to_string(), 2)]);

        let tags = store.list_tags(&public).unwrap();
        assert_eq!(
            tags,
            vec![("rust".to_string(), 2), ("api".to_string(), 1)]
        );
    }

    #[test]
    fn age_key_orders_newest_first() {
        let now = Utc::now();
        let older = make_age_key(&(now - Duration::seconds(10)), "a");
        let newer = make_age_key(&now, "b");
        assert!(newer < older, "newer rows must sort first");
    }
}
