// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Embedded Storage Module
//!
//! Persistence is a single redb database file (pure Rust, ACID). Each store
//! owns its table definitions; all stores share one [`redb::Database`]
//! handle so cross-table operations stay inside one transaction.
//!
//! ## Table Layout
//!
//! ```text
//! templates        id → serialized StoredTemplate
//! templates_by_age (inverted created_at | id) → id   # newest-first scans
//! likes            "template_id|user_id" → ()        # membership relation
//! favorites        "template_id|user_id" → ()        # membership relation
//! users            id → serialized StoredUser
//! user_emails      email → id
//! ```
//!
//! ## Transaction Model
//!
//! redb serializes write transactions, so every mutating operation — in
//! particular the reaction toggle with its counter recompute — runs under
//! database-level mutual exclusion. Read transactions see a consistent
//! snapshot. A write transaction dropped without commit (error path or a
//! cancelled request) rolls back; membership rows and denormalized counters
//! therefore change together or not at all.

pub mod templates;
pub mod users;

use std::path::Path;
use std::sync::Arc;

use redb::Database;

pub use templates::{
    ReactionKind, StoredTemplate, TemplateFilters, TemplateReader, TemplateStore,
};
pub use users::{StoredUser, UserStore};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Open (or create) the shared database file at the given path.
pub fn open_database(path: &Path) -> StoreResult<Arc<Database>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    Ok(Arc::new(Database::create(path)?))
}
