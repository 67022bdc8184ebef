// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User account store.
//!
//! Two tables: the user row keyed by id, and a unique email → id index kept
//! in the same write transaction as the row. Emails are immutable after
//! registration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::{StoreError, StoreResult};

/// Primary table: user id → serialized StoredUser (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: email → user id.
const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// User row as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Caller-chosen identifier (`[A-Za-z0-9_]+`).
    pub id: String,
    pub email: String,
    pub display_name: String,
    /// PBKDF2 salted hash; see `auth::password`.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User repository over the shared embedded database.
pub struct UserStore {
    db: Arc<Database>,
}

impl UserStore {
    /// Create the store, pre-creating its tables.
    pub fn new(db: Arc<Database>) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Insert a new user; id and email must both be unused.
    pub fn create(&self, user: &StoredUser) -> StoreResult<()> {
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(USERS)?;
            if rows.get(user.id.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(format!("user {}", user.id)));
            }

            let mut emails = write_txn.open_table(USER_EMAILS)?;
            if emails.get(user.email.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(format!("email {}", user.email)));
            }

            rows.insert(user.id.as_str(), json.as_slice())?;
            emails.insert(user.email.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(())
    }

    /// Look up a user by id.
    pub fn get(&self, id: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(USERS)?;
        match rows.get(id)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a user by email via the unique index.
    pub fn get_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let id = match emails.get(email)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };

        let rows = read_txn.open_table(USERS)?;
        match rows.get(id.as_str())? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    /// Rewrite an existing user row (display name / password hash).
    pub fn update(&self, user: &StoredUser) -> StoreResult<()> {
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(USERS)?;
            if rows.get(user.id.as_str())?.is_none() {
                return Err(StoreError::NotFound(format!("user {}", user.id)));
            }
            rows.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
