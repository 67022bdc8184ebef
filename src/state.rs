// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state.
//!
//! Everything in here is either immutable after startup (token
//! authenticator, access policy) or internally synchronized (the redb
//! stores), so the state clones freely across request handlers with no
//! extra locking.

use std::sync::Arc;

use crate::auth::{AccessPolicy, TokenAuthenticator};
use crate::storage::{TemplateStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<TemplateStore>,
    pub users: Arc<UserStore>,
    pub tokens: Arc<TokenAuthenticator>,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(
        templates: TemplateStore,
        users: UserStore,
        tokens: TokenAuthenticator,
    ) -> Self {
        Self {
            templates: Arc::new(templates),
            users: Arc::new(users),
            tokens: Arc::new(tokens),
            policy: Arc::new(AccessPolicy::new()),
        }
    }

    /// State over a throwaway database, for handler and middleware tests.
    #[cfg(test)]
    pub fn for_tests() -> (Self, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = crate::storage::open_database(&dir.path().join("test.redb"))
            .expect("Failed to open test database");
        let state = Self::new(
            TemplateStore::new(db.clone()).expect("Failed to create template store"),
            UserStore::new(db).expect("Failed to create user store"),
            TokenAuthenticator::new("test-secret", "test", 3600),
        );
        (state, dir)
    }
}
