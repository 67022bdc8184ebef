// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Method access policy.
//!
//! Every API route resolves to a logical method name, and a static
//! allow-list decides which method names are callable without a principal.
//! Both tables are built once at startup and read concurrently without
//! locking — they are never mutated after construction.
//!
//! The policy fails closed twice over: a method name absent from the
//! allow-list is principal-required, and a route that resolves to no method
//! name at all is treated the same way. New methods are private until
//! explicitly allow-listed.

use std::collections::{HashMap, HashSet};

/// Route table: `(HTTP verb, matched path pattern)` → logical method name.
///
/// Must stay in sync with the router in `api::router`; the router test
/// asserts each entry resolves.
const ROUTES: &[(&str, &str, &str)] = &[
    ("POST", "/v1/auth/register", "auth.register"),
    ("POST", "/v1/auth/login", "auth.login"),
    ("GET", "/v1/users/me", "users.me"),
    ("PUT", "/v1/users/me", "users.update"),
    ("GET", "/v1/templates", "templates.list"),
    ("POST", "/v1/templates", "templates.create"),
    ("GET", "/v1/templates/{template_id}", "templates.get"),
    ("PUT", "/v1/templates/{template_id}", "templates.update"),
    ("DELETE", "/v1/templates/{template_id}", "templates.delete"),
    ("POST", "/v1/templates/{template_id}/like", "templates.toggle_like"),
    (
        "POST",
        "/v1/templates/{template_id}/favorite",
        "templates.toggle_favorite",
    ),
    ("GET", "/v1/categories", "categories.list"),
    ("GET", "/v1/tags", "tags.list"),
    ("GET", "/health", "health.check"),
    ("GET", "/health/live", "health.live"),
    ("GET", "/health/ready", "health.ready"),
];

/// Methods callable without a bearer token.
const PUBLIC_METHODS: &[&str] = &[
    "auth.register",
    "auth.login",
    "templates.list",
    "templates.get",
    "categories.list",
    "tags.list",
    "health.check",
    "health.live",
    "health.ready",
];

/// Immutable method access policy, consulted once per inbound call.
pub struct AccessPolicy {
    routes: HashMap<(&'static str, &'static str), &'static str>,
    public: HashSet<&'static str>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self {
            routes: ROUTES
                .iter()
                .map(|(verb, path, method)| ((*verb, *path), *method))
                .collect(),
            public: PUBLIC_METHODS.iter().copied().collect(),
        }
    }

    /// Resolve the logical method name for a matched route.
    pub fn method_for(&self, verb: &str, path_pattern: &str) -> Option<&'static str> {
        self.routes.get(&(verb, path_pattern)).copied()
    }

    /// Whether a method is callable without a principal.
    pub fn is_public(&self, method: &str) -> bool {
        self.public.contains(method)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new()
    }
}
