// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant surfaces to callers as the `unauthenticated` kind; the
//! variants exist so verification failures stay distinguishable internally
//! and in tests.

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Authentication error type.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header on a principal-required method
    MissingToken,
    /// Authorization header present but not `Bearer <token>`
    InvalidAuthHeader,
    /// Token header names an algorithm other than the configured one
    UnexpectedAlgorithm,
    /// Claims are unreadable or a required claim is absent
    MalformedPayload,
    /// Signature verification failed, or the token is expired
    InvalidToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "missing authorization token"),
            AuthError::InvalidAuthHeader => {
                write!(f, "invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::UnexpectedAlgorithm => write!(f, "unexpected token signing algorithm"),
            AuthError::MalformedPayload => write!(f, "invalid token payload"),
            AuthError::InvalidToken => write!(f, "invalid token"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::unauthenticated(e.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
