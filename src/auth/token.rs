// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Symmetric bearer token verification and issuing.
//!
//! Verification is a pure function of (token, secret, clock): no storage
//! access, no I/O. The token header's algorithm is checked against the
//! configured one *before* any signature work — a token signed with a
//! different algorithm is rejected as [`AuthError::UnexpectedAlgorithm`]
//! even if its signature would verify under that algorithm.

use chrono::Utc;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// The only accepted signing algorithm.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by issued tokens.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    /// Subject (user id) — required.
    sub: String,
    /// Expiration timestamp — required, enforced by validation.
    #[serde(default)]
    exp: i64,
    /// Issuer — informational.
    #[serde(default)]
    iss: String,
}

/// Verifies and issues HS256 bearer tokens with a shared symmetric secret.
pub struct TokenAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_secs: i64,
}

impl TokenAuthenticator {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl_secs,
        }
    }

    /// Verify a token string and return the principal id (`sub` claim).
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedPayload)?;
        if header.alg != SIGNING_ALGORITHM {
            return Err(AuthError::UnexpectedAlgorithm);
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_required_spec_claims(&["exp"]);
        validation.validate_aud = false;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_) => {
                    AuthError::MalformedPayload
                }
                _ => AuthError::InvalidToken,
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::MalformedPayload);
        }

        Ok(data.claims.sub)
    }

    /// Issue a signed token for a subject, expiring after the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: subject.to_string(),
            exp: Utc::now().timestamp() + self.ttl_secs,
            iss: self.issuer.clone(),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidToken)
    }
}
