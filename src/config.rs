// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup into a
//! [`Config`] value and never mutated afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the embedded database | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | Symmetric secret for bearer token signing/verification | Required |
//! | `JWT_ISSUER` | Issuer claim stamped into issued tokens | `prompthub` |
//! | `TOKEN_TTL_SECS` | Lifetime of issued tokens in seconds | `86400` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the bearer token signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Default lifetime of issued tokens (24 hours).
const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

/// Immutable runtime configuration, loaded from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Root directory for the embedded database file.
    pub data_dir: PathBuf,
    /// Symmetric secret for token signing and verification.
    pub jwt_secret: String,
    /// Issuer claim stamped into issued tokens.
    pub jwt_issuer: String,
    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: i64,
    /// Logging format (`json` or `pretty`).
    pub log_json: bool,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// # Errors
    /// Fails if `JWT_SECRET` is unset or empty — the service cannot resolve
    /// principals without it.
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var(JWT_SECRET_ENV).unwrap_or_default();
        if jwt_secret.is_empty() {
            return Err(format!("{JWT_SECRET_ENV} must be set"));
        }

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            data_dir: env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/data")),
            jwt_secret,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "prompthub".to_string()),
            token_ttl_secs,
            log_json: env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}
