// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

mod api;
mod auth;
mod config;
mod cursor;
mod error;
mod listing;
mod models;
mod state;
mod storage;

#[cfg(not(test))]
use std::net::SocketAddr;

#[cfg(not(test))]
use api::router;
#[cfg(not(test))]
use auth::TokenAuthenticator;
#[cfg(not(test))]
use config::Config;
#[cfg(not(test))]
use state::AppState;
#[cfg(not(test))]
use storage::{open_database, TemplateStore, UserStore};
#[cfg(not(test))]
use tracing_subscriber::EnvFilter;

#[cfg(not(test))]
#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("Invalid configuration");

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Open the embedded database and build the stores.
    let db_path = config.data_dir.join("prompthub.redb");
    let db = open_database(&db_path).expect("Failed to open database");
    let templates = TemplateStore::new(db.clone()).expect("Failed to initialize template store");
    let users = UserStore::new(db).expect("Failed to initialize user store");

    let tokens = TokenAuthenticator::new(
        &config.jwt_secret,
        config.jwt_issuer.clone(),
        config.token_ttl_secs,
    );

    let state = AppState::new(templates, users, tokens);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(%addr, db = %db_path.display(), "PromptHub server listening (docs at /docs)");

    // On shutdown (or a cancelled request) any open write transaction is
    // dropped uncommitted and rolls back; there is nothing else to unwind.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

#[cfg(not(test))]
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install signal handler");
    tracing::info!("shutdown signal received");
}
