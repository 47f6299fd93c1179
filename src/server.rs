// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process bootstrap: storage selection, state wiring and the serve loop.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::router;
use crate::auth::{AuthController, AuthError, RouteGate};
use crate::config::Config;
use crate::error::ServerError;
use crate::state::AppState;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage, SessionStore, StoragePaths};

/// Open the configured storage backend.
///
/// With no data directory, sessions live in memory for the process lifetime.
pub fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStorage>, ServerError> {
    match &config.data_dir {
        Some(dir) => {
            let mut storage = FileStorage::new(StoragePaths::new(dir));
            storage.initialize()?;
            info!(dir = %storage.paths().session_dir().display(), "Using file session storage");
            Ok(Arc::new(storage))
        }
        None => {
            warn!("DATA_DIR not set, sessions will not survive a restart");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

/// Wire the controller and gate from configuration.
pub fn build_state(config: &Config) -> Result<AppState, ServerError> {
    let store = SessionStore::new(open_storage(config)?);
    let controller = AuthController::new(store, config.session.clone());
    let gate = RouteGate::new(&config.entry_route, &config.home_route);
    Ok(AppState::new(controller, gate))
}

/// Serve until Ctrl-C, then tear the session controller down.
pub async fn serve(config: Config) -> Result<(), ServerError> {
    let addr = config.bind_addr()?;
    let state = build_state(&config)?;

    let session = state.session.clone();
    tokio::spawn(async move {
        match session.restore_session().await {
            Ok(_) | Err(AuthError::Cancelled) => {}
            Err(e) => warn!(error = %e, "Session restore failed"),
        }
    });

    let app = router(state.clone());
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Aries dashboard listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.session.teardown();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
