// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthController, RouteGate};
use crate::config::SessionConfig;
use crate::storage::{MemoryStorage, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<AuthController>,
    pub gate: RouteGate,
}

impl AppState {
    pub fn new(session: AuthController, gate: RouteGate) -> Self {
        Self {
            session: Arc::new(session),
            gate,
        }
    }
}

impl Default for AppState {
    /// In-memory session with default routes.
    fn default() -> Self {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        Self::new(
            AuthController::new(store, SessionConfig::default()),
            RouteGate::default(),
        )
    }
}
