// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory session state and its read-only projections.

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;
use utoipa::ToSchema;

use super::SessionRecord;

/// Lifecycle phase of the session owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, startup restore not yet run
    Idle,
    /// Reading the persisted session at startup
    Restoring,
    /// A login or logout is in flight
    Mutating,
    /// Settled
    Ready { authenticated: bool },
}

/// Session state owned by a single controller.
///
/// `authenticated` implies `user.is_some()`. `loading` is true for the
/// whole duration of every state-mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<SessionRecord>,
    pub loading: bool,
    pub authenticated: bool,
    pub last_error: Option<String>,
    pub phase: Phase,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            authenticated: false,
            last_error: None,
            phase: Phase::Idle,
        }
    }
}

impl AuthState {
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready { .. })
    }

    pub(crate) fn sign_in(&mut self, record: SessionRecord) {
        self.user = Some(record);
        self.authenticated = true;
        self.last_error = None;
    }

    pub(crate) fn sign_out(&mut self) {
        self.user = None;
        self.authenticated = false;
    }
}

/// Anything that owns an [`AuthState`] and lets others observe it.
pub trait SessionSource {
    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

/// Serializable view of the session for UI consumers.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub loading: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<&AuthState> for SessionView {
    fn from(state: &AuthState) -> Self {
        Self {
            loading: state.loading,
            authenticated: state.authenticated,
            user: state.user.clone(),
            last_error: state.last_error.clone(),
        }
    }
}

/// Holds the loading flag for the duration of an operation.
///
/// Acquiring sets `loading` and the given phase; dropping clears `loading`
/// and settles the phase, on every exit path including early returns and
/// dropped futures.
pub(crate) struct LoadingGuard<'a> {
    state: &'a watch::Sender<AuthState>,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn acquire(state: &'a watch::Sender<AuthState>, phase: Phase) -> Self {
        state.send_modify(|s| {
            s.loading = true;
            s.phase = phase;
        });
        debug!(?phase, "Session loading");
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.loading = false;
            s.phase = Phase::Ready {
                authenticated: s.authenticated,
            };
        });
        debug!("Session settled");
    }
}
