// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route gating.
//!
//! The gate is a pure function of `(route kind, loading, authenticated)`.
//! [`GateWatcher`] re-runs it whenever the observed [`AuthState`] changes, so
//! a mounted protected view learns about a logout without polling.

use tokio::sync::watch;

use super::AuthState;
use crate::config::{DEFAULT_ENTRY_ROUTE, DEFAULT_HOME_ROUTE};

/// How a route relates to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Requires a signed-in viewer
    Protected,
    /// Sign-in and sign-up pages; signed-in viewers are sent home
    Entry,
    /// Always rendered
    Public,
}

/// What the router should do for a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Show a loading placeholder; never redirect while loading
    Loading,
    Redirect(String),
    Render,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGate {
    entry_route: String,
    home_route: String,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_ROUTE, DEFAULT_HOME_ROUTE)
    }
}

impl RouteGate {
    pub fn new(entry_route: impl Into<String>, home_route: impl Into<String>) -> Self {
        Self {
            entry_route: entry_route.into(),
            home_route: home_route.into(),
        }
    }

    pub fn entry_route(&self) -> &str {
        &self.entry_route
    }

    pub fn home_route(&self) -> &str {
        &self.home_route
    }

    pub fn evaluate(&self, kind: RouteKind, loading: bool, authenticated: bool) -> GateDecision {
        match kind {
            RouteKind::Protected if loading => GateDecision::Loading,
            RouteKind::Protected if !authenticated => {
                GateDecision::Redirect(self.entry_route.clone())
            }
            RouteKind::Entry if !loading && authenticated => {
                GateDecision::Redirect(self.home_route.clone())
            }
            RouteKind::Protected | RouteKind::Entry | RouteKind::Public => GateDecision::Render,
        }
    }

    pub fn decide(&self, kind: RouteKind, state: &AuthState) -> GateDecision {
        self.evaluate(kind, state.loading, state.authenticated)
    }

    /// Follow a session for one mounted route.
    pub fn watch(&self, kind: RouteKind, state: watch::Receiver<AuthState>) -> GateWatcher {
        GateWatcher {
            gate: self.clone(),
            kind,
            state,
        }
    }
}

/// Decision stream for a single mounted route.
pub struct GateWatcher {
    gate: RouteGate,
    kind: RouteKind,
    state: watch::Receiver<AuthState>,
}

impl GateWatcher {
    /// Decision for the latest state, marking it seen.
    pub fn current(&mut self) -> GateDecision {
        let state = self.state.borrow_and_update();
        self.gate.decide(self.kind, &state)
    }

    /// Wait for the next state change. `None` once the owner is gone.
    pub async fn changed(&mut self) -> Option<GateDecision> {
        self.state.changed().await.ok()?;
        Some(self.current())
    }

    /// Wait until the decision is no longer [`GateDecision::Loading`].
    pub async fn settled(&mut self) -> Option<GateDecision> {
        let mut decision = self.current();
        while decision == GateDecision::Loading {
            decision = self.changed().await?;
        }
        Some(decision)
    }
}
