// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External identity provider adapter.
//!
//! When sign-in is delegated to a hosted identity provider, the session is
//! no longer synthesized locally. [`ProviderMirror`] follows the provider's
//! `{is_loaded, is_signed_in, current_user}` signals and projects them onto
//! the same [`AuthState`] shape the rest of the dashboard consumes, so route
//! gating does not care which owner is in charge.
//!
//! The mirror keeps a fixed placeholder in the token key while the provider
//! reports a signed-in user, for consumers that only check token presence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::notify::{LogNotifier, Notice, Notifier};
use super::state::{Phase, SessionSource, SessionView};
use super::{AuthError, AuthState, Provider, SessionRecord};
use crate::config::SessionConfig;
use crate::storage::SessionStore;

/// Token value written while the provider reports a signed-in user.
pub const PROVIDER_PLACEHOLDER_TOKEN: &str = "identity-provider-session";

/// Display name used when the provider user has neither name nor username.
const FALLBACK_DISPLAY_NAME: &str = "User";

/// The provider's view of its current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderUser {
    pub id: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub primary_email: Option<String>,
    pub primary_web3_wallet: Option<String>,
    pub image_url: Option<String>,
}

impl ProviderUser {
    fn display_name(&self) -> &str {
        [self.full_name.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }

    /// Adapt to the dashboard's record shape.
    pub fn to_record(&self, issued_at: i64, ttl_secs: i64) -> SessionRecord {
        let wallet_address = self
            .primary_web3_wallet
            .clone()
            .filter(|address| !address.is_empty());
        SessionRecord {
            id: self.id.clone(),
            display_name: self.display_name().to_string(),
            email: self.primary_email.clone().unwrap_or_default(),
            provider: if wallet_address.is_some() {
                Provider::Wallet
            } else {
                Provider::Email
            },
            wallet_address,
            avatar_url: self.image_url.clone().filter(|url| !url.is_empty()),
            issued_at_epoch_seconds: issued_at,
            expires_at_epoch_seconds: issued_at.saturating_add(ttl_secs),
        }
    }
}

/// Signals published by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSnapshot {
    pub is_loaded: bool,
    pub is_signed_in: bool,
    pub current_user: Option<ProviderUser>,
}

/// Hosted identity provider capability.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<ProviderSnapshot>;

    /// Fails with [`AuthError::Provider`] when the provider rejects the call.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Session owner backed by an [`IdentityProvider`].
pub struct ProviderMirror {
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<AuthState>,
    ttl_secs: i64,
}

impl ProviderMirror {
    /// Mirrored users get the configured session lifetime as advisory expiry.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: SessionStore,
        config: &SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            provider,
            store,
            notifier: Arc::new(LogNotifier),
            state,
            ttl_secs: config.ttl_secs(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> SessionView {
        SessionView::from(&*self.state.borrow())
    }

    /// Project one provider snapshot onto the session state.
    pub fn apply(&self, snapshot: &ProviderSnapshot) {
        let user = snapshot
            .current_user
            .as_ref()
            .map(|user| user.to_record(Utc::now().timestamp(), self.ttl_secs));
        let authenticated = snapshot.is_signed_in && user.is_some();

        let token_result = if authenticated {
            self.store.put_token(PROVIDER_PLACEHOLDER_TOKEN)
        } else {
            self.store.discard_token()
        };
        if let Err(e) = token_result {
            warn!(error = %e, "Failed to sync provider placeholder token");
        }

        self.state.send_modify(|s| {
            // Once the provider has loaded, loading never returns.
            s.loading = s.loading && !snapshot.is_loaded;
            s.authenticated = authenticated;
            s.user = user;
            s.phase = if s.loading {
                Phase::Restoring
            } else {
                Phase::Ready { authenticated }
            };
        });
        debug!(
            loaded = snapshot.is_loaded,
            authenticated, "Applied identity provider snapshot"
        );
    }

    /// Follow the provider until `scope` is cancelled or the provider goes away.
    pub async fn run(&self, scope: CancellationToken) {
        let mut signals = self.provider.subscribe();
        loop {
            let snapshot = signals.borrow_and_update().clone();
            self.apply(&snapshot);

            tokio::select! {
                biased;
                _ = scope.cancelled() => break,
                changed = signals.changed() => {
                    if changed.is_err() {
                        info!("Identity provider closed its signal channel");
                        break;
                    }
                }
            }
        }
    }

    /// Sign-in is driven by the provider's own pages; this only resets the error.
    pub fn login(&self) {
        self.state.send_modify(|s| s.last_error = None);
    }

    pub fn login_with_provider(&self, provider: &str) {
        debug!(provider, "Provider-driven login requested");
        self.state.send_modify(|s| s.last_error = None);
    }

    /// Ask the provider to end the session.
    ///
    /// The state follows through the provider's next snapshot. A rejected
    /// sign-out is reported as an error notice and leaves state untouched.
    pub async fn logout(&self) {
        match self.provider.sign_out().await {
            Ok(()) => info!("Identity provider sign-out requested"),
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Identity provider sign-out failed");
                self.notifier.notify(Notice::error(e.to_string()));
            }
        }
    }
}

impl SessionSource for ProviderMirror {
    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}
