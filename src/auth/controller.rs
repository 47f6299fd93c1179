// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session controller.
//!
//! The controller is the only owner of [`AuthState`]. It is constructed once
//! at process start, restores the persisted session, and mediates every
//! login and logout between the [`SessionStore`] and the UI.
//!
//! ## State Machine
//!
//! ```text
//! Idle ──restore_session──▶ Restoring ──▶ Ready(authenticated | unauthenticated)
//! Ready ──login / login_with_provider / logout──▶ Mutating ──▶ Ready(*)
//! ```
//!
//! Mutating operations are serialized. Every suspension point races the
//! controller's cancellation scope; after [`AuthController::teardown`] an
//! in-flight operation returns [`AuthError::Cancelled`] without applying its
//! result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::notify::{LogNotifier, Notice, Notifier};
use super::state::{LoadingGuard, Phase, SessionSource, SessionView};
use super::verifier::{AcceptAnyVerifier, CredentialVerifier};
use super::{AuthError, AuthState, Provider, ProviderOptions, SessionRecord, TokenClaims};
use crate::config::SessionConfig;
use crate::storage::SessionStore;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Owner of the in-memory session state.
pub struct AuthController {
    store: SessionStore,
    verifier: Arc<dyn CredentialVerifier>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
    state: watch::Sender<AuthState>,
    /// Set once the startup restore has applied its outcome
    restored: watch::Sender<bool>,
    op_lock: Mutex<()>,
    scope: CancellationToken,
}

impl AuthController {
    /// Create a controller in the `Idle` phase with `loading = true`.
    ///
    /// Uses [`AcceptAnyVerifier`] (with the configured latency) and
    /// [`LogNotifier`] until replaced.
    pub fn new(store: SessionStore, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        let (restored, _) = watch::channel(false);
        Self {
            store,
            verifier: Arc::new(AcceptAnyVerifier::with_latency(config.login_latency)),
            notifier: Arc::new(LogNotifier),
            config,
            state,
            restored,
            op_lock: Mutex::new(()),
            scope: CancellationToken::new(),
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Current state.
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Current state as a serializable view.
    pub fn view(&self) -> SessionView {
        SessionView::from(&*self.state.borrow())
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Signal every in-flight and future operation to abandon.
    pub fn teardown(&self) {
        if !self.scope.is_cancelled() {
            info!("Session controller torn down");
        }
        self.scope.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Restore the persisted session at startup.
    ///
    /// Returns whether a session was restored. Absent, corrupt and (when
    /// enforced) expired sessions clear every storage key and leave the
    /// controller unauthenticated. The outcome is applied only after the
    /// configured debounce has elapsed.
    pub async fn restore_session(&self) -> Result<bool, AuthError> {
        let _op = self.begin().await?;
        let _loading = LoadingGuard::acquire(&self.state, Phase::Restoring);

        self.checkpoint()?;
        let restored = match self.store.try_load() {
            Ok(Some(session)) if self.rejects_expired(&session.record) => {
                info!(
                    user_id = %session.record.id,
                    expired_at = session.record.expires_at_epoch_seconds,
                    "Persisted session has expired, discarding"
                );
                self.store.clear();
                None
            }
            Ok(Some(session)) => {
                if let Err(e) = self.store.mark_persisted() {
                    warn!(error = %e, "Failed to re-persist session marker");
                }
                Some(session.record)
            }
            Ok(None) => {
                self.store.clear();
                None
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Discarding unreadable persisted session");
                self.store.clear();
                None
            }
        };

        self.pause(self.config.restore_debounce).await?;

        let authenticated = restored.is_some();
        self.state.send_modify(|s| match restored {
            Some(record) => s.sign_in(record),
            None => s.sign_out(),
        });
        self.restored.send_replace(true);
        info!(authenticated, "Session restore complete");
        Ok(authenticated)
    }

    /// Email and password login.
    ///
    /// Waits for the startup restore before touching the state.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionRecord, AuthError> {
        let _op = self.begin_mutation().await?;
        let _loading = LoadingGuard::acquire(&self.state, Phase::Mutating);
        self.state.send_modify(|s| s.last_error = None);

        let result = self.login_with_credentials(email, password).await;
        self.settle(result, |_| "Login successful".to_string())
    }

    /// Login through one of the supported identity providers.
    pub async fn login_with_provider(
        &self,
        provider: &str,
        options: ProviderOptions,
    ) -> Result<SessionRecord, AuthError> {
        let _op = self.begin_mutation().await?;
        let _loading = LoadingGuard::acquire(&self.state, Phase::Mutating);
        self.state.send_modify(|s| s.last_error = None);

        let result = provider
            .parse::<Provider>()
            .and_then(|provider| {
                let record =
                    SessionRecord::for_provider(provider, &options, now(), self.config.ttl_secs())?;
                self.establish(record, Some(provider))
            });
        self.settle(result, provider_notice)
    }

    /// Clear the persisted session and reset to unauthenticated.
    pub async fn logout(&self) {
        let Ok(_op) = self.begin_mutation().await else {
            debug!("Logout abandoned after teardown");
            return;
        };
        let _loading = LoadingGuard::acquire(&self.state, Phase::Mutating);

        self.store.clear();
        self.state.send_modify(|s| {
            s.sign_out();
            s.last_error = None;
        });
        info!("Session cleared");
        self.notifier.notify(Notice::success("Logged out successfully"));
    }

    async fn login_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionRecord, AuthError> {
        validate_credentials(email, password)?;
        self.cancellable(self.verifier.verify(email, password)).await??;

        let record = SessionRecord::for_email(email, now(), self.config.ttl_secs());
        self.establish(record, None)
    }

    /// Persist a freshly synthesized session and mark the state signed in.
    fn establish(
        &self,
        record: SessionRecord,
        provider: Option<Provider>,
    ) -> Result<SessionRecord, AuthError> {
        self.checkpoint()?;
        let token = TokenClaims::for_record(&record, provider).encode()?;
        self.store.save(&record, &token)?;
        self.state.send_modify(|s| s.sign_in(record.clone()));
        Ok(record)
    }

    fn settle(
        &self,
        result: Result<SessionRecord, AuthError>,
        success_message: impl FnOnce(&SessionRecord) -> String,
    ) -> Result<SessionRecord, AuthError> {
        match &result {
            Ok(record) => {
                info!(user_id = %record.id, provider = %record.provider, "Session established");
                self.notifier.notify(Notice::success(success_message(record)));
            }
            Err(AuthError::Cancelled) => {
                debug!("Login abandoned after teardown");
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Login failed");
                let message = e.to_string();
                self.state
                    .send_modify(|s| s.last_error = Some(message.clone()));
                self.notifier.notify(Notice::error(message));
            }
        }
        result
    }

    /// Take the operation lock unless the scope is torn down first.
    async fn begin(&self) -> Result<MutexGuard<'_, ()>, AuthError> {
        self.checkpoint()?;
        self.cancellable(self.op_lock.lock()).await
    }

    /// Wait for the startup restore, then take the operation lock.
    async fn begin_mutation(&self) -> Result<MutexGuard<'_, ()>, AuthError> {
        let mut restored = self.restored.subscribe();
        let ready = self.cancellable(restored.wait_for(|done| *done)).await?.is_ok();
        if !ready {
            return Err(AuthError::Cancelled);
        }
        self.begin().await
    }

    fn checkpoint(&self) -> Result<(), AuthError> {
        if self.scope.is_cancelled() {
            Err(AuthError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output, AuthError> {
        tokio::select! {
            biased;
            _ = self.scope.cancelled() => Err(AuthError::Cancelled),
            out = fut => Ok(out),
        }
    }

    async fn pause(&self, duration: Duration) -> Result<(), AuthError> {
        if duration.is_zero() {
            return self.checkpoint();
        }
        self.cancellable(tokio::time::sleep(duration)).await
    }

    fn rejects_expired(&self, record: &SessionRecord) -> bool {
        self.config.enforce_expiry && record.is_expired_at(now())
    }
}

impl SessionSource for AuthController {
    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

/// Shape-only validation of login input.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::validation("Email is required"));
    }
    if password.is_empty() {
        return Err(AuthError::validation("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn provider_notice(record: &SessionRecord) -> String {
    match (record.provider, record.wallet_address.as_deref()) {
        (Provider::Wallet, Some(address)) => {
            let chars: Vec<char> = address.chars().collect();
            let head: String = chars.iter().take(6).collect();
            let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
            format!("Connected with wallet: {head}...{tail}")
        }
        (provider, _) => format!("Login with {provider} successful"),
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}
