// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential verification capability.
//!
//! The controller validates the *shape* of login input itself. Whether the
//! credentials are actually correct is delegated to a [`CredentialVerifier`].
//! The shipped [`AcceptAnyVerifier`] performs no check at all, which makes
//! email logins a stand-in rather than a security boundary. A deployment
//! that needs real authentication plugs in a verifier backed by a trusted
//! issuer.

use std::time::Duration;

use async_trait::async_trait;

use super::AuthError;

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check credentials that already passed shape validation.
    async fn verify(&self, email: &str, password: &str) -> Result<(), AuthError>;
}

/// Accepts every well-formed credential, optionally after a fixed delay
/// that simulates a round trip to an issuer.
#[derive(Debug, Clone, Default)]
pub struct AcceptAnyVerifier {
    latency: Duration,
}

impl AcceptAnyVerifier {
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl CredentialVerifier for AcceptAnyVerifier {
    async fn verify(&self, _email: &str, _password: &str) -> Result<(), AuthError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(())
    }
}
