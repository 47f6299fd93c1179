// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted session record and identity synthesis.
//!
//! Logins in this system do not talk to a real issuer; the record is
//! synthesized locally from the login input. Email logins are derived
//! deterministically from the normalized address, so the same email always
//! yields the same user id and wallet address.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AuthError, Provider, ProviderOptions};

/// Avatar service used for initials avatars.
const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/initials/svg";

/// Profile snapshot of the signed-in user, persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Stable user identifier
    pub id: String,
    /// Name shown in the dashboard header
    pub display_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub provider: Provider,
    pub issued_at_epoch_seconds: i64,
    /// Advisory unless expiry enforcement is enabled on restore
    pub expires_at_epoch_seconds: i64,
}

impl SessionRecord {
    /// Parse and validate a persisted record.
    pub fn from_json(raw: &str) -> Result<Self, AuthError> {
        let record: SessionRecord =
            serde_json::from_str(raw).map_err(|e| AuthError::StorageParse(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Check the structural invariants of a record.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.id.trim().is_empty() {
            return Err(AuthError::StorageParse("record has an empty id".to_string()));
        }
        if self.expires_at_epoch_seconds <= self.issued_at_epoch_seconds {
            return Err(AuthError::StorageParse(format!(
                "record expires at {} which is not after issue time {}",
                self.expires_at_epoch_seconds, self.issued_at_epoch_seconds
            )));
        }
        Ok(())
    }

    pub fn is_expired_at(&self, now_epoch_seconds: i64) -> bool {
        self.expires_at_epoch_seconds <= now_epoch_seconds
    }

    /// Synthesize the record for an email/password login.
    pub fn for_email(email: &str, issued_at: i64, ttl_secs: i64) -> Self {
        let normalized = normalize_email(email);
        let local_part = email.split_once('@').map_or(email, |(local, _)| local);
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{normalized}").as_bytes());

        Self {
            id: format!("user_{}", id.simple()),
            display_name: local_part.to_string(),
            email: email.to_string(),
            wallet_address: Some(derived_wallet_address(&normalized)),
            avatar_url: avatar_url(local_part),
            provider: Provider::Email,
            issued_at_epoch_seconds: issued_at,
            expires_at_epoch_seconds: issued_at.saturating_add(ttl_secs),
        }
    }

    /// Synthesize the record for a wallet login.
    pub fn for_wallet(address: &str, issued_at: i64, ttl_secs: i64) -> Result<Self, AuthError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AuthError::validation("Wallet address is required"));
        }
        let lowered = address.to_lowercase();
        let short: String = address.chars().take(6).collect();

        Ok(Self {
            id: format!("wallet-{lowered}"),
            display_name: format!("Wallet {short}"),
            email: format!("{lowered}@wallet.eth"),
            wallet_address: Some(address.to_string()),
            avatar_url: avatar_url(&short),
            provider: Provider::Wallet,
            issued_at_epoch_seconds: issued_at,
            expires_at_epoch_seconds: issued_at.saturating_add(ttl_secs),
        })
    }

    /// Synthesize the record for a provider login.
    ///
    /// Wallet logins are keyed by address; the OAuth-style providers and the
    /// bare `email` provider get fixed placeholder identities.
    pub fn for_provider(
        provider: Provider,
        options: &ProviderOptions,
        issued_at: i64,
        ttl_secs: i64,
    ) -> Result<Self, AuthError> {
        let (display_name, email, seed) = match provider {
            Provider::Wallet => {
                let address = options.address.as_deref().unwrap_or_default();
                return Self::for_wallet(address, issued_at, ttl_secs);
            }
            Provider::Github => ("GitHub User", "github_user@example.com", "GH"),
            Provider::Google => ("Google User", "google_user@gmail.com", "GO"),
            Provider::Email => ("Email User", "email_user@example.com", "EM"),
        };

        Ok(Self {
            id: format!("{provider}_placeholder"),
            display_name: display_name.to_string(),
            email: email.to_string(),
            wallet_address: None,
            avatar_url: avatar_url(seed),
            provider,
            issued_at_epoch_seconds: issued_at,
            expires_at_epoch_seconds: issued_at.saturating_add(ttl_secs),
        })
    }
}

/// NFKC-normalized, trimmed, lowercased email used for identity derivation.
fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

/// `0x` followed by the first 40 hex digits of SHA-256(normalized email).
fn derived_wallet_address(normalized_email: &str) -> String {
    let digest = Sha256::digest(normalized_email.as_bytes());
    let mut hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex.truncate(40);
    format!("0x{hex}")
}

fn avatar_url(seed: &str) -> Option<String> {
    Url::parse_with_params(AVATAR_BASE_URL, &[("seed", seed)])
        .ok()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const WEEK: i64 = 7 * 24 * 60 * 60;

    #[test]
    fn email_record_is_deterministic() {
        let a = SessionRecord::for_email("a@b.com", NOW, WEEK);
        let b = SessionRecord::for_email("a@b.com", NOW + 10, WEEK);
        assert_eq!(a.id, b.id);
        assert_eq!(a.wallet_address, b.wallet_address);
        assert!(a.id.starts_with("user_"));
        assert_eq!(a.email, "a@b.com");
        assert_eq!(a.display_name, "a");
        assert_eq!(a.provider, Provider::Email);
        assert_eq!(a.expires_at_epoch_seconds, NOW + WEEK);
    }

    #[test]
    fn email_identity_ignores_case_and_whitespace() {
        let a = SessionRecord::for_email("Alice@Example.com", NOW, WEEK);
        let b = SessionRecord::for_email(" alice@example.com", NOW, WEEK);
        assert_eq!(a.id, b.id);
        assert_eq!(a.email, "Alice@Example.com");
    }

    #[test]
    fn derived_wallet_address_has_evm_shape() {
        let record = SessionRecord::for_email("a@b.com", NOW, WEEK);
        let address = record.wallet_address.unwrap();
        assert_eq!(address.len(), 42);
        assert!(address.starts_with("0x"));
        assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn wallet_record_uses_lowercased_address() {
        let record = SessionRecord::for_wallet("0xABCDEF0123", NOW, WEEK).unwrap();
        assert_eq!(record.id, "wallet-0xabcdef0123");
        assert_eq!(record.email, "0xabcdef0123@wallet.eth");
        assert_eq!(record.display_name, "Wallet 0xABCD");
        assert_eq!(record.wallet_address.as_deref(), Some("0xABCDEF0123"));
        assert_eq!(record.provider, Provider::Wallet);
    }

    #[test]
    fn wallet_record_requires_address() {
        let err = SessionRecord::for_provider(Provider::Wallet, &ProviderOptions::default(), NOW, WEEK)
            .unwrap_err();
        assert_eq!(err.to_string(), "Wallet address is required");
    }

    #[test]
    fn placeholder_identities_are_fixed() {
        let options = ProviderOptions::default();
        let github = SessionRecord::for_provider(Provider::Github, &options, NOW, WEEK).unwrap();
        assert_eq!(github.id, "github_placeholder");
        assert_eq!(github.email, "github_user@example.com");
        assert_eq!(github.display_name, "GitHub User");

        let google = SessionRecord::for_provider(Provider::Google, &options, NOW, WEEK).unwrap();
        assert_eq!(google.email, "google_user@gmail.com");
        assert_eq!(google.provider, Provider::Google);
    }

    #[test]
    fn avatar_url_encodes_seed() {
        let record = SessionRecord::for_email("jo hn@b.com", NOW, WEEK);
        let url = record.avatar_url.unwrap();
        assert!(url.starts_with(AVATAR_BASE_URL));
        assert!(url.ends_with("seed=jo+hn"));
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let record = SessionRecord::for_email("a@b.com", NOW, WEEK);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["displayName"], "a");
        assert_eq!(json["issuedAtEpochSeconds"], NOW);
        assert_eq!(json["provider"], "email");
    }

    #[test]
    fn from_json_rejects_garbage_and_inverted_expiry() {
        assert!(matches!(
            SessionRecord::from_json("{not json"),
            Err(AuthError::StorageParse(_))
        ));

        let mut record = SessionRecord::for_email("a@b.com", NOW, WEEK);
        record.expires_at_epoch_seconds = NOW;
        let raw = serde_json::to_string(&record).unwrap();
        assert!(matches!(
            SessionRecord::from_json(&raw),
            Err(AuthError::StorageParse(_))
        ));
    }

    #[test]
    fn expiry_check() {
        let record = SessionRecord::for_email("a@b.com", NOW, WEEK);
        assert!(!record.is_expired_at(NOW));
        assert!(record.is_expired_at(NOW + WEEK));
    }
}
