// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity methods a session can be established with.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AuthError;

/// Identity method used to establish a session.
///
/// - `Email` - email and password
/// - `Google` / `Github` - OAuth social providers
/// - `Wallet` - wallet signature, identified by address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Email,
    Google,
    Github,
    Wallet,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Email => "email",
            Provider::Google => "google",
            Provider::Github => "github",
            Provider::Wallet => "wallet",
        }
    }
}

impl FromStr for Provider {
    type Err = AuthError;

    /// Provider keys are matched exactly; anything else is unsupported.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Provider::Email),
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::Github),
            "wallet" => Ok(Provider::Wallet),
            other => Err(AuthError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra inputs for provider logins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProviderOptions {
    /// Wallet address (required for the `wallet` provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProviderOptions {
    pub fn wallet(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers() {
        assert_eq!("email".parse::<Provider>().unwrap(), Provider::Email);
        assert_eq!("google".parse::<Provider>().unwrap(), Provider::Google);
        assert_eq!("github".parse::<Provider>().unwrap(), Provider::Github);
        assert_eq!("wallet".parse::<Provider>().unwrap(), Provider::Wallet);
    }

    #[test]
    fn unknown_provider_is_unsupported() {
        let err = "facebook".parse::<Provider>().unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedProvider(ref p) if p == "facebook"));
        assert!("GitHub".parse::<Provider>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Provider::Github).unwrap(), r#""github""#);
        assert_eq!(Provider::Wallet.to_string(), "wallet");
    }

    #[test]
    fn options_default_to_no_address() {
        let options: ProviderOptions = serde_json::from_str("{}").unwrap();
        assert!(options.address.is_none());
        assert_eq!(
            ProviderOptions::wallet("0xabc").address.as_deref(),
            Some("0xabc")
        );
    }
}
