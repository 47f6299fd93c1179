// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opaque session token.
//!
//! The token is the standard base64 encoding of a small JSON claims bundle,
//! byte-compatible with `btoa(JSON.stringify(claims))` in the browser. It is
//! NOT signed; nothing in this crate treats it as a credential.

use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};

use super::{AuthError, Provider, SessionRecord};

/// Claims bundled into a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (session record id)
    pub sub: String,
    pub email: String,
    /// Present for provider logins only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Expiration timestamp
    pub exp: i64,
}

impl TokenClaims {
    pub fn for_record(record: &SessionRecord, provider: Option<Provider>) -> Self {
        Self {
            sub: record.id.clone(),
            email: record.email.clone(),
            provider,
            exp: record.expires_at_epoch_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, AuthError> {
        let json =
            serde_json::to_vec(self).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        Ok(Base64::encode_string(&json))
    }

    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let json =
            Base64::decode_vec(token.trim()).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| AuthError::MalformedToken(e.to_string()))
    }
}
