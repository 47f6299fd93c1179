// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session and authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

/// Authentication error type.
///
/// None of these are fatal: the worst outcome of any of them is an
/// unauthenticated session that requires a fresh login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login input failed shape validation. The message is user-facing.
    #[error("{0}")]
    Validation(String),
    /// Provider key is not one of email, google, github, wallet
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    /// Persisted session record could not be parsed or is inconsistent
    #[error("Stored session is corrupt: {0}")]
    StorageParse(String),
    /// Session token could not be encoded or decoded
    #[error("Token is malformed: {0}")]
    MalformedToken(String),
    /// Storage backend failed
    #[error("Session storage failed: {0}")]
    Storage(#[from] StorageError),
    /// Opaque failure reported by the identity provider
    #[error("Identity provider error: {0}")]
    Provider(String),
    /// The owning scope was torn down while the operation was in flight
    #[error("Session operation abandoned")]
    Cancelled,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation_error",
            AuthError::UnsupportedProvider(_) => "unsupported_provider",
            AuthError::StorageParse(_) => "storage_parse_error",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::Storage(_) => "storage_error",
            AuthError::Provider(_) => "provider_error",
            AuthError::Cancelled => "cancelled",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::UnsupportedProvider(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::Provider(_) => StatusCode::BAD_GATEWAY,
            AuthError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::StorageParse(_) | AuthError::MalformedToken(_) | AuthError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
