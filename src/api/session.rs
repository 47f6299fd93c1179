// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::{AuthError, ProviderOptions, SessionView};
use crate::state::AppState;

/// Email and password login input.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Session",
    responses(
        (status = 200, description = "Current session", body = SessionView)
    )
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.view())
}

#[utoipa::path(
    post,
    path = "/v1/session/login",
    tag = "Session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionView),
        (status = 400, description = "Invalid email or password"),
        (status = 500, description = "Session could not be persisted"),
        (status = 503, description = "Server is shutting down")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionView>, AuthError> {
    state
        .session
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(state.session.view()))
}

/// The body is optional; only the `wallet` provider needs an address.
#[utoipa::path(
    post,
    path = "/v1/session/providers/{provider}",
    tag = "Session",
    params(
        ("provider" = String, Path, description = "One of email, google, github, wallet")
    ),
    request_body(content = ProviderOptions, description = "Wallet address for the wallet provider"),
    responses(
        (status = 200, description = "Signed in", body = SessionView),
        (status = 400, description = "Unsupported provider or missing wallet address"),
        (status = 500, description = "Session could not be persisted")
    )
)]
pub async fn login_with_provider(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Result<Json<SessionView>, AuthError> {
    let options = parse_options(&body)?;
    state
        .session
        .login_with_provider(&provider, options)
        .await?;
    Ok(Json(state.session.view()))
}

#[utoipa::path(
    post,
    path = "/v1/session/logout",
    tag = "Session",
    responses(
        (status = 200, description = "Signed out", body = SessionView)
    )
)]
pub async fn logout(State(state): State<AppState>) -> Json<SessionView> {
    state.session.logout().await;
    Json(state.session.view())
}

fn parse_options(body: &[u8]) -> Result<ProviderOptions, AuthError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProviderOptions::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AuthError::validation(format!("Invalid provider options: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_means_no_options() {
        assert_eq!(parse_options(b"").unwrap(), ProviderOptions::default());
        assert_eq!(parse_options(b" \n").unwrap(), ProviderOptions::default());
    }

    #[test]
    fn parses_wallet_address() {
        let options = parse_options(br#"{"address":"0xAbC"}"#).unwrap();
        assert_eq!(options, ProviderOptions::wallet("0xAbC"));
    }

    #[test]
    fn rejects_malformed_options() {
        let err = parse_options(b"{address}").unwrap_err();
        assert_eq!(err.error_code(), "validation_error");
    }

    #[test]
    fn login_request_fields_default_to_empty() {
        let request: LoginRequest = serde_json::from_str(r#"{"email":"a@b.com"}"#).unwrap();
        assert_eq!(request.email, "a@b.com");
        assert!(request.password.is_empty());
    }
}
