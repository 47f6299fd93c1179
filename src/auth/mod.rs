// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Module
//!
//! Session ownership and route gating for the Aries dashboard.
//!
//! ## Session Flow
//!
//! 1. At startup the [`AuthController`] reads the persisted session
//!    (`aries_user`, `aries_token`, `aries_auth_state`) and settles after a
//!    short debounce.
//! 2. Login synthesizes a [`SessionRecord`] from the login input, issues a
//!    [`TokenClaims`] token and persists all three keys.
//! 3. Logout clears every key and resets the state.
//! 4. The [`RouteGate`] decides, for every route, whether to render, show a
//!    loading placeholder or redirect.
//!
//! When sign-in is delegated to a hosted identity provider, the
//! [`ProviderMirror`] owns the state instead and follows the provider's
//! signals.
//!
//! ## Security
//!
//! - Tokens are unsigned base64 JSON and carry no authority
//! - Credentials are only shape-checked unless a [`CredentialVerifier`] is
//!   plugged in
//! - No error is fatal; the worst case is a fresh login

pub mod controller;
pub mod error;
pub mod gate;
pub mod identity;
pub mod middleware;
pub mod notify;
pub mod provider;
pub mod record;
pub mod state;
pub mod token;
pub mod verifier;

pub use controller::{validate_credentials, AuthController, MIN_PASSWORD_LENGTH};
pub use error::AuthError;
pub use gate::{GateDecision, GateWatcher, RouteGate, RouteKind};
pub use identity::{
    IdentityProvider, ProviderMirror, ProviderSnapshot, ProviderUser, PROVIDER_PLACEHOLDER_TOKEN,
};
pub use notify::{LogNotifier, MemoryNotifier, Notice, Notifier};
pub use provider::{Provider, ProviderOptions};
pub use record::SessionRecord;
pub use state::{AuthState, Phase, SessionSource, SessionView};
pub use token::TokenClaims;
pub use verifier::{AcceptAnyVerifier, CredentialVerifier};
