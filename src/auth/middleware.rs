// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route gating middleware for Axum.
//!
//! Applied with `route_layer` over a router subtree:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/dashboard", get(views::protected_view))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_session))
//! ```
//!
//! - [`require_session`] guards protected views.
//! - [`redirect_signed_in`] sends signed-in viewers away from entry routes.
//! - [`public_route`] always renders.

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use super::{GateDecision, RouteKind};
use crate::state::AppState;

pub const LOADING_MESSAGE: &str = "Loading your session...";

/// Seconds a client should wait before retrying while the session loads.
const LOADING_RETRY_AFTER_SECS: &str = "1";

/// Placeholder returned while the session is still loading.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoadingPlaceholder {
    pub status: String,
    pub message: String,
}

impl IntoResponse for LoadingPlaceholder {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::SERVICE_UNAVAILABLE, Json(self)).into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static(LOADING_RETRY_AFTER_SECS));
        response
    }
}

fn loading_placeholder() -> LoadingPlaceholder {
    LoadingPlaceholder {
        status: "loading".to_string(),
        message: LOADING_MESSAGE.to_string(),
    }
}

async fn gate(state: AppState, kind: RouteKind, request: Request, next: Next) -> Response {
    let decision = state.gate.decide(kind, &state.session.snapshot());
    debug!(path = %request.uri().path(), ?kind, ?decision, "Gate decision");

    match decision {
        GateDecision::Loading => loading_placeholder().into_response(),
        GateDecision::Redirect(to) => Redirect::temporary(&to).into_response(),
        GateDecision::Render => next.run(request).await,
    }
}

/// Middleware for protected routes.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    gate(state, RouteKind::Protected, request, next).await
}

/// Middleware for sign-in and sign-up routes.
pub async fn redirect_signed_in(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    gate(state, RouteKind::Entry, request, next).await
}

/// Middleware for public routes.
pub async fn public_route(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    gate(state, RouteKind::Public, request, next).await
}
