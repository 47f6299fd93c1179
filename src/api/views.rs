// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Placeholder dashboard views.
//!
//! The views themselves are rendered client-side; the shell only answers
//! with the view name and the signed-in user once the gate lets a request
//! through.

use axum::{extract::State, http::Uri, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::SessionRecord;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewResponse {
    pub view: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionRecord>,
}

/// View served at the site root.
pub const LANDING_VIEW: &str = "landing";

fn view_name(uri: &Uri) -> String {
    match uri.path().trim_matches('/') {
        "" => LANDING_VIEW.to_string(),
        path => path.to_string(),
    }
}

pub async fn protected_view(State(state): State<AppState>, uri: Uri) -> Json<ViewResponse> {
    Json(ViewResponse {
        view: view_name(&uri),
        user: state.session.snapshot().user,
    })
}

/// Entry and public views never carry a user.
pub async fn entry_view(uri: Uri) -> Json<ViewResponse> {
    Json(ViewResponse {
        view: view_name(&uri),
        user: None,
    })
}
