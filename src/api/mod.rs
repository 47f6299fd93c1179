// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        middleware::{public_route, redirect_signed_in, require_session, LoadingPlaceholder},
        Provider, ProviderOptions, RouteGate, SessionRecord, SessionView,
    },
    state::AppState,
};

pub mod health;
pub mod session;
pub mod views;

/// Dashboard views that require a signed-in viewer.
pub const PROTECTED_ROUTES: &[&str] = &[
    "/dashboard",
    "/portfolio",
    "/wallet-risk",
    "/token-volatility",
    "/hybrid-risk",
    "/smart-contracts",
    "/price-trends",
    "/risk-visualization",
    "/contracts",
    "/contract-scanner",
    "/compliance-checker",
    "/credit-score-nft",
    "/banking-accounts",
    "/privacy",
    "/api-docs",
    "/immersive-dashboard",
];

/// Sign-in and sign-up pages.
pub const ENTRY_ROUTES: &[&str] = &["/sign-in", "/sign-up"];

/// Pages anyone can see.
pub const PUBLIC_ROUTES: &[&str] = &["/"];

/// Routes served behind each gate middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub protected: Vec<String>,
    pub entry: Vec<String>,
    pub public: Vec<String>,
}

impl RouteTable {
    /// Built-in routes plus the gate's configured entry and home routes.
    pub fn for_gate(gate: &RouteGate) -> Self {
        let mut protected: Vec<String> = PROTECTED_ROUTES.iter().map(|r| r.to_string()).collect();
        let mut entry: Vec<String> = ENTRY_ROUTES.iter().map(|r| r.to_string()).collect();

        if !entry.iter().any(|r| r == gate.entry_route()) {
            entry.push(gate.entry_route().to_string());
        }
        if !protected.iter().any(|r| r == gate.home_route()) {
            protected.push(gate.home_route().to_string());
        }
        // A configured entry route takes precedence over a protected one.
        protected.retain(|r| !entry.contains(r));
        let public = PUBLIC_ROUTES
            .iter()
            .map(|r| r.to_string())
            .filter(|r| !entry.contains(r) && !protected.contains(r))
            .collect();

        Self {
            protected,
            entry,
            public,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let table = RouteTable::for_gate(&state.gate);

    let protected_routes = table
        .protected
        .iter()
        .fold(Router::<AppState>::new(), |router, path| {
            router.route(path, get(views::protected_view))
        })
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let entry_routes = table
        .entry
        .iter()
        .fold(Router::<AppState>::new(), |router, path| {
            router.route(path, get(views::entry_view))
        })
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            redirect_signed_in,
        ));

    let public_routes = table
        .public
        .iter()
        .fold(Router::<AppState>::new(), |router, path| {
            router.route(path, get(views::entry_view))
        })
        .route_layer(middleware::from_fn_with_state(state.clone(), public_route));

    let v1_routes = Router::new()
        .route("/session", get(session::get_session))
        .route("/session/login", post(session::login))
        .route(
            "/session/providers/{provider}",
            post(session::login_with_provider),
        )
        .route("/session/logout", post(session::logout));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .merge(protected_routes)
        .merge(entry_routes)
        .merge(public_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        session::get_session,
        session::login,
        session::login_with_provider,
        session::logout
    ),
    components(
        schemas(
            SessionView,
            SessionRecord,
            Provider,
            ProviderOptions,
            session::LoginRequest,
            views::ViewResponse,
            LoadingPlaceholder,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Session", description = "Session restore, login and logout")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header::LOCATION, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{middleware::LOADING_MESSAGE, AuthController};
    use crate::config::SessionConfig;
    use crate::storage::{MemoryStorage, SessionStore};

    fn app_state() -> AppState {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let config = SessionConfig {
            restore_debounce: Duration::ZERO,
            ..SessionConfig::default()
        };
        AppState::new(AuthController::new(store, config), RouteGate::default())
    }

    async fn restored_state() -> AppState {
        let state = app_state();
        state.session.restore_session().await.unwrap();
        state
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        let _ = app.into_make_service();
    }

    #[test]
    fn route_table_includes_configured_routes() {
        let table = RouteTable::for_gate(&RouteGate::new("/login", "/home"));
        assert!(table.entry.contains(&"/login".to_string()));
        assert!(table.protected.contains(&"/home".to_string()));
        assert_eq!(table.protected.len(), PROTECTED_ROUTES.len() + 1);

        let default = RouteTable::for_gate(&RouteGate::default());
        assert_eq!(default.protected.len(), PROTECTED_ROUTES.len());
        assert_eq!(default.entry.len(), ENTRY_ROUTES.len());
        assert_eq!(default.public, vec!["/".to_string()]);
    }

    #[tokio::test]
    async fn landing_page_is_public() {
        let state = app_state();
        let app = router(state.clone());

        let response = send(&app, get_request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["view"], views::LANDING_VIEW);

        state.session.restore_session().await.unwrap();
        let response = send(&app, get_request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);

        state.session.login("a@b.com", "secret1").await.unwrap();
        let response = send(&app, get_request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await.get("user").is_none());
    }

    #[tokio::test]
    async fn protected_route_shows_placeholder_while_loading() {
        let app = router(app_state());
        let response = send(&app, get_request("/portfolio")).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(LOCATION).is_none());
        let body = json_body(response).await;
        assert_eq!(body["message"], LOADING_MESSAGE);
    }

    #[tokio::test]
    async fn protected_routes_redirect_when_signed_out() {
        let app = router(restored_state().await);
        for path in PROTECTED_ROUTES {
            let response = send(&app, get_request(path)).await;
            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
            assert_eq!(response.headers().get(LOCATION).unwrap(), "/sign-in");
        }
    }

    #[tokio::test]
    async fn login_then_render_dashboard() {
        let app = router(restored_state().await);

        let response = send(
            &app,
            post_json(
                "/v1/session/login",
                json!({"email": "a@b.com", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = json_body(response).await;
        assert_eq!(session["authenticated"], true);
        assert_eq!(session["loading"], false);
        assert_eq!(session["user"]["email"], "a@b.com");

        let response = send(&app, get_request("/wallet-risk")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["view"], "wallet-risk");
        assert_eq!(body["user"]["email"], "a@b.com");
    }

    #[tokio::test]
    async fn entry_routes_redirect_signed_in_viewers() {
        let state = restored_state().await;
        let app = router(state.clone());

        let response = send(&app, get_request("/sign-in")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["view"], "sign-in");

        state.session.login("a@b.com", "secret1").await.unwrap();
        for path in ENTRY_ROUTES {
            let response = send(&app, get_request(path)).await;
            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(response.headers().get(LOCATION).unwrap(), "/dashboard");
        }
    }

    #[tokio::test]
    async fn invalid_login_is_bad_request() {
        let app = router(restored_state().await);
        let response = send(
            &app,
            post_json(
                "/v1/session/login",
                json!({"email": "a@b.com", "password": "123"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Password must be at least 6 characters");
        assert_eq!(body["error_code"], "validation_error");

        let session = json_body(send(&app, get_request("/v1/session")).await).await;
        assert_eq!(
            session["lastError"],
            "Password must be at least 6 characters"
        );
    }

    #[tokio::test]
    async fn unsupported_provider_is_bad_request() {
        let app = router(restored_state().await);
        let response = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/v1/session/providers/myspace")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error_code"],
            "unsupported_provider"
        );
    }

    #[tokio::test]
    async fn wallet_login_then_logout() {
        let app = router(restored_state().await);

        let response = send(
            &app,
            post_json(
                "/v1/session/providers/wallet",
                json!({"address": "0xABCDEF1234567890"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = json_body(response).await;
        assert_eq!(session["user"]["id"], "wallet-0xabcdef1234567890");
        assert_eq!(session["user"]["provider"], "wallet");

        let response = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/v1/session/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = json_body(response).await;
        assert_eq!(session["authenticated"], false);
        assert!(session.get("user").is_none());

        let response = send(&app, get_request("/dashboard")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn health_reports_storage_and_session() {
        let app = router(app_state());
        let response = send(&app, get_request("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["storage"], "ok");
        assert_eq!(body["checks"]["session"], "idle");

        let response = send(&app, get_request("/health/live")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = router(app_state());
        let response = send(&app, get_request("/api-doc/openapi.json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/v1/session/login"].is_object());
    }
}
