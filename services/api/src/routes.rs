use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json, Router};
use civil_registry::auth::{auth_router, AuthProvider};
use civil_registry::declarations::{
    declaration_router, DeclarationRoutesState, DeclarationStore, TextCertificateRenderer,
};
use civil_registry::settings::{settings_router, SettingsStore};
use civil_registry::users::{users_router, UserDirectory, UserRoutesState};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn app_router<S, A, P, D>(
    store: Arc<S>,
    auth: Arc<A>,
    settings: Arc<P>,
    users: Arc<D>,
) -> Router
where
    S: DeclarationStore + 'static,
    A: AuthProvider + 'static,
    P: SettingsStore + 'static,
    D: UserDirectory + 'static,
{
    let declarations = DeclarationRoutesState::new(
        store,
        Arc::clone(&auth),
        Arc::new(TextCertificateRenderer),
    );

    declaration_router(declarations)
        .merge(auth_router(Arc::clone(&auth)))
        .merge(settings_router(settings, Arc::clone(&auth)))
        .merge(users_router(UserRoutesState::new(users, auth)))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
