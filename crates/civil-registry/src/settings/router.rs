use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::{AppSettings, SettingsScreen, SettingsStore};
use crate::auth::router::auth_error_response;
use crate::auth::{require_user, AuthProvider};

pub struct SettingsRoutesState<S: ?Sized, A: ?Sized> {
    store: Arc<S>,
    auth: Arc<A>,
}

impl<S: ?Sized, A: ?Sized> Clone for SettingsRoutesState<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            auth: Arc::clone(&self.auth),
        }
    }
}

pub fn settings_router<S, A>(store: Arc<S>, auth: Arc<A>) -> Router
where
    S: SettingsStore + 'static,
    A: AuthProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/settings",
            get(get_handler::<S, A>).put(save_handler::<S, A>),
        )
        .with_state(SettingsRoutesState { store, auth })
}

async fn get_handler<S, A>(
    State(state): State<SettingsRoutesState<S, A>>,
    headers: HeaderMap,
) -> Response
where
    S: SettingsStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    let screen = SettingsScreen::open(state.store);
    (StatusCode::OK, Json(screen.settings().clone())).into_response()
}

async fn save_handler<S, A>(
    State(state): State<SettingsRoutesState<S, A>>,
    headers: HeaderMap,
    Json(settings): Json<AppSettings>,
) -> Response
where
    S: SettingsStore + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    let mut screen = SettingsScreen::open(state.store);
    *screen.settings_mut() = settings;
    match screen.save() {
        Ok(()) => (StatusCode::OK, Json(screen.settings().clone())).into_response(),
        Err(err) => {
            let payload = json!({
                "error": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
