use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{filter_users, ManagedUser, UserDirectory, UserError, UserFilter, UserForm};
use crate::auth::router::auth_error_response;
use crate::auth::{require_user, AuthProvider};
use crate::error::AppError;

pub struct UserRoutesState<D: ?Sized, A: ?Sized> {
    directory: Arc<D>,
    auth: Arc<A>,
}

impl<D: ?Sized, A: ?Sized> Clone for UserRoutesState<D, A> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<D: ?Sized, A: ?Sized> UserRoutesState<D, A> {
    pub fn new(directory: Arc<D>, auth: Arc<A>) -> Self {
        Self { directory, auth }
    }
}

/// Account administration endpoints, gated on a bearer token like the rest of the API.
pub fn users_router<D, A>(state: UserRoutesState<D, A>) -> Router
where
    D: UserDirectory + 'static,
    A: AuthProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/users",
            get(list_handler::<D, A>).post(create_handler::<D, A>),
        )
        .route(
            "/api/v1/users/:uid",
            put(update_handler::<D, A>).delete(delete_handler::<D, A>),
        )
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserQuery {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub(crate) async fn list_handler<D, A>(
    State(state): State<UserRoutesState<D, A>>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Response
where
    D: UserDirectory + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    let filter = match UserFilter::parse(
        query.search.as_deref(),
        query.role.as_deref(),
        query.status.as_deref(),
    ) {
        Ok(filter) => filter,
        Err(err) => return user_error_response(err),
    };
    match state.directory.list().await {
        Ok(users) => {
            let listed: Vec<ManagedUser> =
                filter_users(&users, &filter).into_iter().cloned().collect();
            (StatusCode::OK, Json(listed)).into_response()
        }
        Err(err) => user_error_response(err),
    }
}

pub(crate) async fn create_handler<D, A>(
    State(state): State<UserRoutesState<D, A>>,
    headers: HeaderMap,
    Json(form): Json<UserForm>,
) -> Response
where
    D: UserDirectory + 'static,
    A: AuthProvider + 'static,
{
    let operator = match require_user(state.auth.as_ref(), &headers).await {
        Ok(user) => user,
        Err(err) => return auth_error_response(&err),
    };
    match state.directory.create(&form).await {
        Ok(user) => {
            info!(uid = %user.uid, by = %operator.uid, "user account created");
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Err(err) => user_error_response(err),
    }
}

pub(crate) async fn update_handler<D, A>(
    State(state): State<UserRoutesState<D, A>>,
    headers: HeaderMap,
    Path(uid): Path<String>,
    Json(form): Json<UserForm>,
) -> Response
where
    D: UserDirectory + 'static,
    A: AuthProvider + 'static,
{
    if let Err(err) = require_user(state.auth.as_ref(), &headers).await {
        return auth_error_response(&err);
    }
    match state.directory.update(&uid, &form).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => user_error_response(err),
    }
}

pub(crate) async fn delete_handler<D, A>(
    State(state): State<UserRoutesState<D, A>>,
    headers: HeaderMap,
    Path(uid): Path<String>,
) -> Response
where
    D: UserDirectory + 'static,
    A: AuthProvider + 'static,
{
    let operator = match require_user(state.auth.as_ref(), &headers).await {
        Ok(user) => user,
        Err(err) => return auth_error_response(&err),
    };
    match state.directory.delete(&uid).await {
        Ok(()) => {
            info!(%uid, by = %operator.uid, "user account deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => user_error_response(err),
    }
}

fn user_error_response(error: UserError) -> Response {
    AppError::from(error).into_response()
}
