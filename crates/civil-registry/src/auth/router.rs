use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::{
    bearer_token, require_user, AuthError, AuthFlow, AuthProvider, AuthSession, AuthUser,
    SignInRequest, SignUpRequest,
};

/// Sign-in, registration and session endpoints.
///
/// Sign-in and sign-up answer with an [`AuthSession`]; later requests carry its token as
/// `Authorization: Bearer <token>`.
pub fn auth_router<A>(provider: Arc<A>) -> Router
where
    A: AuthProvider + 'static,
{
    Router::new()
        .route("/api/v1/auth/sign-in", post(sign_in_handler::<A>))
        .route("/api/v1/auth/sign-up", post(sign_up_handler::<A>))
        .route("/api/v1/auth/sign-out", post(sign_out_handler::<A>))
        .route("/api/v1/auth/me", get(me_handler::<A>))
        .with_state(provider)
}

async fn open_session<A>(provider: &A, user: AuthUser) -> Result<AuthSession, AuthError>
where
    A: AuthProvider + ?Sized,
{
    let token = provider.issue_token(&user).await?;
    Ok(AuthSession { token, user })
}

pub(crate) async fn sign_in_handler<A>(
    State(provider): State<Arc<A>>,
    Json(request): Json<SignInRequest>,
) -> Response
where
    A: AuthProvider + 'static,
{
    let session = match AuthFlow::new(provider.clone()).sign_in(&request).await {
        Ok(user) => open_session(provider.as_ref(), user).await,
        Err(err) => Err(err),
    };
    match session {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => auth_error_response(&err),
    }
}

pub(crate) async fn sign_up_handler<A>(
    State(provider): State<Arc<A>>,
    Json(request): Json<SignUpRequest>,
) -> Response
where
    A: AuthProvider + 'static,
{
    let session = match AuthFlow::new(provider.clone()).sign_up(&request).await {
        Ok(user) => open_session(provider.as_ref(), user).await,
        Err(err) => Err(err),
    };
    match session {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(err) => auth_error_response(&err),
    }
}

/// Revokes the caller's token. Other clients stay signed in.
pub(crate) async fn sign_out_handler<A>(
    State(provider): State<Arc<A>>,
    headers: HeaderMap,
) -> Response
where
    A: AuthProvider + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return auth_error_response(&AuthError::NotSignedIn);
    };
    match provider.revoke_token(token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => auth_error_response(&err),
    }
}

pub(crate) async fn me_handler<A>(State(provider): State<Arc<A>>, headers: HeaderMap) -> Response
where
    A: AuthProvider + 'static,
{
    match require_user(provider.as_ref(), &headers).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => auth_error_response(&err),
    }
}

pub(crate) fn auth_error_response(error: &AuthError) -> Response {
    let status = match error {
        AuthError::PasswordMismatch | AuthError::MissingEmail | AuthError::WeakPassword(_) => {
            StatusCode::BAD_REQUEST
        }
        AuthError::InvalidCredentials | AuthError::NotSignedIn => StatusCode::UNAUTHORIZED,
        AuthError::EmailInUse(_) => StatusCode::CONFLICT,
        AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
