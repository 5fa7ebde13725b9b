//! Email/password authentication against an external provider, plus the signed-in
//! gate used by the declaration routes.

pub mod memory;
pub mod router;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

pub use memory::InMemoryAuthProvider;
pub use router::auth_router;

/// Identity of the signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Les mots de passe ne correspondent pas.")]
    PasswordMismatch,
    #[error("email address is required")]
    MissingEmail,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account already exists for {0}")]
    EmailInUse(String),
    #[error("password must be at least {0} characters long")]
    WeakPassword(usize),
    #[error("no user is signed in")]
    NotSignedIn,
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// Signed-in user plus the bearer token that identifies them on later requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

/// External auth service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    /// Create an account; the new user is signed in on success.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    fn current_user(&self) -> Option<AuthUser>;
    /// Current-user change notifications.
    fn watch(&self) -> watch::Receiver<Option<AuthUser>>;

    /// Issue a bearer token for `user`, valid until revoked.
    async fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError>;
    /// User a token was issued to; `NotSignedIn` for unknown or revoked tokens.
    async fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError>;
    async fn revoke_token(&self, token: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Sign-in and registration forms in front of an [`AuthProvider`].
pub struct AuthFlow<A: ?Sized> {
    provider: Arc<A>,
}

impl<A> AuthFlow<A>
where
    A: AuthProvider + ?Sized,
{
    pub fn new(provider: Arc<A>) -> Self {
        Self { provider }
    }

    pub async fn sign_in(&self, request: &SignInRequest) -> Result<AuthUser, AuthError> {
        let email = normalized_email(&request.email)?;
        let user = self.provider.sign_in(email, &request.password).await?;
        info!(uid = %user.uid, "operator signed in");
        Ok(user)
    }

    /// Register a new account. The confirmation is checked before the provider is called.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthUser, AuthError> {
        if request.password != request.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        let email = normalized_email(&request.email)?;
        let user = self.provider.sign_up(email, &request.password).await?;
        info!(uid = %user.uid, "operator account created");
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// User behind the request's bearer token, or `NotSignedIn`.
pub async fn require_user<A>(provider: &A, headers: &HeaderMap) -> Result<AuthUser, AuthError>
where
    A: AuthProvider + ?Sized,
{
    let token = bearer_token(headers).ok_or(AuthError::NotSignedIn)?;
    provider.verify_token(token).await
}

fn normalized_email(email: &str) -> Result<&str, AuthError> {
    let email = email.trim();
    if email.is_empty() {
        Err(AuthError::MissingEmail)
    } else {
        Ok(email)
    }
}
