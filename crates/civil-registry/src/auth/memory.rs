use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use super::{AuthError, AuthProvider, AuthUser};

pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: String,
    password: String,
}

/// Account registry for local runs and tests.
///
/// `session` is the in-process signed-in user watched by interactive flows. HTTP callers
/// are identified by bearer tokens kept in `tokens`.
pub struct InMemoryAuthProvider {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, AuthUser>>,
    session: watch::Sender<Option<AuthUser>>,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            session: watch::channel(None).0,
        }
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self) -> MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<String, AuthUser>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn account_key(email: &str) -> String {
    email.to_ascii_lowercase()
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = {
            let accounts = self.accounts();
            let account = accounts
                .get(&account_key(email))
                .filter(|account| account.password == password)
                .ok_or(AuthError::InvalidCredentials)?;
            AuthUser {
                uid: account.uid.clone(),
                email: email.to_string(),
            }
        };
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }
        let user = {
            let mut accounts = self.accounts();
            let key = account_key(email);
            if accounts.contains_key(&key) {
                return Err(AuthError::EmailInUse(email.to_string()));
            }
            let uid = Uuid::new_v4().simple().to_string();
            accounts.insert(
                key,
                Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                },
            );
            AuthUser {
                uid,
                email: email.to_string(),
            }
        };
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.send_replace(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }

    async fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        let token = Uuid::new_v4().to_string();
        self.tokens().insert(token.clone(), user.clone());
        Ok(token)
    }

    async fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.tokens()
            .get(token)
            .cloned()
            .ok_or(AuthError::NotSignedIn)
    }

    async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        self.tokens().remove(token);
        Ok(())
    }
}
