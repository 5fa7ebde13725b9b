use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use super::{ManagedUser, UserDirectory, UserError, UserForm};
use crate::auth::memory::MIN_PASSWORD_LEN;

struct Entry {
    user: ManagedUser,
    password: String,
}

/// Directory kept in insertion order, for local runs and tests.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    entries: Mutex<Vec<Entry>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory seeded with existing accounts. Their passwords start empty.
    pub fn with_users(users: impl IntoIterator<Item = ManagedUser>) -> Self {
        let entries = users
            .into_iter()
            .map(|user| Entry {
                user,
                password: String::new(),
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn required_email(form: &UserForm) -> Result<String, UserError> {
    let email = form.email.trim();
    if email.is_empty() {
        return Err(UserError::MissingEmail);
    }
    Ok(email.to_string())
}

fn check_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::WeakPassword(MIN_PASSWORD_LEN));
    }
    Ok(())
}

fn email_taken(entries: &[Entry], email: &str, except_uid: Option<&str>) -> bool {
    entries.iter().any(|entry| {
        entry.user.email.eq_ignore_ascii_case(email) && Some(entry.user.uid.as_str()) != except_uid
    })
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn list(&self) -> Result<Vec<ManagedUser>, UserError> {
        Ok(self.entries().iter().map(|entry| entry.user.clone()).collect())
    }

    async fn create(&self, form: &UserForm) -> Result<ManagedUser, UserError> {
        let email = required_email(form)?;
        check_password(&form.password)?;
        let mut entries = self.entries();
        if email_taken(&entries, &email, None) {
            return Err(UserError::EmailInUse(email));
        }
        let user = ManagedUser {
            uid: Uuid::new_v4().simple().to_string(),
            email,
            display_name: form.display_name.trim().to_string(),
            role: form.role,
            status: form.status,
            last_login: None,
        };
        entries.push(Entry {
            user: user.clone(),
            password: form.password.clone(),
        });
        Ok(user)
    }

    async fn update(&self, uid: &str, form: &UserForm) -> Result<ManagedUser, UserError> {
        let email = required_email(form)?;
        if !form.password.is_empty() {
            check_password(&form.password)?;
        }
        let mut entries = self.entries();
        let index = entries
            .iter()
            .position(|entry| entry.user.uid == uid)
            .ok_or_else(|| UserError::NotFound(uid.to_string()))?;
        if email_taken(&entries, &email, Some(uid)) {
            return Err(UserError::EmailInUse(email));
        }
        let entry = &mut entries[index];
        entry.user.email = email;
        entry.user.display_name = form.display_name.trim().to_string();
        entry.user.role = form.role;
        entry.user.status = form.status;
        if !form.password.is_empty() {
            entry.password = form.password.clone();
        }
        Ok(entry.user.clone())
    }

    async fn delete(&self, uid: &str) -> Result<(), UserError> {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| entry.user.uid != uid);
        if entries.len() == before {
            return Err(UserError::NotFound(uid.to_string()));
        }
        Ok(())
    }
}
