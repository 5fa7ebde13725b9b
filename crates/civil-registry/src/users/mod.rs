//! Operator accounts administered from the back office: roles, statuses, the filtered
//! list and the create/edit/delete screen over a [`UserDirectory`].

pub mod memory;
pub mod router;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::declarations::prompts::{Confirm, Notifier};

pub use memory::InMemoryUserDirectory;
pub use router::{users_router, UserRoutesState};

pub const DELETE_CONFIRMATION: &str = "Êtes-vous sûr de vouloir supprimer cet utilisateur ?";
pub const LOAD_FAILED: &str = "Impossible de charger les utilisateurs. Vérifiez votre connexion.";
pub const DELETE_FAILED: &str = "Impossible de supprimer l'utilisateur.";
pub const CREATE_FAILED: &str = "Impossible de créer l'utilisateur.";
pub const UPDATE_FAILED: &str = "Impossible de mettre à jour l'utilisateur.";
pub const NEVER_LOGGED_IN: &str = "Jamais";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Moderator,
    #[default]
    User,
}

impl UserRole {
    pub fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "Administrateur",
            UserRole::Moderator => "Modérateur",
            UserRole::User => "Utilisateur",
        }
    }
}

impl FromStr for UserRole {
    type Err = UserError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(UserRole::Admin),
            "moderator" => Ok(UserRole::Moderator),
            "user" => Ok(UserRole::User),
            other => Err(UserError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn label(self) -> &'static str {
        match self {
            UserStatus::Active => "Actif",
            UserStatus::Inactive => "Inactif",
            UserStatus::Suspended => "Suspendu",
        }
    }
}

impl FromStr for UserStatus {
    type Err = UserError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            "suspended" => Ok(UserStatus::Suspended),
            other => Err(UserError::UnknownStatus(other.to_string())),
        }
    }
}

/// Account as listed in the directory. Passwords never leave the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl ManagedUser {
    pub fn last_login_label(&self) -> String {
        match self.last_login {
            Some(at) => at.format("%d/%m/%Y %H:%M").to_string(),
            None => NEVER_LOGGED_IN.to_string(),
        }
    }
}

/// Create/edit form. A blank password on edit keeps the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserForm {
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub password: String,
    pub status: UserStatus,
}

impl UserForm {
    /// Form prefilled from an existing account, password left blank.
    pub fn edit(user: &ManagedUser) -> Self {
        Self {
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            password: String::new(),
            status: user.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("email is required")]
    MissingEmail,
    #[error("password must be at least {0} characters")]
    WeakPassword(usize),
    #[error("email already in use: {0}")]
    EmailInUse(String),
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown status: {0}")]
    UnknownStatus(String),
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list(&self) -> Result<Vec<ManagedUser>, UserError>;
    async fn create(&self, form: &UserForm) -> Result<ManagedUser, UserError>;
    async fn update(&self, uid: &str, form: &UserForm) -> Result<ManagedUser, UserError>;
    async fn delete(&self, uid: &str) -> Result<(), UserError>;
}

/// `None` on a role or status means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub search: String,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UserFilter {
    /// Builds a filter from query values, where `"all"` or an absent value disables a facet.
    pub fn parse(
        search: Option<&str>,
        role: Option<&str>,
        status: Option<&str>,
    ) -> Result<Self, UserError> {
        let role = match role {
            None | Some("all") => None,
            Some(value) => Some(value.parse()?),
        };
        let status = match status {
            None | Some("all") => None,
            Some(value) => Some(value.parse()?),
        };
        Ok(Self {
            search: search.unwrap_or_default().to_string(),
            role,
            status,
        })
    }

    pub fn matches(&self, user: &ManagedUser) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = needle.is_empty()
            || user.display_name.to_lowercase().contains(&needle)
            || user.email.to_lowercase().contains(&needle);
        matches_search
            && self.role.map_or(true, |role| user.role == role)
            && self.status.map_or(true, |status| user.status == status)
    }
}

pub fn filter_users<'a>(users: &'a [ManagedUser], filter: &UserFilter) -> Vec<&'a ManagedUser> {
    users.iter().filter(|user| filter.matches(user)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Cancelled,
    Removed,
    Failed(String),
}

/// User management screen: the loaded list, its filter and the last error banner.
pub struct UserManagement<D: ?Sized> {
    directory: Arc<D>,
    users: Vec<ManagedUser>,
    filter: UserFilter,
    error: Option<String>,
}

impl<D> UserManagement<D>
where
    D: UserDirectory + ?Sized,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            directory,
            users: Vec::new(),
            filter: UserFilter::default(),
            error: None,
        }
    }

    pub async fn load(&mut self) {
        match self.directory.list().await {
            Ok(users) => {
                self.users = users;
                self.error = None;
            }
            Err(err) => {
                warn!(error = %err, "user directory could not be listed");
                self.error = Some(LOAD_FAILED.to_string());
            }
        }
    }

    pub fn users(&self) -> &[ManagedUser] {
        &self.users
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filter_mut(&mut self) -> &mut UserFilter {
        &mut self.filter
    }

    pub fn filtered(&self) -> Vec<&ManagedUser> {
        filter_users(&self.users, &self.filter)
    }

    /// Create an account and append it to the list.
    pub async fn create<N>(&mut self, form: &UserForm, notifier: &N) -> Result<(), UserError>
    where
        N: Notifier + ?Sized,
    {
        match self.directory.create(form).await {
            Ok(user) => {
                info!(uid = %user.uid, "user account created");
                self.users.push(user);
                Ok(())
            }
            Err(err) => {
                self.fail(CREATE_FAILED, &err, notifier);
                Err(err)
            }
        }
    }

    /// Update an account and replace it in place.
    pub async fn update<N>(
        &mut self,
        uid: &str,
        form: &UserForm,
        notifier: &N,
    ) -> Result<(), UserError>
    where
        N: Notifier + ?Sized,
    {
        match self.directory.update(uid, form).await {
            Ok(updated) => {
                if let Some(slot) = self.users.iter_mut().find(|user| user.uid == updated.uid) {
                    *slot = updated;
                }
                Ok(())
            }
            Err(err) => {
                self.fail(UPDATE_FAILED, &err, notifier);
                Err(err)
            }
        }
    }

    /// Confirm, delete, then drop the account from the list.
    pub async fn delete<C, N>(&mut self, uid: &str, confirm: &C, notifier: &N) -> RemoveOutcome
    where
        C: Confirm + ?Sized,
        N: Notifier + ?Sized,
    {
        if !confirm.confirm(DELETE_CONFIRMATION) {
            return RemoveOutcome::Cancelled;
        }
        match self.directory.delete(uid).await {
            Ok(()) => {
                self.users.retain(|user| user.uid != uid);
                RemoveOutcome::Removed
            }
            Err(err) => {
                self.fail(DELETE_FAILED, &err, notifier);
                RemoveOutcome::Failed(DELETE_FAILED.to_string())
            }
        }
    }

    fn fail<N>(&mut self, message: &str, err: &UserError, notifier: &N)
    where
        N: Notifier + ?Sized,
    {
        warn!(error = %err, "{message}");
        self.error = Some(message.to_string());
        notifier.notify(message);
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
