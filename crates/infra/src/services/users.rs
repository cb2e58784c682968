//! User directory shared by both services.
//!
//! Besides CRUD it resolves basic credentials to a [`Principal`] and seeds the
//! bootstrap admin. The hospital service attaches its department repository so
//! that account removal also drops memberships and lookups can report them.

use std::sync::Arc;

use tracing::instrument;

use medward_auth::{BasicCredentials, Credentials, Principal, Role, UserAccount};
use medward_core::{DomainError, DomainResult, Resource, UserId};
use medward_hospital::Department;

use crate::config::BootstrapAdmin;
use crate::repositories::{DepartmentRepository, UserRepository};

#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
    departments: Option<Arc<dyn DepartmentRepository>>,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            departments: None,
        }
    }

    pub fn with_departments(
        users: Arc<dyn UserRepository>,
        departments: Arc<dyn DepartmentRepository>,
    ) -> Self {
        Self {
            users,
            departments: Some(departments),
        }
    }

    pub async fn list(&self) -> DomainResult<Vec<UserAccount>> {
        self.users.list().await
    }

    pub async fn get_by_username(&self, username: &str) -> DomainResult<UserAccount> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::not_found(Resource::User))
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username, role = %credentials.role), err)]
    pub async fn create(&self, credentials: Credentials) -> DomainResult<UserAccount> {
        if self.users.find_by_username(&credentials.username).await?.is_some() {
            return Err(DomainError::already_exists(Resource::User));
        }
        let account = credentials.into_account();
        self.users.insert(&account).await?;
        Ok(account)
    }

    /// Replace the credentials of `username`, creating the account if absent.
    ///
    /// Renaming onto a username that belongs to another account fails with
    /// `AlreadyExists(User)`.
    #[instrument(skip(self, credentials), fields(new_username = %credentials.username), err)]
    pub async fn update(&self, username: &str, credentials: Credentials) -> DomainResult<UserAccount> {
        let Some(mut account) = self.users.find_by_username(username).await? else {
            return self.create(credentials).await;
        };

        if let Some(other) = self.users.find_by_username(&credentials.username).await? {
            if other.id != account.id {
                return Err(DomainError::already_exists(Resource::User));
            }
        }

        let fresh = credentials.into_account();
        account.username = fresh.username;
        account.password_hash = fresh.password_hash;
        account.role = fresh.role;
        self.users.update(&account).await?;
        Ok(account)
    }

    /// Idempotent: removing an unknown username succeeds.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, username: &str) -> DomainResult<()> {
        let Some(account) = self.users.find_by_username(username).await? else {
            return Ok(());
        };
        if let Some(departments) = &self.departments {
            departments.detach_user(account.id).await?;
        }
        self.users.delete(account.id).await?;
        Ok(())
    }

    /// Departments the user belongs to (always empty without a department store).
    pub async fn departments_of(&self, user: UserId) -> DomainResult<Vec<Department>> {
        match &self.departments {
            Some(departments) => departments.departments_of(user).await,
            None => Ok(Vec::new()),
        }
    }

    /// Check basic credentials against the store.
    ///
    /// `Ok(None)` means unknown user or wrong password; the two are not told apart.
    pub async fn authenticate(&self, credentials: &BasicCredentials) -> DomainResult<Option<Principal>> {
        let account = self.users.find_by_username(&credentials.username).await?;
        Ok(account
            .filter(|a| a.check_password(&credentials.password))
            .map(|a| Principal::from(&a)))
    }

    /// Create the admin account if no account has its username yet.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> DomainResult<bool> {
        if admin.is_dev_default {
            tracing::warn!(
                username = %admin.username,
                "bootstrap admin credentials not set; using insecure dev default"
            );
        }
        if self.users.find_by_username(&admin.username).await?.is_some() {
            return Ok(false);
        }
        let account = UserAccount::register(admin.username.clone(), &admin.password, Role::Admin);
        self.users.insert(&account).await?;
        tracing::info!(username = %account.username, "bootstrap admin created");
        Ok(true)
    }
}
