//! User accounts (identity records) shared by both services.

use medward_core::{DomainResult, Entity, FieldErrors, UserId};

use crate::{PasswordHash, Role};

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub password_hash: PasswordHash,
    pub role: Role,
}

impl UserAccount {
    /// Build a fresh account, hashing the plaintext password.
    pub fn register(username: impl Into<String>, password: &str, role: Role) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            password_hash: PasswordHash::generate(password),
            role,
        }
    }

    pub fn check_password(&self, password: &str) -> bool {
        self.password_hash.verify(password)
    }
}

impl Entity for UserAccount {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Validated credentials for creating or updating an account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Credentials {
    /// Validate raw input.
    ///
    /// `role` is `None` when the service forces the role itself; `default_role`
    /// is used in that case.
    pub fn parse(
        username: &str,
        password: &str,
        role: Option<&str>,
        default_role: Role,
    ) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        let username = username.trim();
        if username.is_empty() {
            errors.add("username", "must not be blank");
        } else if username.len() > 64 {
            errors.add("username", "must be at most 64 characters");
        }
        if password.is_empty() {
            errors.add("password", "must not be blank");
        }

        let role = match role {
            None => Some(default_role),
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(msg) => {
                    errors.add("role", msg);
                    None
                }
            },
        };

        errors.into_result()?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            role: role.unwrap_or(default_role),
        })
    }

    pub fn into_account(self) -> UserAccount {
        UserAccount::register(self.username, &self.password, self.role)
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medward_core::DomainError;

    #[test]
    fn parse_uses_default_role_when_forced() {
        let creds = Credentials::parse(" nurse ", "pw", None, Role::User).unwrap();
        assert_eq!(creds.username, "nurse");
        assert_eq!(creds.role, Role::User);
    }

    #[test]
    fn parse_reports_every_bad_field() {
        let err = Credentials::parse("", "", Some("ROLE_SURGEON"), Role::User).unwrap_err();
        let DomainError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.get("username").is_some());
        assert!(fields.get("password").is_some());
        assert!(fields.get("role").unwrap().contains("ROLE_SURGEON"));
    }

    #[test]
    fn registered_account_checks_password() {
        let account = Credentials::parse("doc", "1234", Some("ROLE_DOCTOR"), Role::User)
            .unwrap()
            .into_account();
        assert_eq!(account.role, Role::Doctor);
        assert!(account.check_password("1234"));
        assert!(!account.check_password("4321"));
    }
}
