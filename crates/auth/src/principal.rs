use medward_core::UserId;

use crate::{Role, UserAccount};

/// An authenticated caller, resolved from credentials for a single request.
///
/// Department membership is not part of the principal: it is looked up from the
/// directory when a department-scoped operation needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

impl From<&UserAccount> for Principal {
    fn from(account: &UserAccount) -> Self {
        Self::new(account.id, account.username.clone(), account.role)
    }
}
