use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role granted to a user account.
///
/// Serialized with the `ROLE_` prefix used on the wire and in storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_DOCTOR")]
    Doctor,
    #[serde(rename = "ROLE_USER")]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::Doctor => "ROLE_DOCTOR",
            Role::User => "ROLE_USER",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_ADMIN" => Ok(Role::Admin),
            "ROLE_DOCTOR" => Ok(Role::Doctor),
            "ROLE_USER" => Ok(Role::User),
            other => Err(format!(
                "unknown role '{other}' (expected ROLE_ADMIN, ROLE_DOCTOR or ROLE_USER)"
            )),
        }
    }
}
