//! Route-level access policy.
//!
//! A policy is an ordered list of rules; the first rule whose method and path
//! pattern match decides what is required. Patterns ending in `/**` match the
//! prefix itself and everything below it; other patterns match exactly.

use thiserror::Error;

use crate::{Principal, Role};

/// Requirement attached to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// No credentials needed.
    Public,
    /// Any authenticated principal.
    Authenticated,
    /// An authenticated principal holding one of the roles.
    AnyRole(Vec<Role>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AccessRule {
    method: Option<&'static str>,
    pattern: &'static str,
    access: Access,
}

impl AccessRule {
    fn matches(&self, method: &str, path: &str) -> bool {
        if let Some(m) = self.method {
            if !m.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        path_matches(self.pattern, path)
    }
}

fn path_matches(pattern: &str, path: &str) -> bool {
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    match pattern.strip_suffix("/**") {
        Some(prefix) => {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
        None => path == pattern,
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: requires one of [{0}]")]
    Forbidden(String),
}

/// Ordered access rules for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn builder() -> AccessPolicyBuilder {
        AccessPolicyBuilder { rules: Vec::new() }
    }

    /// Rules for the hospital service.
    pub fn hospital() -> Self {
        let clinical = vec![Role::Admin, Role::Doctor];
        Self::builder()
            .rule(None, "/health", Access::Public)
            .rule(
                Some("GET"),
                "/api/hospital/**",
                Access::AnyRole(Role::ALL.to_vec()),
            )
            .rule(
                Some("POST"),
                "/api/hospital/tasks",
                Access::AnyRole(clinical.clone()),
            )
            .rule(
                Some("DELETE"),
                "/api/hospital/tasks/**",
                Access::AnyRole(clinical),
            )
            .rule(None, "/api/**", Access::AnyRole(vec![Role::Admin]))
            .build()
    }

    /// Rules for the medication (inventory ledger) service.
    pub fn medication() -> Self {
        Self::builder()
            .rule(None, "/health", Access::Public)
            .rule(
                None,
                "/api/medication/**",
                Access::AnyRole(vec![Role::User, Role::Admin]),
            )
            .rule(None, "/api/**", Access::AnyRole(vec![Role::Admin]))
            .build()
    }

    /// Requirement for a request. Unmatched routes require authentication.
    pub fn requirement(&self, method: &str, path: &str) -> &Access {
        self.rules
            .iter()
            .find(|r| r.matches(method, path))
            .map(|r| &r.access)
            .unwrap_or(&Access::Authenticated)
    }
}

pub struct AccessPolicyBuilder {
    rules: Vec<AccessRule>,
}

impl AccessPolicyBuilder {
    pub fn rule(mut self, method: Option<&'static str>, pattern: &'static str, access: Access) -> Self {
        self.rules.push(AccessRule {
            method,
            pattern,
            access,
        });
        self
    }

    pub fn build(self) -> AccessPolicy {
        AccessPolicy { rules: self.rules }
    }
}

/// Decide whether `principal` (if any) may call `method path`.
///
/// - No IO
/// - No panics
pub fn authorize(
    policy: &AccessPolicy,
    principal: Option<&Principal>,
    method: &str,
    path: &str,
) -> Result<(), AuthzError> {
    match policy.requirement(method, path) {
        Access::Public => Ok(()),
        Access::Authenticated => principal.map(|_| ()).ok_or(AuthzError::Unauthenticated),
        Access::AnyRole(roles) => {
            let principal = principal.ok_or(AuthzError::Unauthenticated)?;
            if principal.has_any_role(roles) {
                Ok(())
            } else {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                Err(AuthzError::Forbidden(names.join(", ")))
            }
        }
    }
}
