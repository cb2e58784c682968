//! Configuration loading and representation.
//!
//! Each binary reads its configuration once at startup. Values come from the
//! process environment; `.env` seeding happens in the binaries before this runs.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

const DEV_ADMIN_USERNAME: &str = "admin";
const DEV_ADMIN_PASSWORD: &str = "admin";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Credentials of the account created at startup when absent.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    /// `true` when the insecure development defaults are in effect.
    pub is_dev_default: bool,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("is_dev_default", &self.is_dev_default)
            .finish_non_exhaustive()
    }
}

/// Settings of the medication (inventory ledger) service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub admin: BootstrapAdmin,
}

/// How the hospital service reaches the inventory ledger.
#[derive(Clone, PartialEq, Eq)]
pub struct InventoryClientConfig {
    /// Collection URL, e.g. `http://localhost:8081/api/medication`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Option<Duration>,
}

impl core::fmt::Debug for InventoryClientConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Settings of the hospital service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HospitalConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub admin: BootstrapAdmin,
    pub inventory: InventoryClientConfig,
}

impl MedicationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: bind_addr(&lookup, "MEDICATION_BIND_ADDR", "0.0.0.0:8081")?,
            database_url: non_empty(&lookup, "DATABASE_URL"),
            admin: admin(&lookup, "MEDICATION_ADMIN_USERNAME", "MEDICATION_ADMIN_PASSWORD"),
        })
    }
}

impl HospitalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = non_empty(&lookup, "MEDICATION_API_URL")
            .ok_or(ConfigError::Missing("MEDICATION_API_URL"))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "MEDICATION_API_URL",
                reason: "expected an http(s) URL".into(),
            });
        }

        let timeout = match non_empty(&lookup, "MEDICATION_API_TIMEOUT_SECS") {
            None => None,
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| ConfigError::Invalid {
                    var: "MEDICATION_API_TIMEOUT_SECS",
                    reason: format!("{e}"),
                })?;
                Some(Duration::from_secs(secs))
            }
        };

        let admin = admin(&lookup, "HOSPITAL_ADMIN_USERNAME", "HOSPITAL_ADMIN_PASSWORD");
        let inventory = InventoryClientConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: non_empty(&lookup, "MEDICATION_API_USERNAME")
                .unwrap_or_else(|| DEV_ADMIN_USERNAME.to_string()),
            password: non_empty(&lookup, "MEDICATION_API_PASSWORD")
                .unwrap_or_else(|| DEV_ADMIN_PASSWORD.to_string()),
            timeout,
        };

        Ok(Self {
            bind_addr: bind_addr(&lookup, "HOSPITAL_BIND_ADDR", "0.0.0.0:8080")?,
            database_url: non_empty(&lookup, "DATABASE_URL"),
            admin,
            inventory,
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<String> {
    lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn bind_addr(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<SocketAddr, ConfigError> {
    let raw = non_empty(lookup, var).unwrap_or_else(|| default.to_string());
    raw.parse().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{e}"),
    })
}

fn admin(
    lookup: &impl Fn(&str) -> Option<String>,
    username_var: &str,
    password_var: &str,
) -> BootstrapAdmin {
    let username = non_empty(lookup, username_var);
    let password = non_empty(lookup, password_var);
    let is_dev_default = username.is_none() || password.is_none();
    BootstrapAdmin {
        username: username.unwrap_or_else(|| DEV_ADMIN_USERNAME.to_string()),
        password: password.unwrap_or_else(|| DEV_ADMIN_PASSWORD.to_string()),
        is_dev_default,
    }
}
