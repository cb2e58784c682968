//! `medward-auth` — authentication/authorization boundary shared by both services.
//!
//! This crate is intentionally decoupled from HTTP frameworks and storage: it
//! knows how to hash and check passwords, parse basic credentials, and decide
//! whether a principal may call a route.

pub mod authorize;
pub mod credentials;
pub mod password;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{Access, AccessPolicy, AuthzError, authorize};
pub use credentials::{BasicCredentials, CredentialsError};
pub use password::PasswordHash;
pub use principal::Principal;
pub use roles::Role;
pub use user::{Credentials, UserAccount};
