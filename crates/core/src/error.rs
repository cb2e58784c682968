//! Domain error model.
//!
//! Every failure a caller can observe is one variant of [`DomainError`]. Each
//! variant knows its HTTP status, numeric [`ErrorCode`] and [`MessageKey`]; the
//! HTTP layer consults this table in exactly one place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::code::{ErrorCode, MessageKey};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Kind of record a not-found / already-exists failure refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    User,
    Department,
    Task,
    Medication,
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Resource::User => f.write_str("user"),
            Resource::Department => f.write_str("department"),
            Resource::Task => f.write_str("task"),
            Resource::Medication => f.write_str("medication"),
        }
    }
}

/// Failure reported by the remote inventory ledger, as seen by the hospital service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryFailure {
    /// 400: e.g. insufficient quantity.
    #[error("inventory rejected the adjustment")]
    BadRequest,
    /// 401: the configured client credentials were rejected.
    #[error("inventory rejected client credentials")]
    Unauthorized,
    /// 403
    #[error("inventory denied access")]
    Forbidden,
    /// 404: unknown medication id.
    #[error("inventory has no such medication")]
    NotFound,
    /// Any other status, or a transport failure.
    #[error("inventory call failed: {0}")]
    Unknown(String),
}

/// Field name → human readable message, reported with a 400.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when no field failed, otherwise a validation error.
    pub fn into_result(self) -> DomainResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

/// Domain-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more request fields failed validation.
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("{0} already exists")]
    AlreadyExists(Resource),

    /// A task batch starts before today.
    #[error("task batch start day is in the past")]
    TaskOutdated,

    /// The caller is not authorized for the task's department.
    #[error("caller is not allowed to act on this department")]
    TaskNotAllowed,

    /// A department cannot be removed while tasks still reference it.
    #[error("department still has tasks")]
    DepartmentHasTasks,

    /// The caller neither owns the medication record nor is an admin.
    #[error("caller has no rights on this medication")]
    NoRights,

    /// The ledger guard tripped: the negative delta exceeds current quantity.
    #[error("insufficient quantity: available {available}, requested {requested}")]
    InsufficientQuantity { available: i64, requested: i64 },

    /// A remote inventory adjustment failed.
    #[error(transparent)]
    Inventory(#[from] InventoryFailure),

    /// A handler that needs a caller was reached without one.
    #[error("unknown principal")]
    UnknownPrincipal,

    /// Storage or other unexpected failure. Never shown verbatim to clients.
    #[error("store failure: {0}")]
    Store(String),
}

impl DomainError {
    pub fn not_found(resource: Resource) -> Self {
        Self::NotFound(resource)
    }

    pub fn already_exists(resource: Resource) -> Self {
        Self::AlreadyExists(resource)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// HTTP status signalled to the caller.
    pub fn status(&self) -> u16 {
        match self {
            DomainError::Validation(_) => 400,
            DomainError::NotFound(_) => 404,
            DomainError::AlreadyExists(_) => 400,
            DomainError::TaskOutdated => 400,
            DomainError::TaskNotAllowed => 403,
            DomainError::DepartmentHasTasks => 400,
            DomainError::NoRights => 403,
            DomainError::InsufficientQuantity { .. } => 400,
            DomainError::Inventory(failure) => match failure {
                InventoryFailure::BadRequest => 400,
                InventoryFailure::Unauthorized => 401,
                InventoryFailure::Forbidden => 403,
                InventoryFailure::NotFound => 404,
                InventoryFailure::Unknown(_) => 500,
            },
            DomainError::UnknownPrincipal => 403,
            DomainError::Store(_) => 500,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Validation(_) => ErrorCode::Validation,
            DomainError::NotFound(resource) => match resource {
                Resource::User => ErrorCode::UserNotFound,
                Resource::Department => ErrorCode::DepartmentNotFound,
                Resource::Task => ErrorCode::TaskNotFound,
                Resource::Medication => ErrorCode::MedicationNotFound,
            },
            DomainError::AlreadyExists(resource) => match resource {
                Resource::User => ErrorCode::UserAlreadyExists,
                Resource::Department => ErrorCode::DepartmentAlreadyExists,
                // Task ids are generated, so a clash is a server fault.
                Resource::Task => ErrorCode::Unknown,
                Resource::Medication => ErrorCode::MedicationAlreadyExists,
            },
            DomainError::TaskOutdated => ErrorCode::TaskOutdated,
            DomainError::TaskNotAllowed => ErrorCode::TaskNotAllowed,
            DomainError::DepartmentHasTasks => ErrorCode::DepartmentHasTasks,
            DomainError::NoRights => ErrorCode::MedicationNoRights,
            DomainError::InsufficientQuantity { .. } => ErrorCode::MedicationNotEnoughQuantity,
            DomainError::Inventory(failure) => match failure {
                InventoryFailure::BadRequest => ErrorCode::InventoryBadRequest,
                InventoryFailure::Unauthorized => ErrorCode::InventoryUnauthorized,
                InventoryFailure::Forbidden => ErrorCode::InventoryForbidden,
                InventoryFailure::NotFound => ErrorCode::InventoryNotFound,
                InventoryFailure::Unknown(_) => ErrorCode::InventoryUnknown,
            },
            DomainError::UnknownPrincipal => ErrorCode::UserUnknown,
            DomainError::Store(_) => ErrorCode::Unknown,
        }
    }

    pub fn message_key(&self) -> MessageKey {
        match self.code() {
            ErrorCode::Validation => MessageKey::ValidationFailed,
            ErrorCode::DepartmentNotFound => MessageKey::DepartmentNotFound,
            ErrorCode::DepartmentAlreadyExists => MessageKey::DepartmentAlreadyExists,
            ErrorCode::DepartmentHasTasks => MessageKey::DepartmentHasTasks,
            ErrorCode::TaskNotFound => MessageKey::TaskNotFound,
            ErrorCode::TaskOutdated => MessageKey::TaskOutdated,
            ErrorCode::TaskNotAllowed => MessageKey::TaskNotAllowed,
            ErrorCode::MedicationNotFound => MessageKey::MedicationNotFound,
            ErrorCode::MedicationAlreadyExists => MessageKey::MedicationAlreadyExists,
            ErrorCode::MedicationNotEnoughQuantity => MessageKey::MedicationNotEnoughQuantity,
            ErrorCode::MedicationNoRights => MessageKey::MedicationNoRights,
            ErrorCode::InventoryBadRequest => MessageKey::InventoryBadRequest,
            ErrorCode::InventoryUnauthorized => MessageKey::InventoryUnauthorized,
            ErrorCode::InventoryForbidden => MessageKey::InventoryForbidden,
            ErrorCode::InventoryNotFound => MessageKey::InventoryNotFound,
            ErrorCode::InventoryUnknown => MessageKey::InventoryUnknown,
            ErrorCode::UserNotFound => MessageKey::UserNotFound,
            ErrorCode::UserAlreadyExists => MessageKey::UserAlreadyExists,
            ErrorCode::UserUnknown => MessageKey::UserUnknown,
            ErrorCode::Unknown => MessageKey::Unknown,
        }
    }
}
