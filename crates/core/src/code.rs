//! Stable numeric error codes and localized message keys.
//!
//! Codes are part of the public error body and let clients disambiguate failures
//! that share an HTTP status. Message keys resolve to English defaults here; a
//! translation layer can map the key to another locale.

use serde::{Deserialize, Serialize};

/// Numeric error code carried in every structured error body.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Validation,
    DepartmentNotFound,
    DepartmentAlreadyExists,
    DepartmentHasTasks,
    TaskNotFound,
    TaskOutdated,
    TaskNotAllowed,
    MedicationNotFound,
    MedicationAlreadyExists,
    MedicationNotEnoughQuantity,
    MedicationNoRights,
    InventoryBadRequest,
    InventoryUnauthorized,
    InventoryForbidden,
    InventoryNotFound,
    InventoryUnknown,
    UserNotFound,
    UserAlreadyExists,
    UserUnknown,
    Unknown,
}

impl ErrorCode {
    pub const fn value(self) -> i32 {
        match self {
            ErrorCode::Validation => 4000,
            ErrorCode::DepartmentNotFound => 7001,
            ErrorCode::DepartmentAlreadyExists => 7002,
            ErrorCode::DepartmentHasTasks => 7003,
            ErrorCode::TaskNotFound => 7101,
            ErrorCode::TaskOutdated => 7102,
            ErrorCode::TaskNotAllowed => 7103,
            ErrorCode::MedicationNotFound => 7201,
            ErrorCode::MedicationAlreadyExists => 7202,
            ErrorCode::MedicationNotEnoughQuantity => 7203,
            ErrorCode::MedicationNoRights => 7204,
            ErrorCode::InventoryBadRequest => 7301,
            ErrorCode::InventoryUnauthorized => 7302,
            ErrorCode::InventoryForbidden => 7303,
            ErrorCode::InventoryNotFound => 7304,
            ErrorCode::InventoryUnknown => 7305,
            ErrorCode::UserNotFound => 8001,
            ErrorCode::UserAlreadyExists => 8002,
            ErrorCode::UserUnknown => 8003,
            ErrorCode::Unknown => 9999,
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Localized message key for an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    ValidationFailed,
    DepartmentNotFound,
    DepartmentAlreadyExists,
    DepartmentHasTasks,
    TaskNotFound,
    TaskOutdated,
    TaskNotAllowed,
    MedicationNotFound,
    MedicationAlreadyExists,
    MedicationNotEnoughQuantity,
    MedicationNoRights,
    InventoryBadRequest,
    InventoryUnauthorized,
    InventoryForbidden,
    InventoryNotFound,
    InventoryUnknown,
    UserNotFound,
    UserAlreadyExists,
    UserUnknown,
    Unknown,
}

impl MessageKey {
    /// Dotted message key, as used by message bundles.
    pub const fn key(self) -> &'static str {
        match self {
            MessageKey::ValidationFailed => "api.validation.failed",
            MessageKey::DepartmentNotFound => "api.department.not-found",
            MessageKey::DepartmentAlreadyExists => "api.department.already-exists",
            MessageKey::DepartmentHasTasks => "api.department.has-tasks",
            MessageKey::TaskNotFound => "api.task.not-found",
            MessageKey::TaskOutdated => "api.task.outdated",
            MessageKey::TaskNotAllowed => "api.task.not-allowed",
            MessageKey::MedicationNotFound => "medication.not-found",
            MessageKey::MedicationAlreadyExists => "medication.already-exists",
            MessageKey::MedicationNotEnoughQuantity => "medication.not-enough-quantity",
            MessageKey::MedicationNoRights => "medication.no-rights",
            MessageKey::InventoryBadRequest => "api.medication.bad-request",
            MessageKey::InventoryUnauthorized => "api.medication.unauthorized",
            MessageKey::InventoryForbidden => "api.medication.forbidden",
            MessageKey::InventoryNotFound => "api.medication.not-found",
            MessageKey::InventoryUnknown => "api.medication.unknown",
            MessageKey::UserNotFound => "security.user.not-found",
            MessageKey::UserAlreadyExists => "security.user.already-exists",
            MessageKey::UserUnknown => "security.user.unknown-exception",
            MessageKey::Unknown => "api.unknown",
        }
    }

    /// English message for the key.
    pub const fn default_message(self) -> &'static str {
        match self {
            MessageKey::ValidationFailed => "Request validation failed",
            MessageKey::DepartmentNotFound => "Department with this id doesn't exist",
            MessageKey::DepartmentAlreadyExists => "Department with this name already exists",
            MessageKey::DepartmentHasTasks => "Department still has scheduled tasks",
            MessageKey::TaskNotFound => "Task with this id doesn't exist",
            MessageKey::TaskOutdated => "Task start day is in the past",
            MessageKey::TaskNotAllowed => "You are not a member of the task's department",
            MessageKey::MedicationNotFound => "Medication with this id doesn't exist",
            MessageKey::MedicationAlreadyExists => {
                "Medication with the same name and weight already exists"
            }
            MessageKey::MedicationNotEnoughQuantity => "Not enough medication quantity",
            MessageKey::MedicationNoRights => "That medication is connected to another user",
            MessageKey::InventoryBadRequest => "Medication service rejected the request",
            MessageKey::InventoryUnauthorized => {
                "Medication service rejected the configured credentials"
            }
            MessageKey::InventoryForbidden => "Medication service denied access",
            MessageKey::InventoryNotFound => "Medication service doesn't know this medication",
            MessageKey::InventoryUnknown => "Medication service failed unexpectedly",
            MessageKey::UserNotFound => "User with this username doesn't exist",
            MessageKey::UserAlreadyExists => "User with this username already exists",
            MessageKey::UserUnknown => "Unknown user",
            MessageKey::Unknown => "Unexpected server error",
        }
    }
}

impl core::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}
