//! `medward-core` — shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy shared by both services, and a clock seam.

pub mod clock;
pub mod code;
pub mod entity;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use code::{ErrorCode, MessageKey};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldErrors, InventoryFailure, Resource};
pub use id::{DepartmentId, MedicationId, TaskId, UserId};
