//! Inventory ledger domain (medication service).
//!
//! This crate contains business rules for the medication ledger, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod record;

pub use record::{
    MedicationForm, MedicationRecord, NewMedication, apply_delta,
};
