//! Hospital domain module.
//!
//! Departments and medication-administration tasks, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Quantity
//! reservation against the inventory ledger is orchestrated in `medward-infra`.

pub mod department;
pub mod task;

pub use department::{Department, NewDepartment};
pub use task::{NewTaskBatch, Task};
