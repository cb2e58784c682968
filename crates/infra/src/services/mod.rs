//! Application services on top of the repository ports.
//!
//! Services own the cross-record rules (ownership, department scope, the
//! reservation protocol); repositories stay dumb.

mod departments;
mod ledger;
mod tasks;
mod users;

pub use departments::{DepartmentDetails, DepartmentService};
pub use ledger::MedicationService;
pub use tasks::{DepartmentScope, TaskScheduler};
pub use users::UserDirectory;
