//! Persistence ports and their adapters.
//!
//! Every repository returns plain records; relations between users and
//! departments live in an explicit membership table rather than on the records.
//! `memory` backs dev/test runs, `postgres` backs deployments with `DATABASE_URL`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use medward_auth::UserAccount;
use medward_core::{DepartmentId, DomainResult, MedicationId, TaskId, UserId};
use medward_hospital::{Department, NewDepartment, Task};
use medward_medication::{MedicationRecord, NewMedication};

pub mod memory;
pub mod postgres;

pub use memory::{
    InMemoryDepartmentRepository, InMemoryMedicationRepository, InMemoryTaskRepository,
    InMemoryUserRepository,
};
pub use postgres::{
    PostgresDepartmentRepository, PostgresMedicationRepository, PostgresTaskRepository,
    PostgresUserRepository,
};

/// Medication ledger records.
#[async_trait]
pub trait MedicationRepository: Send + Sync {
    /// Store a new record under a fresh id.
    ///
    /// Fails with `AlreadyExists(Medication)` when `(name, weight)` is taken.
    async fn insert(&self, new: NewMedication, owner: UserId) -> DomainResult<MedicationRecord>;

    async fn get(&self, id: MedicationId) -> DomainResult<Option<MedicationRecord>>;

    async fn find_by_identity(&self, name: &str, weight: i32) -> DomainResult<Option<MedicationRecord>>;

    async fn list(&self) -> DomainResult<Vec<MedicationRecord>>;

    async fn list_by_owner(&self, owner: UserId) -> DomainResult<Vec<MedicationRecord>>;

    /// Overwrite every mutable column of an existing record.
    async fn update(&self, record: &MedicationRecord) -> DomainResult<()>;

    /// Apply a signed delta atomically and return the new quantity.
    ///
    /// The guard and the write happen as one step, so concurrent adjustments
    /// of the same id can never drive the quantity below zero.
    async fn adjust_quantity(&self, id: MedicationId, delta: i64) -> DomainResult<i64>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: MedicationId) -> DomainResult<bool>;
}

#[async_trait]
impl<S> MedicationRepository for Arc<S>
where
    S: MedicationRepository + ?Sized,
{
    async fn insert(&self, new: NewMedication, owner: UserId) -> DomainResult<MedicationRecord> {
        (**self).insert(new, owner).await
    }

    async fn get(&self, id: MedicationId) -> DomainResult<Option<MedicationRecord>> {
        (**self).get(id).await
    }

    async fn find_by_identity(&self, name: &str, weight: i32) -> DomainResult<Option<MedicationRecord>> {
        (**self).find_by_identity(name, weight).await
    }

    async fn list(&self) -> DomainResult<Vec<MedicationRecord>> {
        (**self).list().await
    }

    async fn list_by_owner(&self, owner: UserId) -> DomainResult<Vec<MedicationRecord>> {
        (**self).list_by_owner(owner).await
    }

    async fn update(&self, record: &MedicationRecord) -> DomainResult<()> {
        (**self).update(record).await
    }

    async fn adjust_quantity(&self, id: MedicationId, delta: i64) -> DomainResult<i64> {
        (**self).adjust_quantity(id, delta).await
    }

    async fn delete(&self, id: MedicationId) -> DomainResult<bool> {
        (**self).delete(id).await
    }
}

/// User accounts of one service.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: UserId) -> DomainResult<Option<UserAccount>>;

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<UserAccount>>;

    async fn list(&self) -> DomainResult<Vec<UserAccount>>;

    /// Fails with `AlreadyExists(User)` on a username clash.
    async fn insert(&self, account: &UserAccount) -> DomainResult<()>;

    async fn update(&self, account: &UserAccount) -> DomainResult<()>;

    async fn delete(&self, id: UserId) -> DomainResult<bool>;
}

/// Departments plus the user membership join table.
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// Fails with `AlreadyExists(Department)` on a name clash.
    async fn insert(&self, new: NewDepartment) -> DomainResult<Department>;

    async fn get(&self, id: DepartmentId) -> DomainResult<Option<Department>>;

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Department>>;

    async fn list(&self) -> DomainResult<Vec<Department>>;

    async fn update(&self, department: &Department) -> DomainResult<()>;

    /// Removes the department together with its membership rows.
    async fn delete(&self, id: DepartmentId) -> DomainResult<bool>;

    async fn add_member(&self, id: DepartmentId, user: UserId) -> DomainResult<()>;

    async fn remove_member(&self, id: DepartmentId, user: UserId) -> DomainResult<()>;

    async fn departments_of(&self, user: UserId) -> DomainResult<Vec<Department>>;

    /// Drop every membership of a user (account removal).
    async fn detach_user(&self, user: UserId) -> DomainResult<()>;
}

/// Scheduled medication-administration tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All-or-nothing insert of a planned batch.
    async fn insert_batch(&self, tasks: &[Task]) -> DomainResult<()>;

    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>>;

    async fn delete(&self, id: TaskId) -> DomainResult<bool>;

    async fn list_by_department(&self, department: DepartmentId) -> DomainResult<Vec<Task>>;

    /// Tasks issued on `day`, restricted to `departments` when given.
    async fn list_on(
        &self,
        day: NaiveDate,
        departments: Option<&[DepartmentId]>,
    ) -> DomainResult<Vec<Task>>;
}
