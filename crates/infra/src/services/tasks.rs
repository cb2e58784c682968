//! Task scheduling against the remote inventory ledger.
//!
//! Creating a batch reserves `amount_of_days * times.len()` units in one remote
//! call before any task row is written. Deleting a task that is still in the
//! future releases its single unit first; a due task counts as consumed.
//!
//! ## Failure handling
//!
//! - Local checks (outdated start day, department scope, department existence)
//!   run before any remote call.
//! - A failed reservation aborts the batch: no rows are written.
//! - A failed batch insert after a successful reservation triggers a
//!   compensating release. If that release fails too, the ledger and the task
//!   table disagree; the gap is logged at `error` with the medication id and
//!   unit count, and the insert failure is returned.
//! - A failed release on deletion keeps the task and returns the failure.

use std::sync::Arc;

use tracing::instrument;

use medward_auth::Principal;
use medward_core::{Clock, DepartmentId, DomainError, DomainResult, Resource, TaskId};
use medward_hospital::{NewTaskBatch, Task};

use crate::inventory_client::InventoryClient;
use crate::repositories::{DepartmentRepository, TaskRepository};

/// Departments a caller may act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentScope {
    /// Admins act on every department.
    All,
    Only(Vec<DepartmentId>),
}

impl DepartmentScope {
    pub fn allows(&self, id: DepartmentId) -> bool {
        match self {
            DepartmentScope::All => true,
            DepartmentScope::Only(ids) => ids.contains(&id),
        }
    }
}

#[derive(Clone)]
pub struct TaskScheduler {
    tasks: Arc<dyn TaskRepository>,
    departments: Arc<dyn DepartmentRepository>,
    inventory: Arc<dyn InventoryClient>,
    clock: Arc<dyn Clock>,
}

impl TaskScheduler {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        departments: Arc<dyn DepartmentRepository>,
        inventory: Arc<dyn InventoryClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            departments,
            inventory,
            clock,
        }
    }

    pub async fn scope(&self, caller: &Principal) -> DomainResult<DepartmentScope> {
        if caller.is_admin() {
            return Ok(DepartmentScope::All);
        }
        let ids = self
            .departments
            .departments_of(caller.user_id)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();
        Ok(DepartmentScope::Only(ids))
    }

    /// Today's tasks in the caller's departments.
    pub async fn list_today(&self, caller: &Principal) -> DomainResult<Vec<Task>> {
        let today = self.clock.today();
        match self.scope(caller).await? {
            DepartmentScope::All => self.tasks.list_on(today, None).await,
            DepartmentScope::Only(ids) => self.tasks.list_on(today, Some(&ids)).await,
        }
    }

    pub async fn get(&self, caller: &Principal, id: TaskId) -> DomainResult<Task> {
        let task = self
            .tasks
            .get(id)
            .await?
            .ok_or(DomainError::not_found(Resource::Task))?;
        if !self.scope(caller).await?.allows(task.department_id) {
            return Err(DomainError::TaskNotAllowed);
        }
        Ok(task)
    }

    /// Validate, reserve once for the whole batch, then persist every task.
    #[instrument(
        skip(self, caller, batch),
        fields(
            caller = %caller.username,
            medication_id = %batch.medication_id,
            department_id = %batch.department_id,
            units = batch.total_units()
        ),
        err
    )]
    pub async fn create_tasks(&self, caller: &Principal, batch: NewTaskBatch) -> DomainResult<Vec<Task>> {
        batch.validate()?;
        batch.ensure_not_outdated(self.clock.today())?;
        if !self.scope(caller).await?.allows(batch.department_id) {
            return Err(DomainError::TaskNotAllowed);
        }
        if self.departments.get(batch.department_id).await?.is_none() {
            return Err(DomainError::not_found(Resource::Department));
        }

        let planned = batch.plan()?;
        let units = batch.total_units();

        if let Err(failure) = self.inventory.reserve(batch.medication_id, units).await {
            tracing::warn!(error = %failure, "reservation rejected; no tasks created");
            return Err(failure.into());
        }
        tracing::info!("reservation succeeded");

        if let Err(err) = self.tasks.insert_batch(&planned).await {
            match self.inventory.release(batch.medication_id, units).await {
                Ok(()) => tracing::warn!(error = %err, "task insert failed; reservation released"),
                Err(failure) => tracing::error!(
                    medication_id = %batch.medication_id,
                    units,
                    insert_error = %err,
                    release_error = %failure,
                    "task insert failed and reservation could not be released; ledger is short"
                ),
            }
            return Err(err);
        }

        Ok(planned)
    }

    /// Idempotent delete with a one-unit refund for tasks not yet due.
    #[instrument(skip(self, caller), fields(caller = %caller.username, task_id = %id), err)]
    pub async fn delete_task(&self, caller: &Principal, id: TaskId) -> DomainResult<()> {
        let Some(task) = self.tasks.get(id).await? else {
            return Ok(());
        };
        if !self.scope(caller).await?.allows(task.department_id) {
            return Err(DomainError::TaskNotAllowed);
        }

        if task.is_refundable_at(self.clock.now()) {
            self.inventory
                .release(task.medication_id, 1)
                .await
                .inspect_err(|failure| {
                    tracing::warn!(error = %failure, "release failed; task kept");
                })?;
            tracing::info!(medication_id = %task.medication_id, "released 1 unit for deleted task");
        }

        self.tasks.delete(id).await?;
        Ok(())
    }
}
