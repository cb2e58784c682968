//! Service wiring: repositories → application services, per deployment mode.
//!
//! Both services run on in-memory stores (dev/test) or Postgres when a pool is
//! supplied. Handlers only ever see the service structs built here.

use std::sync::Arc;

use medward_core::Clock;
use medward_infra::db::PgPool;
use medward_infra::inventory_client::InventoryClient;
use medward_infra::repositories::{
    DepartmentRepository, InMemoryDepartmentRepository, InMemoryMedicationRepository,
    InMemoryTaskRepository, InMemoryUserRepository, MedicationRepository,
    PostgresDepartmentRepository, PostgresMedicationRepository, PostgresTaskRepository,
    PostgresUserRepository, TaskRepository, UserRepository,
};
use medward_infra::services::{DepartmentService, MedicationService, TaskScheduler, UserDirectory};

/// Everything the medication (inventory ledger) service's handlers need.
#[derive(Clone)]
pub struct MedicationServices {
    pub users: UserDirectory,
    pub medications: MedicationService,
}

impl MedicationServices {
    pub fn from_repositories(
        users: Arc<dyn UserRepository>,
        records: Arc<dyn MedicationRepository>,
    ) -> Self {
        Self {
            users: UserDirectory::new(users),
            medications: MedicationService::new(records),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_repositories(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryMedicationRepository::new()),
        )
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::from_repositories(
            Arc::new(PostgresUserRepository::for_medication(pool.clone())),
            Arc::new(PostgresMedicationRepository::new(pool)),
        )
    }
}

/// Everything the hospital service's handlers need.
#[derive(Clone)]
pub struct HospitalServices {
    pub users: UserDirectory,
    pub departments: DepartmentService,
    pub tasks: TaskScheduler,
}

impl HospitalServices {
    pub fn from_repositories(
        users: Arc<dyn UserRepository>,
        departments: Arc<dyn DepartmentRepository>,
        tasks: Arc<dyn TaskRepository>,
        inventory: Arc<dyn InventoryClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users: UserDirectory::with_departments(users.clone(), departments.clone()),
            departments: DepartmentService::new(departments.clone(), tasks.clone(), users),
            tasks: TaskScheduler::new(tasks, departments, inventory, clock),
        }
    }

    pub fn in_memory(inventory: Arc<dyn InventoryClient>, clock: Arc<dyn Clock>) -> Self {
        Self::from_repositories(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryDepartmentRepository::new()),
            Arc::new(InMemoryTaskRepository::new()),
            inventory,
            clock,
        )
    }

    pub fn postgres(pool: PgPool, inventory: Arc<dyn InventoryClient>, clock: Arc<dyn Clock>) -> Self {
        Self::from_repositories(
            Arc::new(PostgresUserRepository::for_hospital(pool.clone())),
            Arc::new(PostgresDepartmentRepository::new(pool.clone())),
            Arc::new(PostgresTaskRepository::new(pool)),
            inventory,
            clock,
        )
    }
}
