//! Department directory (hospital service).

use std::sync::Arc;

use tracing::instrument;

use medward_core::{DepartmentId, DomainError, DomainResult, Resource};
use medward_hospital::{Department, NewDepartment, Task};

use crate::repositories::{DepartmentRepository, TaskRepository, UserRepository};

/// A department together with every task scheduled in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentDetails {
    pub department: Department,
    pub tasks: Vec<Task>,
}

#[derive(Clone)]
pub struct DepartmentService {
    departments: Arc<dyn DepartmentRepository>,
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
}

impl DepartmentService {
    pub fn new(
        departments: Arc<dyn DepartmentRepository>,
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            departments,
            tasks,
            users,
        }
    }

    pub async fn list(&self) -> DomainResult<Vec<Department>> {
        self.departments.list().await
    }

    pub async fn get(&self, id: DepartmentId) -> DomainResult<DepartmentDetails> {
        let department = self.require(id).await?;
        let tasks = self.tasks.list_by_department(id).await?;
        Ok(DepartmentDetails { department, tasks })
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    pub async fn create(&self, new: NewDepartment) -> DomainResult<Department> {
        if self.departments.find_by_name(&new.name).await?.is_some() {
            return Err(DomainError::already_exists(Resource::Department));
        }
        self.departments.insert(new).await
    }

    #[instrument(skip(self, new), fields(department_id = %id, name = %new.name), err)]
    pub async fn update(&self, id: DepartmentId, new: NewDepartment) -> DomainResult<Department> {
        self.require(id).await?;
        if let Some(other) = self.departments.find_by_name(&new.name).await? {
            if other.id != id {
                return Err(DomainError::already_exists(Resource::Department));
            }
        }
        let department = new.into_department(id);
        self.departments.update(&department).await?;
        Ok(department)
    }

    /// Idempotent. Members are detached; a department with tasks is kept.
    #[instrument(skip(self), fields(department_id = %id), err)]
    pub async fn delete(&self, id: DepartmentId) -> DomainResult<()> {
        if self.departments.get(id).await?.is_none() {
            return Ok(());
        }
        if !self.tasks.list_by_department(id).await?.is_empty() {
            return Err(DomainError::DepartmentHasTasks);
        }
        self.departments.delete(id).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(department_id = %id), err)]
    pub async fn add_user(&self, username: &str, id: DepartmentId) -> DomainResult<()> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::not_found(Resource::User))?;
        self.require(id).await?;
        self.departments.add_member(id, user.id).await
    }

    #[instrument(skip(self), fields(department_id = %id), err)]
    pub async fn remove_user(&self, username: &str, id: DepartmentId) -> DomainResult<()> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::not_found(Resource::User))?;
        self.require(id).await?;
        self.departments.remove_member(id, user.id).await
    }

    async fn require(&self, id: DepartmentId) -> DomainResult<Department> {
        self.departments
            .get(id)
            .await?
            .ok_or(DomainError::not_found(Resource::Department))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use medward_auth::{Role, UserAccount};
    use medward_core::MedicationId;
    use medward_hospital::NewTaskBatch;

    use crate::repositories::{
        InMemoryDepartmentRepository, InMemoryTaskRepository, InMemoryUserRepository,
    };

    struct Fixture {
        svc: DepartmentService,
        departments: Arc<InMemoryDepartmentRepository>,
        tasks: Arc<InMemoryTaskRepository>,
        users: Arc<InMemoryUserRepository>,
    }

    fn fixture() -> Fixture {
        let departments = Arc::new(InMemoryDepartmentRepository::new());
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        Fixture {
            svc: DepartmentService::new(departments.clone(), tasks.clone(), users.clone()),
            departments,
            tasks,
            users,
        }
    }

    fn named(name: &str) -> NewDepartment {
        NewDepartment::parse(name, None).unwrap()
    }

    #[tokio::test]
    async fn names_stay_unique_across_create_and_update() {
        let f = fixture();
        let a = f.svc.create(named("A")).await.unwrap();
        let b = f.svc.create(named("B")).await.unwrap();

        assert_eq!(
            f.svc.create(named("A")).await,
            Err(DomainError::already_exists(Resource::Department))
        );
        assert_eq!(
            f.svc.update(b.id, named("A")).await,
            Err(DomainError::already_exists(Resource::Department))
        );
        // Keeping its own name is fine.
        assert_eq!(f.svc.update(a.id, named("A")).await.unwrap().name, "A");
        assert_eq!(
            f.svc.update(DepartmentId::new(77), named("C")).await,
            Err(DomainError::not_found(Resource::Department))
        );
    }

    #[tokio::test]
    async fn delete_refuses_while_tasks_remain() {
        let f = fixture();
        let dep = f.svc.create(named("Ward 3")).await.unwrap();
        let batch = NewTaskBatch {
            patient: "p".into(),
            medication_id: MedicationId::new(1),
            department_id: dep.id,
            start_day: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            times_of_issuing: vec![NaiveTime::from_hms_opt(9, 0, 0).unwrap()],
            amount_of_days: 1,
        };
        let planned = batch.plan().unwrap();
        f.tasks.insert_batch(&planned).await.unwrap();

        assert_eq!(f.svc.get(dep.id).await.unwrap().tasks, planned);
        assert_eq!(f.svc.delete(dep.id).await, Err(DomainError::DepartmentHasTasks));

        f.tasks.delete(planned[0].id).await.unwrap();
        f.svc.delete(dep.id).await.unwrap();
        f.svc.delete(dep.id).await.unwrap();
        assert!(f.svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn membership_requires_both_sides() {
        let f = fixture();
        let dep = f.svc.create(named("ER")).await.unwrap();
        let doc = UserAccount::register("doc", "pw", Role::Doctor);
        f.users.insert(&doc).await.unwrap();

        assert_eq!(
            f.svc.add_user("nobody", dep.id).await,
            Err(DomainError::not_found(Resource::User))
        );
        assert_eq!(
            f.svc.add_user("doc", DepartmentId::new(99)).await,
            Err(DomainError::not_found(Resource::Department))
        );

        f.svc.add_user("doc", dep.id).await.unwrap();
        assert_eq!(f.departments.departments_of(doc.id).await.unwrap(), vec![dep.clone()]);

        f.svc.remove_user("doc", dep.id).await.unwrap();
        assert!(f.departments.departments_of(doc.id).await.unwrap().is_empty());
    }
}
