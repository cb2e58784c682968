//! In-memory repositories for tests/dev.
//!
//! Each repository keeps its rows behind one `RwLock`; multi-step checks (unique
//! keys, the quantity guard) run under a single write guard, which gives them the
//! same atomicity the Postgres adapters get from single statements.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use medward_auth::UserAccount;
use medward_core::{
    DepartmentId, DomainError, DomainResult, Entity, MedicationId, Resource, TaskId, UserId,
};
use medward_hospital::{Department, NewDepartment, Task};
use medward_medication::{MedicationRecord, NewMedication, apply_delta};

use super::{DepartmentRepository, MedicationRepository, TaskRepository, UserRepository};

/// Ordered rows keyed by entity id.
#[derive(Debug)]
struct Table<V: Entity>
where
    V::Id: Ord,
{
    rows: RwLock<BTreeMap<V::Id, V>>,
}

impl<V: Entity> Table<V>
where
    V::Id: Ord,
{
    fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, BTreeMap<V::Id, V>>> {
        self.rows
            .read()
            .map_err(|_| DomainError::store("in-memory table lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, BTreeMap<V::Id, V>>> {
        self.rows
            .write()
            .map_err(|_| DomainError::store("in-memory table lock poisoned"))
    }
}

impl<V: Entity + Clone> Table<V>
where
    V::Id: Ord,
{
    fn get(&self, id: &V::Id) -> DomainResult<Option<V>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn find(&self, pred: impl Fn(&V) -> bool) -> DomainResult<Option<V>> {
        Ok(self.read()?.values().find(|v| pred(v)).cloned())
    }

    fn filter(&self, pred: impl Fn(&V) -> bool) -> DomainResult<Vec<V>> {
        Ok(self.read()?.values().filter(|v| pred(v)).cloned().collect())
    }

    fn remove(&self, id: &V::Id) -> DomainResult<bool> {
        Ok(self.write()?.remove(id).is_some())
    }
}

// -------------------------
// Medication ledger
// -------------------------

#[derive(Debug)]
pub struct InMemoryMedicationRepository {
    table: Table<MedicationRecord>,
    next_id: AtomicI64,
}

impl InMemoryMedicationRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryMedicationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MedicationRepository for InMemoryMedicationRepository {
    async fn insert(&self, new: NewMedication, owner: UserId) -> DomainResult<MedicationRecord> {
        let mut rows = self.table.write()?;
        if rows
            .values()
            .any(|r| r.name == new.name && r.weight == new.weight)
        {
            return Err(DomainError::already_exists(Resource::Medication));
        }
        let id = MedicationId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = MedicationRecord::from_new(id, new, owner);
        rows.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: MedicationId) -> DomainResult<Option<MedicationRecord>> {
        self.table.get(&id)
    }

    async fn find_by_identity(&self, name: &str, weight: i32) -> DomainResult<Option<MedicationRecord>> {
        self.table.find(|r| r.name == name && r.weight == weight)
    }

    async fn list(&self) -> DomainResult<Vec<MedicationRecord>> {
        self.table.filter(|_| true)
    }

    async fn list_by_owner(&self, owner: UserId) -> DomainResult<Vec<MedicationRecord>> {
        self.table.filter(|r| r.owner == owner)
    }

    async fn update(&self, record: &MedicationRecord) -> DomainResult<()> {
        let mut rows = self.table.write()?;
        if rows
            .values()
            .any(|r| r.id != record.id && r.name == record.name && r.weight == record.weight)
        {
            return Err(DomainError::already_exists(Resource::Medication));
        }
        match rows.get_mut(&record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(Resource::Medication)),
        }
    }

    async fn adjust_quantity(&self, id: MedicationId, delta: i64) -> DomainResult<i64> {
        let mut rows = self.table.write()?;
        let record = rows
            .get_mut(&id)
            .ok_or(DomainError::not_found(Resource::Medication))?;
        record.quantity = apply_delta(record.quantity, delta)?;
        Ok(record.quantity)
    }

    async fn delete(&self, id: MedicationId) -> DomainResult<bool> {
        self.table.remove(&id)
    }
}

// -------------------------
// Users
// -------------------------

#[derive(Debug)]
pub struct InMemoryUserRepository {
    table: Table<UserAccount>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self { table: Table::new() }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: UserId) -> DomainResult<Option<UserAccount>> {
        self.table.get(&id)
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<UserAccount>> {
        self.table.find(|u| u.username == username)
    }

    async fn list(&self) -> DomainResult<Vec<UserAccount>> {
        self.table.filter(|_| true)
    }

    async fn insert(&self, account: &UserAccount) -> DomainResult<()> {
        let mut rows = self.table.write()?;
        if rows.values().any(|u| u.username == account.username) {
            return Err(DomainError::already_exists(Resource::User));
        }
        rows.insert(account.id, account.clone());
        Ok(())
    }

    async fn update(&self, account: &UserAccount) -> DomainResult<()> {
        let mut rows = self.table.write()?;
        if rows
            .values()
            .any(|u| u.id != account.id && u.username == account.username)
        {
            return Err(DomainError::already_exists(Resource::User));
        }
        match rows.get_mut(&account.id) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(Resource::User)),
        }
    }

    async fn delete(&self, id: UserId) -> DomainResult<bool> {
        self.table.remove(&id)
    }
}

// -------------------------
// Departments + membership
// -------------------------

#[derive(Debug)]
pub struct InMemoryDepartmentRepository {
    table: Table<Department>,
    members: RwLock<BTreeSet<(DepartmentId, UserId)>>,
    next_id: AtomicI64,
}

impl InMemoryDepartmentRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
            members: RwLock::new(BTreeSet::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn members_write(&self) -> DomainResult<RwLockWriteGuard<'_, BTreeSet<(DepartmentId, UserId)>>> {
        self.members
            .write()
            .map_err(|_| DomainError::store("membership lock poisoned"))
    }
}

impl Default for InMemoryDepartmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DepartmentRepository for InMemoryDepartmentRepository {
    async fn insert(&self, new: NewDepartment) -> DomainResult<Department> {
        let mut rows = self.table.write()?;
        if rows.values().any(|d| d.name == new.name) {
            return Err(DomainError::already_exists(Resource::Department));
        }
        let id = DepartmentId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let department = new.into_department(id);
        rows.insert(id, department.clone());
        Ok(department)
    }

    async fn get(&self, id: DepartmentId) -> DomainResult<Option<Department>> {
        self.table.get(&id)
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Department>> {
        self.table.find(|d| d.name == name)
    }

    async fn list(&self) -> DomainResult<Vec<Department>> {
        self.table.filter(|_| true)
    }

    async fn update(&self, department: &Department) -> DomainResult<()> {
        let mut rows = self.table.write()?;
        if rows
            .values()
            .any(|d| d.id != department.id && d.name == department.name)
        {
            return Err(DomainError::already_exists(Resource::Department));
        }
        match rows.get_mut(&department.id) {
            Some(slot) => {
                *slot = department.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(Resource::Department)),
        }
    }

    async fn delete(&self, id: DepartmentId) -> DomainResult<bool> {
        let mut rows = self.table.write()?;
        let mut members = self.members_write()?;
        members.retain(|(dep, _)| *dep != id);
        Ok(rows.remove(&id).is_some())
    }

    async fn add_member(&self, id: DepartmentId, user: UserId) -> DomainResult<()> {
        if self.table.get(&id)?.is_none() {
            return Err(DomainError::not_found(Resource::Department));
        }
        self.members_write()?.insert((id, user));
        Ok(())
    }

    async fn remove_member(&self, id: DepartmentId, user: UserId) -> DomainResult<()> {
        self.members_write()?.remove(&(id, user));
        Ok(())
    }

    async fn departments_of(&self, user: UserId) -> DomainResult<Vec<Department>> {
        let ids: Vec<DepartmentId> = self
            .members
            .read()
            .map_err(|_| DomainError::store("membership lock poisoned"))?
            .iter()
            .filter(|(_, u)| *u == user)
            .map(|(dep, _)| *dep)
            .collect();
        self.table.filter(|d| ids.contains(&d.id))
    }

    async fn detach_user(&self, user: UserId) -> DomainResult<()> {
        self.members_write()?.retain(|(_, u)| *u != user);
        Ok(())
    }
}

// -------------------------
// Tasks
// -------------------------

#[derive(Debug)]
pub struct InMemoryTaskRepository {
    table: Table<Task>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self { table: Table::new() }
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert_batch(&self, tasks: &[Task]) -> DomainResult<()> {
        let mut rows = self.table.write()?;
        if tasks.iter().any(|t| rows.contains_key(&t.id)) {
            return Err(DomainError::already_exists(Resource::Task));
        }
        for task in tasks {
            rows.insert(task.id, task.clone());
        }
        Ok(())
    }

    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>> {
        self.table.get(&id)
    }

    async fn delete(&self, id: TaskId) -> DomainResult<bool> {
        self.table.remove(&id)
    }

    async fn list_by_department(&self, department: DepartmentId) -> DomainResult<Vec<Task>> {
        let mut tasks = self.table.filter(|t| t.department_id == department)?;
        tasks.sort_by_key(|t| t.date_time_of_issue);
        Ok(tasks)
    }

    async fn list_on(
        &self,
        day: NaiveDate,
        departments: Option<&[DepartmentId]>,
    ) -> DomainResult<Vec<Task>> {
        let mut tasks = self.table.filter(|t| {
            t.is_scheduled_on(day) && departments.is_none_or(|deps| deps.contains(&t.department_id))
        })?;
        tasks.sort_by_key(|t| t.date_time_of_issue);
        Ok(tasks)
    }
}
