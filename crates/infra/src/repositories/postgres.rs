//! Postgres-backed repositories.
//!
//! Queries are runtime-checked (`sqlx::query` + `bind`), so building the crate
//! needs no live database. Schemas live in `crates/infra/sql/`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | DomainError |
//! |------------|----------------------|-------------|
//! | Database (unique violation) | `23505` | `AlreadyExists(resource)` |
//! | Database (foreign key violation) | `23503` | `NotFound(resource)` |
//! | anything else | | `Store` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use medward_auth::{PasswordHash, Role, UserAccount};
use medward_core::{
    DepartmentId, DomainError, DomainResult, MedicationId, Resource, TaskId, UserId,
};
use medward_hospital::{Department, NewDepartment, Task};
use medward_medication::{MedicationForm, MedicationRecord, NewMedication};

use super::{DepartmentRepository, MedicationRepository, TaskRepository, UserRepository};

fn map_sqlx_error(operation: &str, resource: Resource, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => DomainError::already_exists(resource),
            Some("23503") => DomainError::not_found(resource),
            _ => DomainError::store(format!(
                "database error in {}: {}",
                operation,
                db_err.message()
            )),
        },
        sqlx::Error::PoolClosed => {
            DomainError::store(format!("connection pool closed in {}", operation))
        }
        other => DomainError::store(format!("sqlx error in {}: {}", operation, other)),
    }
}

fn decode_error(operation: &str, err: impl core::fmt::Display) -> DomainError {
    DomainError::store(format!("failed to decode row in {}: {}", operation, err))
}

// -------------------------
// Medication ledger
// -------------------------

const MEDICATION_COLUMNS: &str =
    "id, name, manufacturer, form, weight, quantity, additional_info, owner_id";

fn medication_from_row(row: &PgRow) -> DomainResult<MedicationRecord> {
    let op = "medication_from_row";
    let form: String = row.try_get("form").map_err(|e| decode_error(op, e))?;
    Ok(MedicationRecord {
        id: MedicationId::new(row.try_get("id").map_err(|e| decode_error(op, e))?),
        name: row.try_get("name").map_err(|e| decode_error(op, e))?,
        manufacturer: row.try_get("manufacturer").map_err(|e| decode_error(op, e))?,
        form: form.parse::<MedicationForm>().map_err(|e| decode_error(op, e))?,
        weight: row.try_get("weight").map_err(|e| decode_error(op, e))?,
        quantity: row.try_get("quantity").map_err(|e| decode_error(op, e))?,
        additional_info: row.try_get("additional_info").map_err(|e| decode_error(op, e))?,
        owner: UserId::from_uuid(row.try_get("owner_id").map_err(|e| decode_error(op, e))?),
    })
}

#[derive(Debug, Clone)]
pub struct PostgresMedicationRepository {
    pool: Arc<PgPool>,
}

impl PostgresMedicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_where(
        &self,
        operation: &str,
        clause: &str,
        bind: Option<uuid::Uuid>,
    ) -> DomainResult<Vec<MedicationRecord>> {
        let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medication {clause} ORDER BY id");
        let mut query = sqlx::query(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, Resource::Medication, e))?;
        rows.iter().map(medication_from_row).collect()
    }
}

#[async_trait]
impl MedicationRepository for PostgresMedicationRepository {
    #[instrument(skip(self, new), fields(name = %new.name, weight = new.weight), err)]
    async fn insert(&self, new: NewMedication, owner: UserId) -> DomainResult<MedicationRecord> {
        let sql = format!(
            r#"
            INSERT INTO medication (name, manufacturer, form, weight, quantity, additional_info, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MEDICATION_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&new.name)
            .bind(&new.manufacturer)
            .bind(new.form.as_str())
            .bind(new.weight)
            .bind(new.quantity)
            .bind(&new.additional_info)
            .bind(owner.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_medication", Resource::Medication, e))?;
        medication_from_row(&row)
    }

    async fn get(&self, id: MedicationId) -> DomainResult<Option<MedicationRecord>> {
        let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medication WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_medication", Resource::Medication, e))?;
        row.as_ref().map(medication_from_row).transpose()
    }

    async fn find_by_identity(&self, name: &str, weight: i32) -> DomainResult<Option<MedicationRecord>> {
        let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medication WHERE name = $1 AND weight = $2");
        let row = sqlx::query(&sql)
            .bind(name)
            .bind(weight)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_medication_by_identity", Resource::Medication, e))?;
        row.as_ref().map(medication_from_row).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<MedicationRecord>> {
        self.fetch_where("list_medication", "", None).await
    }

    async fn list_by_owner(&self, owner: UserId) -> DomainResult<Vec<MedicationRecord>> {
        self.fetch_where("list_medication_by_owner", "WHERE owner_id = $1", Some(*owner.as_uuid()))
            .await
    }

    #[instrument(skip(self, record), fields(medication_id = %record.id), err)]
    async fn update(&self, record: &MedicationRecord) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE medication
            SET name = $2, manufacturer = $3, form = $4, weight = $5, quantity = $6,
                additional_info = $7, owner_id = $8
            WHERE id = $1
            "#,
        )
        .bind(record.id.get())
        .bind(&record.name)
        .bind(&record.manufacturer)
        .bind(record.form.as_str())
        .bind(record.weight)
        .bind(record.quantity)
        .bind(&record.additional_info)
        .bind(record.owner.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_medication", Resource::Medication, e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(Resource::Medication));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(medication_id = %id), err)]
    async fn adjust_quantity(&self, id: MedicationId, delta: i64) -> DomainResult<i64> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE medication
            SET quantity = quantity + $2
            WHERE id = $1 AND quantity + $2 >= 0
            RETURNING quantity
            "#,
        )
        .bind(id.get())
        .bind(delta)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("adjust_quantity", Resource::Medication, e))?;

        if let Some(quantity) = updated {
            return Ok(quantity);
        }

        // The guarded update matched nothing: tell a missing id from an overdraft.
        let current: Option<i64> = sqlx::query_scalar("SELECT quantity FROM medication WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("adjust_quantity", Resource::Medication, e))?;

        match current {
            None => Err(DomainError::not_found(Resource::Medication)),
            Some(available) => Err(DomainError::InsufficientQuantity {
                available,
                requested: delta.saturating_neg(),
            }),
        }
    }

    async fn delete(&self, id: MedicationId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM medication WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_medication", Resource::Medication, e))?;
        Ok(result.rows_affected() > 0)
    }
}

// -------------------------
// Users
// -------------------------

/// User accounts in a per-service table (`medication_users` or `hospital_users`).
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: Arc<PgPool>,
    table: &'static str,
}

impl PostgresUserRepository {
    pub fn for_medication(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            table: "medication_users",
        }
    }

    pub fn for_hospital(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            table: "hospital_users",
        }
    }

    fn user_from_row(row: &PgRow) -> DomainResult<UserAccount> {
        let op = "user_from_row";
        let role: String = row.try_get("role").map_err(|e| decode_error(op, e))?;
        let hash: String = row.try_get("password_hash").map_err(|e| decode_error(op, e))?;
        Ok(UserAccount {
            id: UserId::from_uuid(row.try_get("id").map_err(|e| decode_error(op, e))?),
            username: row.try_get("username").map_err(|e| decode_error(op, e))?,
            password_hash: PasswordHash::from_encoded(hash),
            role: role.parse::<Role>().map_err(|e| decode_error(op, e))?,
        })
    }

    fn select_sql(&self, clause: &str) -> String {
        format!(
            "SELECT id, username, password_hash, role FROM {} {}",
            self.table, clause
        )
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: UserId) -> DomainResult<Option<UserAccount>> {
        let sql = self.select_sql("WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", Resource::User, e))?;
        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<UserAccount>> {
        let sql = self.select_sql("WHERE username = $1");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_username", Resource::User, e))?;
        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<UserAccount>> {
        let sql = self.select_sql("ORDER BY username");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", Resource::User, e))?;
        rows.iter().map(Self::user_from_row).collect()
    }

    #[instrument(skip(self, account), fields(username = %account.username), err)]
    async fn insert(&self, account: &UserAccount) -> DomainResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, username, password_hash, role) VALUES ($1, $2, $3, $4)",
            self.table
        );
        sqlx::query(&sql)
            .bind(account.id.as_uuid())
            .bind(&account.username)
            .bind(account.password_hash.as_str())
            .bind(account.role.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", Resource::User, e))?;
        Ok(())
    }

    #[instrument(skip(self, account), fields(user_id = %account.id), err)]
    async fn update(&self, account: &UserAccount) -> DomainResult<()> {
        let sql = format!(
            "UPDATE {} SET username = $2, password_hash = $3, role = $4 WHERE id = $1",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(account.id.as_uuid())
            .bind(&account.username)
            .bind(account.password_hash.as_str())
            .bind(account.role.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", Resource::User, e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(Resource::User));
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> DomainResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&sql)
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", Resource::User, e))?;
        Ok(result.rows_affected() > 0)
    }
}

// -------------------------
// Departments + membership
// -------------------------

fn department_from_row(row: &PgRow) -> DomainResult<Department> {
    let op = "department_from_row";
    Ok(Department {
        id: DepartmentId::new(row.try_get("id").map_err(|e| decode_error(op, e))?),
        name: row.try_get("name").map_err(|e| decode_error(op, e))?,
        description: row.try_get("description").map_err(|e| decode_error(op, e))?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresDepartmentRepository {
    pool: Arc<PgPool>,
}

impl PostgresDepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl DepartmentRepository for PostgresDepartmentRepository {
    #[instrument(skip(self, new), fields(name = %new.name), err)]
    async fn insert(&self, new: NewDepartment) -> DomainResult<Department> {
        let row = sqlx::query(
            "INSERT INTO department (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_department", Resource::Department, e))?;
        department_from_row(&row)
    }

    async fn get(&self, id: DepartmentId) -> DomainResult<Option<Department>> {
        let row = sqlx::query("SELECT id, name, description FROM department WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_department", Resource::Department, e))?;
        row.as_ref().map(department_from_row).transpose()
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Department>> {
        let row = sqlx::query("SELECT id, name, description FROM department WHERE name = $1")
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_department_by_name", Resource::Department, e))?;
        row.as_ref().map(department_from_row).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Department>> {
        let rows = sqlx::query("SELECT id, name, description FROM department ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_departments", Resource::Department, e))?;
        rows.iter().map(department_from_row).collect()
    }

    async fn update(&self, department: &Department) -> DomainResult<()> {
        let result = sqlx::query("UPDATE department SET name = $2, description = $3 WHERE id = $1")
            .bind(department.id.get())
            .bind(&department.name)
            .bind(&department.description)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_department", Resource::Department, e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(Resource::Department));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(department_id = %id), err)]
    async fn delete(&self, id: DepartmentId) -> DomainResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_department", Resource::Department, e))?;

        sqlx::query("DELETE FROM user_department WHERE department_id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_department", Resource::Department, e))?;

        let result = sqlx::query("DELETE FROM department WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_department", Resource::Department, e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_department", Resource::Department, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_member(&self, id: DepartmentId, user: UserId) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_department (department_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id.get())
        .bind(user.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_member", Resource::Department, e))?;
        Ok(())
    }

    async fn remove_member(&self, id: DepartmentId, user: UserId) -> DomainResult<()> {
        sqlx::query("DELETE FROM user_department WHERE department_id = $1 AND user_id = $2")
            .bind(id.get())
            .bind(user.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_member", Resource::Department, e))?;
        Ok(())
    }

    async fn departments_of(&self, user: UserId) -> DomainResult<Vec<Department>> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.name, d.description
            FROM department d
            JOIN user_department ud ON ud.department_id = d.id
            WHERE ud.user_id = $1
            ORDER BY d.id
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("departments_of", Resource::Department, e))?;
        rows.iter().map(department_from_row).collect()
    }

    async fn detach_user(&self, user: UserId) -> DomainResult<()> {
        sqlx::query("DELETE FROM user_department WHERE user_id = $1")
            .bind(user.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("detach_user", Resource::Department, e))?;
        Ok(())
    }
}

// -------------------------
// Tasks
// -------------------------

fn task_from_row(row: &PgRow) -> DomainResult<Task> {
    let op = "task_from_row";
    let issued: NaiveDateTime = row
        .try_get("date_time_of_issue")
        .map_err(|e| decode_error(op, e))?;
    Ok(Task {
        id: TaskId::from_uuid(row.try_get("id").map_err(|e| decode_error(op, e))?),
        patient: row.try_get("patient").map_err(|e| decode_error(op, e))?,
        medication_id: MedicationId::new(row.try_get("medication_id").map_err(|e| decode_error(op, e))?),
        date_time_of_issue: issued,
        department_id: DepartmentId::new(row.try_get("department_id").map_err(|e| decode_error(op, e))?),
    })
}

const TASK_COLUMNS: &str = "id, patient, medication_id, date_time_of_issue, department_id";

#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: Arc<PgPool>,
}

impl PostgresTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    #[instrument(skip(self, tasks), fields(task_count = tasks.len()), err)]
    async fn insert_batch(&self, tasks: &[Task]) -> DomainResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert_tasks", Resource::Task, e))?;

        for task in tasks {
            sqlx::query(
                r#"
                INSERT INTO task (id, patient, medication_id, date_time_of_issue, department_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(task.id.as_uuid())
            .bind(&task.patient)
            .bind(task.medication_id.get())
            .bind(task.date_time_of_issue)
            .bind(task.department_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_tasks", Resource::Task, e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert_tasks", Resource::Task, e))?;
        Ok(())
    }

    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM task WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_task", Resource::Task, e))?;
        row.as_ref().map(task_from_row).transpose()
    }

    async fn delete(&self, id: TaskId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM task WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_task", Resource::Task, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_department(&self, department: DepartmentId) -> DomainResult<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE department_id = $1 ORDER BY date_time_of_issue"
        );
        let rows = sqlx::query(&sql)
            .bind(department.get())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_tasks_by_department", Resource::Task, e))?;
        rows.iter().map(task_from_row).collect()
    }

    async fn list_on(
        &self,
        day: NaiveDate,
        departments: Option<&[DepartmentId]>,
    ) -> DomainResult<Vec<Task>> {
        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS} FROM task
            WHERE date_time_of_issue::date = $1
              AND ($2::bigint[] IS NULL OR department_id = ANY($2))
            ORDER BY date_time_of_issue
            "#
        );
        let ids: Option<Vec<i64>> = departments.map(|deps| deps.iter().map(|d| d.get()).collect());
        let rows = sqlx::query(&sql)
            .bind(day)
            .bind(ids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_tasks_on", Resource::Task, e))?;
        rows.iter().map(task_from_row).collect()
    }
}
