//! Request/response DTOs and their mapping to domain types.
//!
//! Wire names are snake_case. Request DTOs stay loose (raw strings, wide
//! integers) so that shape errors surface as field-level validation messages
//! rather than JSON rejections.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use medward_auth::{Credentials, Role, UserAccount};
use medward_core::{DepartmentId, DomainResult, MedicationId, TaskId, UserId};
use medward_hospital::{Department, NewDepartment, NewTaskBatch, Task};
use medward_infra::services::DepartmentDetails;
use medward_medication::{MedicationRecord, NewMedication};

// -------------------------
// Medication ledger
// -------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MedicationRequest {
    pub name: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub form: String,
    pub weight: i32,
    pub quantity: i64,
    #[serde(default)]
    pub additional_info: Option<String>,
}

impl MedicationRequest {
    pub fn into_domain(self) -> DomainResult<NewMedication> {
        NewMedication::parse(
            &self.name,
            &self.manufacturer,
            &self.form,
            self.weight,
            self.quantity,
            self.additional_info,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationResponse {
    pub id: MedicationId,
    pub name: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub form: String,
    pub weight: i32,
    pub quantity: i64,
    pub additional_info: Option<String>,
}

impl From<MedicationRecord> for MedicationResponse {
    fn from(record: MedicationRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            manufacturer: record.manufacturer,
            form: record.form.as_str().to_string(),
            weight: record.weight,
            quantity: record.quantity,
            additional_info: record.additional_info,
        }
    }
}

/// Body of `PATCH /api/medication/{id}`: a signed delta, not an absolute value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuantityDelta {
    pub quantity: i64,
}

// -------------------------
// Users
// -------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl CredentialsRequest {
    /// The medication service ignores `role` and always registers plain users.
    pub fn into_forced_user(self) -> DomainResult<Credentials> {
        Credentials::parse(&self.username, &self.password, None, Role::User)
    }

    /// The hospital service takes the role from the request (default `ROLE_USER`).
    pub fn into_credentials(self) -> DomainResult<Credentials> {
        Credentials::parse(
            &self.username,
            &self.password,
            self.role.as_deref(),
            Role::User,
        )
    }
}

/// Password hashes never leave the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departments: Option<Vec<DepartmentResponse>>,
}

impl UserResponse {
    pub fn plain(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            role: account.role,
            departments: None,
        }
    }

    pub fn with_departments(account: &UserAccount, departments: Vec<Department>) -> Self {
        Self {
            departments: Some(departments.into_iter().map(DepartmentResponse::from).collect()),
            ..Self::plain(account)
        }
    }
}

// -------------------------
// Departments
// -------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl DepartmentRequest {
    pub fn into_domain(self) -> DomainResult<NewDepartment> {
        NewDepartment::parse(&self.name, self.description)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepartmentResponse {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
}

impl From<Department> for DepartmentResponse {
    fn from(department: Department) -> Self {
        Self {
            id: department.id,
            name: department.name,
            description: department.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepartmentDetailsResponse {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub tasks: Vec<TaskResponse>,
}

impl From<DepartmentDetails> for DepartmentDetailsResponse {
    fn from(details: DepartmentDetails) -> Self {
        Self {
            id: details.department.id,
            name: details.department.name,
            description: details.department.description,
            tasks: details.tasks.into_iter().map(TaskResponse::from).collect(),
        }
    }
}

/// Body of `PATCH /add-user` and `PATCH /delete-user`.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipRequest {
    pub username: String,
    pub department_id: DepartmentId,
}

// -------------------------
// Tasks
// -------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewTasksRequest {
    pub patient: String,
    pub medication_id: MedicationId,
    pub department_id: DepartmentId,
    pub start_day: NaiveDate,
    #[serde(default)]
    pub time_of_issuing: Vec<NaiveTime>,
    pub amount_of_days: i64,
}

impl NewTasksRequest {
    /// Out-of-range day counts are clamped so that validation reports them.
    pub fn into_domain(self) -> NewTaskBatch {
        NewTaskBatch {
            patient: self.patient,
            medication_id: self.medication_id,
            department_id: self.department_id,
            start_day: self.start_day,
            times_of_issuing: self.time_of_issuing,
            amount_of_days: u32::try_from(self.amount_of_days.max(0)).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskResponse {
    pub id: TaskId,
    pub patient: String,
    pub medication_id: MedicationId,
    pub date_time_of_issue: NaiveDateTime,
    pub department_id: DepartmentId,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            patient: task.patient,
            medication_id: task.medication_id,
            date_time_of_issue: task.date_time_of_issue,
            department_id: task.department_id,
        }
    }
}
