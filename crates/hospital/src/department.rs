use serde::{Deserialize, Serialize};

use medward_core::{DepartmentId, DomainResult, Entity, FieldErrors};

/// A hospital department. Users are members through an explicit join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
}

impl Entity for Department {
    type Id = DepartmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Validated create/update payload. `name` is unique across departments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
    pub name: String,
    pub description: Option<String>,
}

impl NewDepartment {
    pub fn parse(name: &str, description: Option<String>) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        let name = name.trim();
        if name.is_empty() {
            errors.add("name", "must not be blank");
        } else if name.len() > 128 {
            errors.add("name", "must be at most 128 characters");
        }
        errors.into_result()?;

        Ok(Self {
            name: name.to_string(),
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }

    pub fn into_department(self, id: DepartmentId) -> Department {
        Department {
            id,
            name: self.name,
            description: self.description,
        }
    }
}
