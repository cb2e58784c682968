use core::str::FromStr;

use serde::{Deserialize, Serialize};

use medward_core::{DomainError, DomainResult, Entity, FieldErrors, MedicationId, UserId};

/// Dosage form of a medication.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MedicationForm {
    Tablet,
    Capsule,
    Syrup,
    Injection,
    Ointment,
    Drops,
    Powder,
}

impl MedicationForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedicationForm::Tablet => "TABLET",
            MedicationForm::Capsule => "CAPSULE",
            MedicationForm::Syrup => "SYRUP",
            MedicationForm::Injection => "INJECTION",
            MedicationForm::Ointment => "OINTMENT",
            MedicationForm::Drops => "DROPS",
            MedicationForm::Powder => "POWDER",
        }
    }
}

impl FromStr for MedicationForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TABLET" => Ok(MedicationForm::Tablet),
            "CAPSULE" => Ok(MedicationForm::Capsule),
            "SYRUP" => Ok(MedicationForm::Syrup),
            "INJECTION" => Ok(MedicationForm::Injection),
            "OINTMENT" => Ok(MedicationForm::Ointment),
            "DROPS" => Ok(MedicationForm::Drops),
            "POWDER" => Ok(MedicationForm::Powder),
            other => Err(format!("unknown medication type '{other}'")),
        }
    }
}

/// A medication record in the ledger.
///
/// # Invariants
/// - `quantity >= 0` after every successful operation.
/// - `(name, weight)` is unique across the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationRecord {
    pub id: MedicationId,
    pub name: String,
    pub manufacturer: String,
    pub form: MedicationForm,
    pub weight: i32,
    pub quantity: i64,
    pub additional_info: Option<String>,
    pub owner: UserId,
}

impl MedicationRecord {
    /// Materialize a record from a validated registration.
    pub fn from_new(id: MedicationId, new: NewMedication, owner: UserId) -> Self {
        Self {
            id,
            name: new.name,
            manufacturer: new.manufacturer,
            form: new.form,
            weight: new.weight,
            quantity: new.quantity,
            additional_info: new.additional_info,
            owner,
        }
    }

    /// Whether `caller` may read or change this record.
    pub fn accessible_by(&self, caller: UserId, caller_is_admin: bool) -> bool {
        caller_is_admin || self.owner == caller
    }

    pub fn identity_key(&self) -> (&str, i32) {
        (&self.name, self.weight)
    }
}

impl Entity for MedicationRecord {
    type Id = MedicationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Validated registration (or full update) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedication {
    pub name: String,
    pub manufacturer: String,
    pub form: MedicationForm,
    pub weight: i32,
    pub quantity: i64,
    pub additional_info: Option<String>,
}

impl NewMedication {
    pub fn parse(
        name: &str,
        manufacturer: &str,
        form: &str,
        weight: i32,
        quantity: i64,
        additional_info: Option<String>,
    ) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        if name.trim().is_empty() {
            errors.add("name", "must not be blank");
        }
        if manufacturer.trim().is_empty() {
            errors.add("manufacturer", "must not be blank");
        }
        let form = match form.parse::<MedicationForm>() {
            Ok(f) => Some(f),
            Err(msg) => {
                errors.add("type", msg);
                None
            }
        };
        if weight <= 0 {
            errors.add("weight", "must be greater than 0");
        }
        if quantity < 0 {
            errors.add("quantity", "must not be negative");
        }

        errors.into_result()?;
        Ok(Self {
            name: name.trim().to_string(),
            manufacturer: manufacturer.trim().to_string(),
            form: form.unwrap_or(MedicationForm::Tablet),
            weight,
            quantity,
            additional_info: additional_info.filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Quantity guard: the new quantity after applying a signed `delta`.
///
/// A negative delta whose magnitude exceeds `current` is rejected and nothing
/// changes. Repeated calls apply repeated deltas.
pub fn apply_delta(current: i64, delta: i64) -> DomainResult<i64> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| DomainError::validation("quantity", "quantity overflow"))?;
    if next < 0 {
        return Err(DomainError::InsufficientQuantity {
            available: current,
            requested: i64::try_from(delta.unsigned_abs()).unwrap_or(i64::MAX),
        });
    }
    Ok(next)
}
