//! Inventory ledger application service (medication service).

use std::sync::Arc;

use tracing::instrument;

use medward_auth::Principal;
use medward_core::{DomainError, DomainResult, MedicationId, Resource};
use medward_medication::{MedicationRecord, NewMedication};

use crate::repositories::MedicationRepository;

/// Ownership-aware access to the medication ledger.
///
/// Admins see and change every record; everyone else only their own.
#[derive(Clone)]
pub struct MedicationService {
    records: Arc<dyn MedicationRepository>,
}

impl MedicationService {
    pub fn new(records: Arc<dyn MedicationRepository>) -> Self {
        Self { records }
    }

    pub async fn list(&self, caller: &Principal) -> DomainResult<Vec<MedicationRecord>> {
        if caller.is_admin() {
            self.records.list().await
        } else {
            self.records.list_by_owner(caller.user_id).await
        }
    }

    pub async fn get(&self, caller: &Principal, id: MedicationId) -> DomainResult<MedicationRecord> {
        let record = self
            .records
            .get(id)
            .await?
            .ok_or(DomainError::not_found(Resource::Medication))?;
        ensure_access(caller, &record)?;
        Ok(record)
    }

    #[instrument(skip(self, caller, new), fields(caller = %caller.username, name = %new.name, weight = new.weight), err)]
    pub async fn create(&self, caller: &Principal, new: NewMedication) -> DomainResult<MedicationRecord> {
        if self
            .records
            .find_by_identity(&new.name, new.weight)
            .await?
            .is_some()
        {
            return Err(DomainError::already_exists(Resource::Medication));
        }
        self.records.insert(new, caller.user_id).await
    }

    /// Create the record keyed by `(name, weight)` or overwrite its other fields.
    ///
    /// Existing records keep their owner; only the owner or an admin may overwrite.
    #[instrument(skip(self, caller, new), fields(caller = %caller.username, name = %new.name, weight = new.weight), err)]
    pub async fn upsert(&self, caller: &Principal, new: NewMedication) -> DomainResult<MedicationRecord> {
        let Some(existing) = self.records.find_by_identity(&new.name, new.weight).await? else {
            return self.records.insert(new, caller.user_id).await;
        };
        ensure_access(caller, &existing)?;

        let updated = MedicationRecord::from_new(existing.id, new, existing.owner);
        self.records.update(&updated).await?;
        Ok(updated)
    }

    /// Apply a signed delta to a record's quantity.
    ///
    /// Fails with `InsufficientQuantity` (and changes nothing) when a negative
    /// delta exceeds what is on hand.
    #[instrument(skip(self, caller), fields(caller = %caller.username, medication_id = %id), err)]
    pub async fn adjust_quantity(
        &self,
        caller: &Principal,
        id: MedicationId,
        delta: i64,
    ) -> DomainResult<i64> {
        self.get(caller, id).await?;
        let quantity = self.records.adjust_quantity(id, delta).await?;
        tracing::info!(delta, quantity, "medication quantity adjusted");
        Ok(quantity)
    }

    /// Idempotent: removing an unknown id succeeds.
    pub async fn delete(&self, caller: &Principal, id: MedicationId) -> DomainResult<()> {
        match self.records.get(id).await? {
            None => Ok(()),
            Some(record) => {
                ensure_access(caller, &record)?;
                self.records.delete(id).await?;
                Ok(())
            }
        }
    }
}

fn ensure_access(caller: &Principal, record: &MedicationRecord) -> DomainResult<()> {
    if record.accessible_by(caller.user_id, caller.is_admin()) {
        Ok(())
    } else {
        Err(DomainError::NoRights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryMedicationRepository;
    use medward_auth::Role;
    use medward_core::UserId;

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(), "someone", role)
    }

    fn new_med(name: &str, quantity: i64) -> NewMedication {
        NewMedication::parse(name, "Acme", "TABLET", 100, quantity, Some("after meals".into())).unwrap()
    }

    fn service() -> MedicationService {
        MedicationService::new(Arc::new(InMemoryMedicationRepository::new()))
    }

    #[tokio::test]
    async fn owners_see_only_their_records() {
        let svc = service();
        let alice = principal(Role::User);
        let bob = principal(Role::User);
        let admin = principal(Role::Admin);

        let a = svc.create(&alice, new_med("A", 1)).await.unwrap();
        svc.create(&bob, new_med("B", 1)).await.unwrap();

        assert_eq!(svc.list(&alice).await.unwrap().len(), 1);
        assert_eq!(svc.list(&admin).await.unwrap().len(), 2);
        assert_eq!(svc.get(&bob, a.id).await, Err(DomainError::NoRights));
        assert!(svc.get(&admin, a.id).await.is_ok());
        assert_eq!(
            svc.get(&alice, MedicationId::new(999)).await,
            Err(DomainError::not_found(Resource::Medication))
        );
    }

    #[tokio::test]
    async fn duplicate_identity_is_rejected_but_upsert_overwrites() {
        let svc = service();
        let alice = principal(Role::User);
        let created = svc.create(&alice, new_med("A", 1)).await.unwrap();

        assert_eq!(
            svc.create(&alice, new_med("A", 7)).await,
            Err(DomainError::already_exists(Resource::Medication))
        );

        let updated = svc.upsert(&alice, new_med("A", 7)).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.quantity, 7);
        assert_eq!(updated.owner, alice.user_id);

        let bob = principal(Role::User);
        assert_eq!(svc.upsert(&bob, new_med("A", 3)).await, Err(DomainError::NoRights));
        let fresh = svc.upsert(&bob, new_med("B", 3)).await.unwrap();
        assert_eq!(fresh.owner, bob.user_id);
    }

    #[tokio::test]
    async fn adjust_quantity_scenarios() {
        let svc = service();
        let alice = principal(Role::User);
        let rec = svc.create(&alice, new_med("A", 10)).await.unwrap();

        assert_eq!(svc.adjust_quantity(&alice, rec.id, -2).await.unwrap(), 8);
        assert_eq!(
            svc.adjust_quantity(&alice, rec.id, -9).await,
            Err(DomainError::InsufficientQuantity { available: 8, requested: 9 })
        );
        assert_eq!(svc.get(&alice, rec.id).await.unwrap().quantity, 8);
        assert_eq!(
            svc.adjust_quantity(&principal(Role::User), rec.id, 1).await,
            Err(DomainError::NoRights)
        );
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let svc = service();
        let alice = principal(Role::User);
        let rec = svc.create(&alice, new_med("A", 1)).await.unwrap();

        assert_eq!(svc.delete(&principal(Role::User), rec.id).await, Err(DomainError::NoRights));
        svc.delete(&alice, rec.id).await.unwrap();
        svc.delete(&alice, rec.id).await.unwrap();
        assert!(svc.list(&alice).await.unwrap().is_empty());
    }
}
