//! Client side of the inventory ledger, as used by the hospital service.
//!
//! Every quantity change is a single `PATCH {base}/{id}` carrying a signed delta.
//! Remote statuses collapse into a closed set of [`InventoryFailure`] kinds; a
//! non-success is never swallowed here, the caller decides what to abort.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

use medward_core::{DomainError, InventoryFailure, MedicationId};

use crate::config::InventoryClientConfig;
use crate::repositories::MedicationRepository;

#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Apply a signed delta to a remote ledger record.
    async fn adjust_remote_quantity(
        &self,
        medication_id: MedicationId,
        delta: i64,
    ) -> Result<(), InventoryFailure>;

    /// Take `quantity` units (a positive count) out of the ledger.
    async fn reserve(&self, medication_id: MedicationId, quantity: i64) -> Result<(), InventoryFailure> {
        self.adjust_remote_quantity(medication_id, -quantity).await
    }

    /// Give `quantity` units (a positive count) back to the ledger.
    async fn release(&self, medication_id: MedicationId, quantity: i64) -> Result<(), InventoryFailure> {
        self.adjust_remote_quantity(medication_id, quantity).await
    }
}

/// Map a remote HTTP status to an outcome.
pub fn outcome_for_status(status: u16) -> Result<(), InventoryFailure> {
    match status {
        200..=299 => Ok(()),
        400 => Err(InventoryFailure::BadRequest),
        401 => Err(InventoryFailure::Unauthorized),
        403 => Err(InventoryFailure::Forbidden),
        404 => Err(InventoryFailure::NotFound),
        other => Err(InventoryFailure::Unknown(format!("unexpected status {other}"))),
    }
}

/// `reqwest`-backed client authenticating with HTTP basic credentials.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpInventoryClient {
    pub fn new(config: &InventoryClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn record_url(&self, medication_id: MedicationId) -> String {
        format!("{}/{}", self.base_url, medication_id)
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    #[instrument(skip(self), fields(medication_id = %medication_id), err)]
    async fn adjust_remote_quantity(
        &self,
        medication_id: MedicationId,
        delta: i64,
    ) -> Result<(), InventoryFailure> {
        let response = self
            .http
            .patch(self.record_url(medication_id))
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({ "quantity": delta }))
            .send()
            .await
            .map_err(|e| InventoryFailure::Unknown(format!("transport error: {e}")))?;

        outcome_for_status(response.status().as_u16())
    }
}

/// In-process client that applies deltas straight to a ledger repository.
///
/// Used by tests and single-process demos; it reproduces the status mapping the
/// HTTP ledger would produce and records every delta it was asked to apply.
pub struct LocalInventoryClient<R> {
    ledger: R,
    calls: Mutex<Vec<(MedicationId, i64)>>,
    forced_failure: Mutex<Option<InventoryFailure>>,
}

impl<R: MedicationRepository> LocalInventoryClient<R> {
    pub fn new(ledger: R) -> Self {
        Self {
            ledger,
            calls: Mutex::new(Vec::new()),
            forced_failure: Mutex::new(None),
        }
    }

    pub fn ledger(&self) -> &R {
        &self.ledger
    }

    /// Every delta requested so far, successful or not.
    pub fn calls(&self) -> Vec<(MedicationId, i64)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Make every following call fail with `failure` (or succeed again with `None`).
    pub fn force_failure(&self, failure: Option<InventoryFailure>) {
        if let Ok(mut slot) = self.forced_failure.lock() {
            *slot = failure;
        }
    }
}

#[async_trait]
impl<R: MedicationRepository> InventoryClient for LocalInventoryClient<R> {
    async fn adjust_remote_quantity(
        &self,
        medication_id: MedicationId,
        delta: i64,
    ) -> Result<(), InventoryFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((medication_id, delta));
        }
        let forced = self.forced_failure.lock().ok().and_then(|f| f.clone());
        if let Some(failure) = forced {
            return Err(failure);
        }

        match self.ledger.adjust_quantity(medication_id, delta).await {
            Ok(_) => Ok(()),
            Err(err) => Err(match err {
                DomainError::NotFound(_) => InventoryFailure::NotFound,
                DomainError::InsufficientQuantity { .. } | DomainError::Validation(_) => {
                    InventoryFailure::BadRequest
                }
                other => InventoryFailure::Unknown(other.to_string()),
            }),
        }
    }
}
