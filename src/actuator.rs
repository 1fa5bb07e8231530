// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hand-off point between the model builder and whatever realises the model.
//!
//! The operator core never mutates cloud resources. A successful reconciliation
//! produces an [`AcceleratorModel`] and passes it to an [`Actuator`]; deleting a
//! `GlobalAccelerator` calls [`Actuator::teardown`].

use crate::endpoints::OwnerKey;
use crate::errors::ActuatorError;
use crate::model::AcceleratorModel;
use async_trait::async_trait;
use tracing::{debug, info};

/// Consumer of built models.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Realise `model` for `owner`.
    ///
    /// # Errors
    ///
    /// Returns an [`ActuatorError`]; the reconciliation is retried.
    async fn deploy(
        &self,
        owner: &OwnerKey,
        model: &AcceleratorModel,
    ) -> Result<(), ActuatorError>;

    /// Release everything realised for `owner`.
    ///
    /// # Errors
    ///
    /// Returns an [`ActuatorError`]; the finalizer stays in place.
    async fn teardown(&self, owner: &OwnerKey) -> Result<(), ActuatorError>;
}

/// [`Actuator`] that only logs the models it receives.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingActuator;

#[async_trait]
impl Actuator for LoggingActuator {
    async fn deploy(
        &self,
        owner: &OwnerKey,
        model: &AcceleratorModel,
    ) -> Result<(), ActuatorError> {
        let rendered = serde_json::to_string(model).map_err(|err| ActuatorError::Render {
            owner: owner.to_string(),
            reason: err.to_string(),
        })?;

        info!(
            owner = %owner,
            accelerator = %model.name,
            listeners = model.listeners.len(),
            endpoints = model.endpoint_ids().len(),
            "Accelerator model ready"
        );
        debug!(owner = %owner, model = %rendered, "Accelerator model");
        Ok(())
    }

    async fn teardown(&self, owner: &OwnerKey) -> Result<(), ActuatorError> {
        info!(owner = %owner, "Accelerator model released");
        Ok(())
    }
}
