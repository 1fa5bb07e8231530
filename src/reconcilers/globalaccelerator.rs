// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `GlobalAccelerator` reconciliation.
//!
//! One pass loads every referenced endpoint, builds the accelerator model, refreshes
//! the reference index and resource watches, hands the model to the actuator and
//! records the outcome in status. Loading always completes before building starts,
//! and the index and watches change only after a successful build.

use super::finalizers::{ensure_finalizer, remove_finalizer};
use super::status::{ready_reason, GlobalAcceleratorStatusUpdater};
use crate::actuator::Actuator;
use crate::builder::ModelBuilder;
use crate::constants::{
    ERROR_REQUEUE_DURATION_SECS, GLOBAL_ACCELERATOR_FINALIZER, RESYNC_INTERVAL_SECS,
};
use crate::context::Context;
use crate::crd::GlobalAccelerator;
use crate::endpoints::{
    extract_endpoint_references, EndpointLoader, EndpointReference, LoadResult, OwnerKey,
};
use crate::errors::ReconcileError;
use crate::model::AcceleratorModel;
use crate::tracking::{EndpointResourcesManager, ReferenceTracker};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one reconciliation pass, before it is written to status.
#[derive(Debug)]
pub struct ApplyOutcome {
    /// Every endpoint as loaded this pass
    pub loaded: LoadResult,
    pub result: Result<AcceleratorModel, ReconcileError>,
}

/// Kubernetes-independent half of the reconciler.
///
/// Holds the long-lived services shared by every reconciliation.
#[derive(Clone)]
pub struct AcceleratorReconciler {
    loader: EndpointLoader,
    builder: ModelBuilder,
    references: Arc<ReferenceTracker>,
    resources: Arc<EndpointResourcesManager>,
    actuator: Arc<dyn Actuator>,
}

impl AcceleratorReconciler {
    #[must_use]
    pub fn new(
        loader: EndpointLoader,
        builder: ModelBuilder,
        references: Arc<ReferenceTracker>,
        resources: Arc<EndpointResourcesManager>,
        actuator: Arc<dyn Actuator>,
    ) -> Self {
        Self {
            loader,
            builder,
            references,
            resources,
            actuator,
        }
    }

    /// Load, build, track and deploy `ga`.
    pub async fn apply(&self, ga: &GlobalAccelerator) -> ApplyOutcome {
        let owner = OwnerKey::from_accelerator(ga);
        let references = extract_endpoint_references(ga);
        debug!(owner = %owner, references = references.len(), "Reconciling accelerator");

        let loaded = self.loader.load_endpoints(&owner, &references).await;
        let result = self.build_and_track(ga, &owner, &references, &loaded).await;

        ApplyOutcome { loaded, result }
    }

    async fn build_and_track(
        &self,
        ga: &GlobalAccelerator,
        owner: &OwnerKey,
        references: &[EndpointReference],
        loaded: &LoadResult,
    ) -> Result<AcceleratorModel, ReconcileError> {
        if loaded.has_fatal() {
            return Err(ReconcileError::FatalEndpoints {
                count: loaded.fatal_errors.len(),
                message: loaded.fatal_errors.join("; "),
            });
        }

        let model = self.builder.build_model(ga, loaded).await?;

        self.references
            .update_references_for_ga(owner, references)
            .await;
        self.resources
            .monitor_endpoint_resources(owner, &loaded.endpoints)
            .await;

        self.actuator
            .deploy(owner, &model)
            .await
            .map_err(ReconcileError::Actuator)?;

        Ok(model)
    }

    /// Release the references, watches and realised model of `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Actuator`] if teardown fails.
    pub async fn cleanup(&self, owner: &OwnerKey) -> Result<(), ReconcileError> {
        self.references.remove_ga(owner).await;
        self.resources.remove_ga(owner).await;
        self.actuator
            .teardown(owner)
            .await
            .map_err(ReconcileError::Actuator)
    }
}

/// Fold an [`ApplyOutcome`] into the pending status.
pub fn record_outcome(
    updater: &mut GlobalAcceleratorStatusUpdater,
    generation: Option<i64>,
    outcome: &ApplyOutcome,
) {
    updater.set_endpoints(&outcome.loaded);
    updater.set_observed_generation(generation);

    match &outcome.result {
        Ok(model) => {
            let (reason, message) = ready_reason(&outcome.loaded);
            updater.set_accelerator_name(&model.name);
            updater.set_ready(true, reason, &message);
        }
        Err(err) => updater.set_ready(false, err.status_reason(), &err.to_string()),
    }
}

/// How long to wait before retrying a failed reconciliation.
///
/// Validation failures wait for the regular resync; editing the accelerator
/// triggers a reconcile anyway.
#[must_use]
pub fn error_requeue_interval(err: &ReconcileError) -> Duration {
    if err.is_validation() {
        Duration::from_secs(RESYNC_INTERVAL_SECS)
    } else {
        Duration::from_secs(ERROR_REQUEUE_DURATION_SECS)
    }
}

/// Reconcile a `GlobalAccelerator`.
///
/// # Errors
///
/// Returns an error when endpoints fail fatally, the model cannot be built, the
/// actuator fails or a Kubernetes API call fails. Status is written before any
/// build or actuator error is returned.
pub async fn reconcile_globalaccelerator(
    ga: Arc<GlobalAccelerator>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    if ga.metadata.deletion_timestamp.is_some() {
        delete_globalaccelerator(&ga, &ctx).await?;
        return Ok(Action::await_change());
    }

    ensure_finalizer(&ctx.client, ga.as_ref(), GLOBAL_ACCELERATOR_FINALIZER).await?;

    let outcome = ctx.reconciler.apply(&ga).await;

    let mut updater = GlobalAcceleratorStatusUpdater::new(&ga);
    record_outcome(&mut updater, ga.metadata.generation, &outcome);
    updater.apply(&ctx.client).await?;

    match outcome.result {
        Ok(model) => {
            info!(
                "Reconciled GlobalAccelerator {}/{} as {}",
                ga.namespace().unwrap_or_default(),
                ga.name_any(),
                model.name
            );
            Ok(Action::requeue(Duration::from_secs(RESYNC_INTERVAL_SECS)))
        }
        Err(err) => {
            warn!(
                "GlobalAccelerator {}/{} not ready: {}",
                ga.namespace().unwrap_or_default(),
                ga.name_any(),
                err
            );
            Err(err)
        }
    }
}

/// Release everything held for a deleted `GlobalAccelerator` and drop its finalizer.
///
/// # Errors
///
/// Returns an error if cleanup or the finalizer patch fails; the finalizer then
/// stays in place and deletion is retried.
pub async fn delete_globalaccelerator(
    ga: &GlobalAccelerator,
    ctx: &Context,
) -> Result<(), ReconcileError> {
    let owner = OwnerKey::from_accelerator(ga);
    info!(owner = %owner, "GlobalAccelerator is being deleted");

    ctx.reconciler.cleanup(&owner).await?;
    remove_finalizer(&ctx.client, ga, GLOBAL_ACCELERATOR_FINALIZER).await?;
    Ok(())
}

#[cfg(test)]
#[path = "globalaccelerator_tests.rs"]
mod globalaccelerator_tests;
