// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers and the `GlobalAccelerator` status updater.
//!
//! Conditions follow the standard Kubernetes shape:
//! - `type`: the aspect being reported (`Ready`)
//! - `status`: `True`, `False` or `Unknown`
//! - `reason`: CamelCase programmatic identifier
//! - `message`: human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp of the last status flip
//!
//! # Example
//!
//! ```rust,no_run
//! use accelerator_operator::reconcilers::status::create_condition;
//!
//! let condition = create_condition("Ready", "True", "Reconciled", "Model built");
//! assert_eq!(condition.status, "True");
//! ```

use crate::constants::{CONDITION_TYPE_READY, FIELD_MANAGER};
use crate::crd::{Condition, EndpointStatusEntry, GlobalAccelerator, GlobalAcceleratorStatus};
use crate::endpoints::{LoadResult, LoadStatus};
use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Reason of a `Ready=True` condition with every endpoint loaded.
pub const REASON_RECONCILED: &str = "Reconciled";

/// Reason of a `Ready=True` condition where some endpoints were skipped.
pub const REASON_ENDPOINTS_DEGRADED: &str = "EndpointsDegraded";

/// Create a new condition stamped with the current time.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in place.
///
/// `lastTransitionTime` is kept when the status value does not change.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists ignoring `lastTransitionTime`.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && new.iter().all(|new_cond| {
            find_condition(current, &new_cond.r#type).is_some_and(|curr| {
                curr.status == new_cond.status
                    && curr.reason == new_cond.reason
                    && curr.message == new_cond.message
            })
        })
}

/// Per-endpoint status entries in load order.
#[must_use]
pub fn endpoint_status_entries(loaded: &LoadResult) -> Vec<EndpointStatusEntry> {
    loaded
        .endpoints
        .iter()
        .map(|endpoint| EndpointStatusEntry {
            r#type: endpoint.reference.kind(),
            name: endpoint.reference.name().to_string(),
            namespace: endpoint.reference.namespace().map(ToString::to_string),
            status: endpoint.status.as_str().to_string(),
            message: endpoint.message.clone(),
        })
        .collect()
}

/// Reason and message of the `Ready=True` condition for a successful reconciliation.
#[must_use]
pub fn ready_reason(loaded: &LoadResult) -> (&'static str, String) {
    let warnings = loaded.count(LoadStatus::Warning);
    let total = loaded.endpoints.len();
    if warnings == 0 {
        (
            REASON_RECONCILED,
            format!("All {total} endpoint(s) loaded"),
        )
    } else {
        (
            REASON_ENDPOINTS_DEGRADED,
            format!("{warnings} of {total} endpoint(s) skipped"),
        )
    }
}

/// Collects status changes for one `GlobalAccelerator` and applies them in a
/// single patch.
pub struct GlobalAcceleratorStatusUpdater {
    namespace: String,
    name: String,
    current_status: Option<GlobalAcceleratorStatus>,
    new_status: GlobalAcceleratorStatus,
}

impl GlobalAcceleratorStatusUpdater {
    #[must_use]
    pub fn new(ga: &GlobalAccelerator) -> Self {
        let current_status = ga.status.clone();
        let new_status = current_status.clone().unwrap_or_default();

        Self {
            namespace: ga.namespace().unwrap_or_default(),
            name: ga.name_any(),
            current_status,
            new_status,
        }
    }

    pub fn set_condition(&mut self, condition_type: &str, status: &str, reason: &str, message: &str) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            condition_type,
            status,
            reason,
            message,
        );
    }

    /// Mark the accelerator ready or not ready.
    pub fn set_ready(&mut self, ready: bool, reason: &str, message: &str) {
        let status = if ready { "True" } else { "False" };
        self.set_condition(CONDITION_TYPE_READY, status, reason, message);
    }

    pub fn set_endpoints(&mut self, loaded: &LoadResult) {
        self.new_status.endpoints = endpoint_status_entries(loaded);
    }

    pub fn set_accelerator_name(&mut self, name: &str) {
        self.new_status.accelerator_name = Some(name.to_string());
    }

    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    /// Status as it will be written.
    #[must_use]
    pub fn status(&self) -> &GlobalAcceleratorStatus {
        &self.new_status
    }

    /// Returns `true` if the new status differs semantically from the current one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.observed_generation != self.new_status.observed_generation
                    || current.accelerator_name != self.new_status.accelerator_name
                    || current.endpoints != self.new_status.endpoints
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    /// Write the status subresource if anything changed.
    ///
    /// # Errors
    ///
    /// Returns the API error if the patch fails.
    pub async fn apply(&self, client: &Client) -> Result<(), kube::Error> {
        if !self.has_changes() {
            debug!(
                "GlobalAccelerator {}/{} status unchanged, skipping update",
                self.namespace, self.name
            );
            return Ok(());
        }

        let api: Api<GlobalAccelerator> = Api::namespaced(client.clone(), &self.namespace);
        let patch = json!({ "status": self.status() });
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        api.patch_status(&self.name, &params, &Patch::Merge(&patch))
            .await?;

        debug!(
            "Updated GlobalAccelerator {}/{} status: {} endpoint(s)",
            self.namespace,
            self.name,
            self.new_status.endpoints.len()
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
