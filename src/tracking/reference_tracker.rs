// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bidirectional index between accelerators and the resources they reference.
//!
//! Both directions are kept under one lock so that they always agree: a resource
//! lists an owner exactly when that owner lists the resource. Resources with no
//! remaining owners are dropped from the index.

use crate::endpoints::{EndpointReference, OwnerKey, ResourceKey};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct Index {
    owners_by_resource: HashMap<ResourceKey, BTreeSet<OwnerKey>>,
    resources_by_owner: HashMap<OwnerKey, BTreeSet<ResourceKey>>,
}

impl Index {
    fn detach(&mut self, owner: &OwnerKey, resource: &ResourceKey) {
        if let Some(owners) = self.owners_by_resource.get_mut(resource) {
            owners.remove(owner);
            if owners.is_empty() {
                self.owners_by_resource.remove(resource);
            }
        }
    }
}

/// Tracks which accelerators reference which resources.
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    index: Mutex<Index>,
}

impl ReferenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of resources referenced by `owner`.
    pub async fn update_references_for_ga(&self, owner: &OwnerKey, references: &[EndpointReference]) {
        let desired: BTreeSet<ResourceKey> = references.iter().map(EndpointReference::key).collect();

        let mut index = self.index.lock().await;
        let previous = index.resources_by_owner.remove(owner).unwrap_or_default();

        for stale in previous.difference(&desired) {
            index.detach(owner, stale);
        }
        for resource in &desired {
            index
                .owners_by_resource
                .entry(resource.clone())
                .or_default()
                .insert(owner.clone());
        }

        debug!(
            owner = %owner,
            references = desired.len(),
            removed = previous.difference(&desired).count(),
            "Updated accelerator references"
        );

        if !desired.is_empty() {
            index.resources_by_owner.insert(owner.clone(), desired);
        }
    }

    /// Forget every reference held by `owner`.
    pub async fn remove_ga(&self, owner: &OwnerKey) {
        let mut index = self.index.lock().await;
        if let Some(previous) = index.resources_by_owner.remove(owner) {
            for resource in &previous {
                index.detach(owner, resource);
            }
            debug!(owner = %owner, released = previous.len(), "Removed accelerator references");
        }
    }

    pub async fn is_resource_referenced(&self, resource: &ResourceKey) -> bool {
        self.index
            .lock()
            .await
            .owners_by_resource
            .contains_key(resource)
    }

    /// Accelerators referencing `resource`, in sorted order.
    pub async fn get_owners_for_resource(&self, resource: &ResourceKey) -> Vec<OwnerKey> {
        self.index
            .lock()
            .await
            .owners_by_resource
            .get(resource)
            .map(|owners| owners.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Resources referenced by `owner`, in sorted order.
    pub async fn get_resources_for_owner(&self, owner: &OwnerKey) -> Vec<ResourceKey> {
        self.index
            .lock()
            .await
            .resources_by_owner
            .get(owner)
            .map(|resources| resources.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "reference_tracker_tests.rs"]
mod reference_tracker_tests;
