// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reference-counted watches on the resources accelerators depend on.
//!
//! Every watched resource keeps the set of accelerators consuming it. A watch starts
//! when its first consumer arrives and stops when its last consumer leaves, so at any
//! time exactly the resources with at least one consumer are watched.
//!
//! Watched resources are the Services, Ingresses and Gateways an accelerator may
//! reference, loaded or not: a missing resource is watched so its creation triggers a
//! reconciliation. Denied cross-namespace references and direct ARNs are not watched.
//! Gateways are skipped while the Gateway API is not installed.

use super::watcher::{WatchFactory, WatchHandle};
use crate::cluster::ClusterClient;
use crate::crd::EndpointType;
use crate::endpoints::{LoadedEndpoint, OwnerKey, ResourceKey};
use crate::metrics::set_active_watches;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug)]
struct ResourceWatch {
    consumers: BTreeSet<OwnerKey>,
    _handle: WatchHandle,
}

/// Maintains one watch per resource referenced by at least one accelerator.
pub struct EndpointResourcesManager {
    factory: Arc<dyn WatchFactory>,
    cluster: Arc<dyn ClusterClient>,
    watches: Mutex<HashMap<ResourceKey, ResourceWatch>>,
}

impl EndpointResourcesManager {
    #[must_use]
    pub fn new(factory: Arc<dyn WatchFactory>, cluster: Arc<dyn ClusterClient>) -> Self {
        Self {
            factory,
            cluster,
            watches: Mutex::new(HashMap::new()),
        }
    }

    /// Make `owner` consume exactly the watchable resources among `endpoints`.
    pub async fn monitor_endpoint_resources(&self, owner: &OwnerKey, endpoints: &[LoadedEndpoint]) {
        let gateway_api = if endpoints
            .iter()
            .any(|endpoint| endpoint.reference.kind() == EndpointType::Gateway)
        {
            self.cluster.has_gateway_api().await
        } else {
            false
        };

        let desired: BTreeSet<ResourceKey> = endpoints
            .iter()
            .filter(|endpoint| endpoint.reference_allowed)
            .map(LoadedEndpoint::key)
            .filter(|key| match key.kind {
                EndpointType::Service | EndpointType::Ingress => true,
                EndpointType::Gateway => gateway_api,
                EndpointType::EndpointId => false,
            })
            .collect();

        let mut watches = self.watches.lock().await;

        let mut released = 0;
        watches.retain(|key, watch| {
            if desired.contains(key) || !watch.consumers.remove(owner) {
                return true;
            }
            if watch.consumers.is_empty() {
                debug!(resource = %key, "Stopping watch, no consumers left");
                released += 1;
                return false;
            }
            true
        });

        let mut started = 0;
        for key in &desired {
            let watch = watches.entry(key.clone()).or_insert_with(|| {
                debug!(resource = %key, "Starting watch");
                started += 1;
                ResourceWatch {
                    consumers: BTreeSet::new(),
                    _handle: self.factory.start(key),
                }
            });
            watch.consumers.insert(owner.clone());
        }

        if started > 0 || released > 0 {
            info!(
                owner = %owner,
                started,
                stopped = released,
                total = watches.len(),
                "Updated resource watches"
            );
        }
        publish_watch_counts(&watches);
    }

    /// Release every resource consumed by `owner`.
    pub async fn remove_ga(&self, owner: &OwnerKey) {
        let mut watches = self.watches.lock().await;
        let before = watches.len();
        watches.retain(|_, watch| {
            watch.consumers.remove(owner);
            !watch.consumers.is_empty()
        });
        debug!(owner = %owner, stopped = before - watches.len(), "Released resource watches");
        publish_watch_counts(&watches);
    }

    /// Number of live watches.
    pub async fn watch_count(&self) -> usize {
        self.watches.lock().await.len()
    }

    /// Accelerators consuming `key`, in sorted order.
    pub async fn consumers_of(&self, key: &ResourceKey) -> Vec<OwnerKey> {
        self.watches
            .lock()
            .await
            .get(key)
            .map(|watch| watch.consumers.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn publish_watch_counts(watches: &HashMap<ResourceKey, ResourceWatch>) {
    for kind in [EndpointType::Service, EndpointType::Ingress, EndpointType::Gateway] {
        let count = watches.keys().filter(|key| key.kind == kind).count();
        set_active_watches(&kind.to_string(), count);
    }
}

#[cfg(test)]
#[path = "resources_manager_tests.rs"]
mod resources_manager_tests;
