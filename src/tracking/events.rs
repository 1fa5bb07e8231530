// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Routing of endpoint resource changes to the accelerators that reference them.

use crate::crd::GlobalAccelerator;
use crate::endpoints::ResourceKey;
use crate::tracking::ReferenceTracker;
use futures::channel::mpsc::UnboundedSender;
use kube::runtime::reflector::ObjectRef;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

/// Queue every owner of a changed resource for reconciliation.
///
/// Changes to resources no accelerator references are dropped. Returns when the event
/// channel closes or the controller stops listening.
pub async fn forward_resource_events(
    mut events: UnboundedReceiver<ResourceKey>,
    references: Arc<ReferenceTracker>,
    triggers: UnboundedSender<ObjectRef<GlobalAccelerator>>,
) {
    while let Some(key) = events.recv().await {
        let owners = references.get_owners_for_resource(&key).await;
        if owners.is_empty() {
            debug!(resource = %key, "Ignoring change to unreferenced resource");
            continue;
        }

        for owner in owners {
            debug!(resource = %key, owner = %owner, "Endpoint resource changed, requeueing owner");
            if triggers.unbounded_send(owner.object_ref()).is_err() {
                warn!("Controller trigger channel closed");
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod events_tests;
