// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the `GlobalAccelerator` controller.
//!
//! The controller receives an `Arc<Context>` holding the Kubernetes client and the
//! long-lived services built once at start-up: the reconciler (with its endpoint
//! loader, DNS cache, model builder and actuator) and the reference tracker also
//! used to route endpoint resource events back to their accelerators.

use crate::config::ControllerConfig;
use crate::reconcilers::AcceleratorReconciler;
use crate::tracking::ReferenceTracker;
use kube::Client;
use std::sync::Arc;

/// Shared context passed to every reconciliation.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for finalizer and status patches
    pub client: Client,

    pub config: Arc<ControllerConfig>,

    pub reconciler: AcceleratorReconciler,

    /// Index of which accelerators reference which endpoint resources
    pub references: Arc<ReferenceTracker>,
}
