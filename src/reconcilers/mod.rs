// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation for `GlobalAccelerator` resources.
//!
//! # Reconciliation Architecture
//!
//! The operator follows the level-triggered controller pattern:
//!
//! 1. **Load** - Resolve every referenced Service, Ingress, Gateway and ARN
//! 2. **Build** - Translate the accelerator declaration and loaded endpoints into an accelerator model
//! 3. **Track** - Refresh the reference index and the per-resource watches
//! 4. **Deploy** - Hand the model to the configured actuator
//! 5. **Status** - Report per-endpoint results and a `Ready` condition
//!
//! A change to any watched endpoint resource requeues every accelerator that
//! references it.
//!
//! # Available Reconcilers
//!
//! - [`reconcile_globalaccelerator`] - Loads, builds and deploys an accelerator model
//! - [`delete_globalaccelerator`] - Releases references, watches and the finalizer

pub mod finalizers;
pub mod globalaccelerator;
pub mod status;

pub use globalaccelerator::{
    delete_globalaccelerator, error_requeue_interval, reconcile_globalaccelerator,
    AcceleratorReconciler, ApplyOutcome,
};
