// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bookkeeping of which accelerators reference which cluster resources.
//!
//! # Modules
//!
//! - [`events`] - Requeues the owners of a changed endpoint resource
//! - [`reference_tracker`] - Bidirectional owner/resource index used to route change
//!   events back to the accelerators that care
//! - [`resources_manager`] - Reference-counted per-resource watches
//! - [`watcher`] - Watch handles and the Kubernetes-backed watch factory

pub mod events;
pub mod reference_tracker;
pub mod resources_manager;
pub mod watcher;

pub use events::forward_resource_events;
pub use reference_tracker::ReferenceTracker;
pub use resources_manager::EndpointResourcesManager;
pub use watcher::{KubeWatchFactory, WatchFactory, WatchHandle};
