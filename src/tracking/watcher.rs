// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-resource watches.
//!
//! A watch follows one named object and reports every change on a shared channel as
//! the object's [`ResourceKey`]. The channel's consumer maps keys back to accelerators
//! through the [`ReferenceTracker`](super::ReferenceTracker) and triggers their
//! reconciliation.
//!
//! One generic task ([`spawn_watch`]) serves every watched kind; the factory only picks
//! the type to decode.

use crate::crd::{EndpointType, Gateway};
use crate::endpoints::ResourceKey;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::core::NamespaceResourceScope;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type StopFn = Box<dyn FnOnce() + Send + Sync>;

/// Owner of a running watch. The watch stops when the handle is dropped.
pub struct WatchHandle {
    stop: Option<StopFn>,
}

impl WatchHandle {
    /// Handle aborting `task` on drop.
    #[must_use]
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self::from_fn(move || task.abort())
    }

    /// Handle running `stop` once on drop.
    #[must_use]
    pub fn from_fn(stop: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// Handle with nothing to stop.
    #[must_use]
    pub fn noop() -> Self {
        Self { stop: None }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.stop.is_some())
            .finish()
    }
}

/// Starts watches on single resources.
pub trait WatchFactory: Send + Sync {
    fn start(&self, key: &ResourceKey) -> WatchHandle;
}

/// [`WatchFactory`] watching objects through the Kubernetes API.
#[derive(Clone)]
pub struct KubeWatchFactory {
    client: Client,
    events: UnboundedSender<ResourceKey>,
}

impl KubeWatchFactory {
    #[must_use]
    pub fn new(client: Client, events: UnboundedSender<ResourceKey>) -> Self {
        Self { client, events }
    }
}

impl WatchFactory for KubeWatchFactory {
    fn start(&self, key: &ResourceKey) -> WatchHandle {
        let task = match key.kind {
            EndpointType::Service => {
                spawn_watch::<Service>(self.client.clone(), key.clone(), self.events.clone())
            }
            EndpointType::Ingress => {
                spawn_watch::<Ingress>(self.client.clone(), key.clone(), self.events.clone())
            }
            EndpointType::Gateway => {
                spawn_watch::<Gateway>(self.client.clone(), key.clone(), self.events.clone())
            }
            EndpointType::EndpointId => return WatchHandle::noop(),
        };
        WatchHandle::from_task(task)
    }
}

/// Watch the single object `key` and forward its key on every change.
///
/// The task ends when the receiving side of `events` is closed.
pub fn spawn_watch<K>(client: Client, key: ResourceKey, events: UnboundedSender<ResourceKey>) -> JoinHandle<()>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    tokio::spawn(async move {
        let api: Api<K> = Api::namespaced(client, &key.namespace);
        let config = watcher::Config::default().fields(&format!("metadata.name={}", key.name));
        let mut stream = watcher(api, config).default_backoff().boxed();

        debug!(resource = %key, "Started resource watch");

        while let Some(event) = stream.next().await {
            match event {
                Ok(watcher::Event::Apply(_) | watcher::Event::Delete(_)) => {
                    if events.send(key.clone()).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(resource = %key, error = %err, "Resource watch error"),
            }
        }

        debug!(resource = %key, "Resource watch ended");
    })
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod watcher_tests;
