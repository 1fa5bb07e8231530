// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for namespaced resources.
//!
//! A finalizer keeps a `GlobalAccelerator` in the API server until its in-memory
//! references, resource watches and realised model have been released.
//!
//! Both helpers write the complete finalizer list with a merge patch, so finalizers
//! owned by other controllers are preserved.

use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::info;

/// Returns `true` if `finalizer` is present on `resource`.
#[must_use]
pub fn has_finalizer<T: ResourceExt>(resource: &T, finalizer: &str) -> bool {
    resource.finalizers().iter().any(|f| f == finalizer)
}

/// Finalizer list of `resource` with `finalizer` appended, or `None` if already present.
#[must_use]
pub fn finalizers_with<T: ResourceExt>(resource: &T, finalizer: &str) -> Option<Vec<String>> {
    if has_finalizer(resource, finalizer) {
        return None;
    }
    let mut finalizers = resource.finalizers().to_vec();
    finalizers.push(finalizer.to_string());
    Some(finalizers)
}

/// Finalizer list of `resource` without `finalizer`, or `None` if it was absent.
#[must_use]
pub fn finalizers_without<T: ResourceExt>(resource: &T, finalizer: &str) -> Option<Vec<String>> {
    if !has_finalizer(resource, finalizer) {
        return None;
    }
    Some(
        resource
            .finalizers()
            .iter()
            .filter(|f| *f != finalizer)
            .cloned()
            .collect(),
    )
}

/// Add `finalizer` to a namespaced resource if it is not already present.
///
/// # Errors
///
/// Returns the API error if the patch fails.
pub async fn ensure_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<(), kube::Error>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned,
{
    let Some(finalizers) = finalizers_with(resource, finalizer) else {
        return Ok(());
    };

    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    info!(
        "Adding finalizer {} to {} {}/{}",
        finalizer,
        T::kind(&()),
        namespace,
        name
    );

    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Remove `finalizer` from a namespaced resource if present.
///
/// # Errors
///
/// Returns the API error if the patch fails.
pub async fn remove_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<(), kube::Error>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned,
{
    let Some(finalizers) = finalizers_without(resource, finalizer) else {
        return Ok(());
    };

    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    info!(
        "Removed finalizer {} from {} {}/{}",
        finalizer,
        T::kind(&()),
        namespace,
        name
    );
    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
