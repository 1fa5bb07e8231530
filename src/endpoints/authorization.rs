// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cross-namespace reference authorization.
//!
//! A `GlobalAccelerator` may point at a Service, Ingress or Gateway in another namespace
//! only when that namespace holds a Gateway API `ReferenceGrant` that:
//!
//! - lists `GlobalAccelerator` from the accelerator's namespace under `from`, and
//! - lists the target's group and kind under `to`, either without a name or with the
//!   target's exact name.
//!
//! Clusters without the Gateway API cannot express a grant, so every cross-namespace
//! reference is denied there.

use super::EndpointReference;
use crate::cluster::ClusterClient;
use crate::constants::{API_GROUP, GATEWAY_API_GROUP, KIND_GLOBAL_ACCELERATOR, NETWORKING_API_GROUP};
use crate::crd::{EndpointType, ReferenceGrant};
use crate::errors::ClusterError;
use tracing::debug;

/// API group and kind a reference targets, as written in `ReferenceGrant.spec.to`.
#[must_use]
pub fn target_group_kind(kind: EndpointType) -> (&'static str, &'static str) {
    match kind {
        EndpointType::Service => ("", "Service"),
        EndpointType::Ingress => (NETWORKING_API_GROUP, "Ingress"),
        EndpointType::Gateway => (GATEWAY_API_GROUP, "Gateway"),
        EndpointType::EndpointId => ("", ""),
    }
}

/// Whether `grant` lets accelerators in `from_namespace` reference the target.
#[must_use]
pub fn grant_allows(
    grant: &ReferenceGrant,
    from_namespace: &str,
    target_kind: EndpointType,
    target_name: &str,
) -> bool {
    let (target_group, target_kind) = target_group_kind(target_kind);

    let from_matches = grant.spec.from.iter().any(|from| {
        from.group == API_GROUP
            && from.kind == KIND_GLOBAL_ACCELERATOR
            && from.namespace == from_namespace
    });

    let to_matches = grant.spec.to.iter().any(|to| {
        to.group == target_group
            && to.kind == target_kind
            && to
                .name
                .as_deref()
                .is_none_or(|name| name.is_empty() || name == target_name)
    });

    from_matches && to_matches
}

/// Decide whether an accelerator in `owner_namespace` may reference `reference`.
///
/// Same-namespace references and direct ARNs are always allowed.
///
/// # Errors
///
/// Returns an error if the grants of the target namespace cannot be listed.
pub async fn is_reference_allowed(
    cluster: &dyn ClusterClient,
    owner_namespace: &str,
    reference: &EndpointReference,
) -> Result<bool, ClusterError> {
    let Some(target_namespace) = reference.namespace() else {
        return Ok(true);
    };
    if target_namespace == owner_namespace {
        return Ok(true);
    }

    if !cluster.has_gateway_api().await {
        debug!(
            reference = %reference,
            "Gateway API not installed; cross-namespace reference denied"
        );
        return Ok(false);
    }

    let grants = cluster.list_reference_grants(target_namespace).await?;
    let allowed = grants
        .iter()
        .any(|grant| grant_allows(grant, owner_namespace, reference.kind(), reference.name()));

    debug!(
        reference = %reference,
        from_namespace = owner_namespace,
        grants = grants.len(),
        allowed,
        "Evaluated cross-namespace reference"
    );

    Ok(allowed)
}

#[cfg(test)]
#[path = "authorization_tests.rs"]
mod authorization_tests;
