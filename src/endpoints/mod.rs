// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Endpoint references, their loaded form, and the identities used to track them.
//!
//! A `GlobalAccelerator` names its endpoints declaratively. This module turns those
//! declarations into [`EndpointReference`]s, and the [`loader`] turns references into
//! [`LoadedEndpoint`]s carrying a load balancer ARN and a [`LoadStatus`]:
//!
//! - `Loaded` - the ARN is known and the endpoint is modeled
//! - `Warning` - the endpoint is skipped (missing, not authorized, no load balancer yet)
//!   while the rest of the accelerator proceeds
//! - `Fatal` - a systemic failure; the whole reconciliation is aborted and retried
//!
//! # Modules
//!
//! - [`loader`] - Loads references against the cluster and the DNS resolver
//! - [`authorization`] - Cross-namespace `ReferenceGrant` checks
//! - [`discovery`] - Listener protocol and port inference from a loaded endpoint

pub mod authorization;
pub mod discovery;
pub mod loader;

pub use loader::{EndpointLoader, LoadResult};

use crate::crd::{EndpointType, Gateway, GlobalAccelerator};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::reflector::ObjectRef;
use kube::ResourceExt;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Identity of a `GlobalAccelerator`: the consumer of referenced resources.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerKey {
    pub namespace: String,
    pub name: String,
}

impl OwnerKey {
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn from_accelerator(ga: &GlobalAccelerator) -> Self {
        Self::new(&ga.namespace().unwrap_or_default(), &ga.name_any())
    }

    /// Controller reference used to queue this accelerator for reconciliation.
    #[must_use]
    pub fn object_ref(&self) -> ObjectRef<GlobalAccelerator> {
        ObjectRef::new(&self.name).within(&self.namespace)
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Identity of a referenced resource.
///
/// Direct ARN endpoints use an empty namespace and the ARN as name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub kind: EndpointType,
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    #[must_use]
    pub fn new(kind: EndpointType, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {}", self.kind, self.name)
        } else {
            write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
        }
    }
}

/// A resolved pointer to one endpoint.
///
/// Cluster references always carry the namespace they resolve in; an omitted namespace
/// in the declaration becomes the accelerator's namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EndpointReference {
    Service { namespace: String, name: String },
    Ingress { namespace: String, name: String },
    Gateway { namespace: String, name: String },
    /// A load balancer ARN given directly
    EndpointId { arn: String },
}

impl EndpointReference {
    /// Build a reference from one endpoint declaration.
    #[must_use]
    pub fn from_declaration(
        endpoint: &crate::crd::GlobalAcceleratorEndpoint,
        default_namespace: &str,
    ) -> Self {
        let namespace = endpoint
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| default_namespace.to_string());
        let name = endpoint.name.clone().unwrap_or_default();

        match endpoint.r#type {
            EndpointType::Service => Self::Service { namespace, name },
            EndpointType::Ingress => Self::Ingress { namespace, name },
            EndpointType::Gateway => Self::Gateway { namespace, name },
            EndpointType::EndpointId => Self::EndpointId {
                arn: endpoint.endpoint_id.clone().unwrap_or_default(),
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> EndpointType {
        match self {
            Self::Service { .. } => EndpointType::Service,
            Self::Ingress { .. } => EndpointType::Ingress,
            Self::Gateway { .. } => EndpointType::Gateway,
            Self::EndpointId { .. } => EndpointType::EndpointId,
        }
    }

    /// Namespace of a cluster reference; `None` for direct ARNs.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Service { namespace, .. }
            | Self::Ingress { namespace, .. }
            | Self::Gateway { namespace, .. } => Some(namespace),
            Self::EndpointId { .. } => None,
        }
    }

    /// Resource name, or the ARN for direct references.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Service { name, .. } | Self::Ingress { name, .. } | Self::Gateway { name, .. } => {
                name
            }
            Self::EndpointId { arn } => arn,
        }
    }

    #[must_use]
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind(), self.namespace().unwrap_or_default(), self.name())
    }
}

impl fmt::Display for EndpointReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Classification of a load attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    Loaded,
    Warning,
    Fatal,
}

impl LoadStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Loaded => "Loaded",
            LoadStatus::Warning => "Warning",
            LoadStatus::Fatal => "Fatal",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of the resource an endpoint was loaded from, kept for discovery.
#[derive(Clone, Debug)]
pub enum ResourceSnapshot {
    Service(Arc<Service>),
    Ingress(Arc<Ingress>),
    Gateway(Arc<Gateway>),
}

/// Result of loading one [`EndpointReference`].
#[derive(Clone, Debug)]
pub struct LoadedEndpoint {
    pub reference: EndpointReference,
    pub status: LoadStatus,
    /// Load balancer ARN; set only when `status` is `Loaded`
    pub arn: Option<String>,
    /// DNS name the ARN was resolved from
    pub dns_name: Option<String>,
    /// Human-readable reason for `Warning` and `Fatal`
    pub message: Option<String>,
    pub snapshot: Option<ResourceSnapshot>,
    /// False when a cross-namespace reference was denied
    pub reference_allowed: bool,
}

impl LoadedEndpoint {
    #[must_use]
    pub fn loaded(reference: EndpointReference, arn: String) -> Self {
        Self {
            reference,
            status: LoadStatus::Loaded,
            arn: Some(arn),
            dns_name: None,
            message: None,
            snapshot: None,
            reference_allowed: true,
        }
    }

    #[must_use]
    pub fn warning(reference: EndpointReference, message: impl Into<String>) -> Self {
        Self {
            reference,
            status: LoadStatus::Warning,
            arn: None,
            dns_name: None,
            message: Some(message.into()),
            snapshot: None,
            reference_allowed: true,
        }
    }

    #[must_use]
    pub fn fatal(reference: EndpointReference, message: impl Into<String>) -> Self {
        Self {
            status: LoadStatus::Fatal,
            ..Self::warning(reference, message)
        }
    }

    #[must_use]
    pub fn key(&self) -> ResourceKey {
        self.reference.key()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.status == LoadStatus::Loaded
    }
}

/// Collect the unique endpoint references of an accelerator, in declaration order.
#[must_use]
pub fn extract_endpoint_references(ga: &GlobalAccelerator) -> Vec<EndpointReference> {
    let default_namespace = ga.namespace().unwrap_or_default();
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    let endpoints = ga
        .spec
        .listeners
        .iter()
        .flatten()
        .flat_map(|listener| listener.endpoint_groups.iter().flatten())
        .flat_map(|group| group.endpoints.iter().flatten());

    for endpoint in endpoints {
        let reference = EndpointReference::from_declaration(endpoint, &default_namespace);
        if seen.insert(reference.clone()) {
            references.push(reference);
        }
    }

    references
}
