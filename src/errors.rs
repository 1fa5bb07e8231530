// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the accelerator operator.
//!
//! This module provides specialized error types for:
//! - Kubernetes API lookups of referenced resources
//! - AWS Elastic Load Balancing API calls
//! - Protocol/port auto-discovery
//! - Deterministic validation of the declared accelerator
//!
//! Validation errors are caller-fixable and input-deterministic; every other build
//! failure depends on the environment and is retried by the enclosing reconcile loop.

use crate::crd::Protocol;
use thiserror::Error;

/// Errors returned by the [`ClusterClient`](crate::cluster::ClusterClient) collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// The referenced object does not exist (HTTP 404)
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Any other failure talking to the API server
    #[error("failed to get {kind} {namespace}/{name}: {reason}")]
    Request {
        kind: String,
        namespace: String,
        name: String,
        reason: String,
    },
}

impl ClusterError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors returned by the [`LoadBalancerApi`](crate::cloud::LoadBalancerApi) collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    /// No load balancer carries the DNS name
    #[error("no load balancer found with DNS name {dns_name}")]
    LoadBalancerNotFound { dns_name: String },

    /// The ELBv2 API call failed
    #[error("{operation} failed: {reason}")]
    Request { operation: String, reason: String },
}

/// Errors raised while inferring listener protocols and ports from an endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The same port is exposed under both TCP and UDP
    #[error("port {port} is exposed with both TCP and UDP by {endpoint}; specify listener protocol and port ranges explicitly")]
    AmbiguousProtocol { endpoint: String, port: i32 },

    /// The endpoint exposes no usable port
    #[error("no ports could be discovered from {endpoint}")]
    NoPorts { endpoint: String },

    /// A load balancer listener uses a protocol Global Accelerator cannot carry
    #[error("listener protocol {protocol} of {endpoint} is not supported by auto-discovery")]
    UnsupportedProtocol { endpoint: String, protocol: String },

    /// An annotation could not be parsed
    #[error("invalid annotation {annotation} on {endpoint}: {reason}")]
    InvalidAnnotation {
        endpoint: String,
        annotation: String,
        reason: String,
    },

    /// The endpoint was loaded without a resource snapshot
    #[error("no resource snapshot was captured for {endpoint}")]
    MissingSnapshot { endpoint: String },

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

/// Deterministic, caller-fixable misconfiguration of a `GlobalAccelerator`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener {listener} has no protocol and auto-discovery does not apply ({reason}); specify the protocol explicitly")]
    MissingProtocol { listener: usize, reason: String },

    #[error("listener {listener} has no port ranges and auto-discovery does not apply ({reason}); specify port ranges explicitly")]
    MissingPortRanges { listener: usize, reason: String },

    #[error("listener {listener} has invalid port range {from_port}-{to_port}")]
    InvalidPortRange {
        listener: usize,
        from_port: i32,
        to_port: i32,
    },

    #[error("listeners {first} and {second} both use {protocol} with overlapping port ranges")]
    OverlappingListeners {
        first: usize,
        second: usize,
        protocol: Protocol,
    },

    #[error("port override listener port {listener_port} is not within any listener port range of listener {listener}")]
    ListenerPortOutOfRange { listener: usize, listener_port: i32 },

    #[error("endpoint group {group} of listener {listener} overrides listener port {listener_port} more than once")]
    DuplicateListenerPort {
        listener: usize,
        group: usize,
        listener_port: i32,
    },

    #[error("endpoint group {group} of listener {listener} uses endpoint port {endpoint_port} in more than one port override")]
    DuplicateEndpointPort {
        listener: usize,
        group: usize,
        endpoint_port: i32,
    },

    #[error("port override endpoint port {endpoint_port} of listener {listener} falls within the port ranges of listener {conflicting_listener}")]
    EndpointPortInListenerRange {
        listener: usize,
        endpoint_port: i32,
        conflicting_listener: usize,
    },

    #[error("endpoint port {endpoint_port} is used in port overrides of both listener {first} and listener {second}")]
    EndpointPortSharedAcrossListeners {
        endpoint_port: i32,
        first: usize,
        second: usize,
    },

    #[error("endpoint group {group} of listener {listener} has no region and no default region is configured")]
    MissingRegion { listener: usize, group: usize },

    #[error("endpoint group {group} of listener {listener} has traffic dial percentage {value} outside 0-100")]
    InvalidTrafficDial {
        listener: usize,
        group: usize,
        value: i32,
    },

    #[error("endpoint weight {value} is outside 0-255")]
    InvalidWeight { value: i32 },

    #[error("tag key {key} is reserved by the operator")]
    ReservedTagKey { key: String },
}

/// Failure to build the accelerator resource model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("auto-discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl BuildError {
    /// Returns true when the failure is a deterministic spec misconfiguration.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the Kubernetes status reason code for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "InvalidSpec",
            Self::Discovery(DiscoveryError::Cluster(_) | DiscoveryError::Cloud(_)) => {
                "DiscoveryUnavailable"
            }
            Self::Discovery(_) => "DiscoveryFailed",
        }
    }
}

/// Errors returned by an [`Actuator`](crate::actuator::Actuator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// The model could not be rendered for hand-off
    #[error("failed to render accelerator model for {owner}: {reason}")]
    Render { owner: String, reason: String },

    /// Realising the model failed
    #[error("failed to deploy accelerator for {owner}: {reason}")]
    Deploy { owner: String, reason: String },

    /// Releasing the realised model failed
    #[error("failed to tear down accelerator for {owner}: {reason}")]
    Teardown { owner: String, reason: String },
}

/// Errors surfaced by a reconciliation of a `GlobalAccelerator`.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// One or more endpoints could not be loaded for systemic reasons
    #[error("{count} endpoint(s) failed to load: {message}")]
    FatalEndpoints { count: usize, message: String },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error(transparent)]
    Actuator(#[from] ActuatorError),
}

impl ReconcileError {
    /// Returns true when retrying cannot help until the accelerator itself changes.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Build(err) if err.is_validation())
    }

    /// Returns the Kubernetes status reason code for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::FatalEndpoints { .. } => "EndpointLoadFailed",
            Self::Build(err) => err.status_reason(),
            Self::Kube(_) => "KubernetesApiError",
            Self::Actuator(_) => "ActuatorFailed",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
