// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) owned and consumed by the operator.
//!
//! # Owned
//!
//! - [`GlobalAccelerator`] - Declares an accelerator, its listeners, endpoint groups and
//!   the cluster resources (Service, Ingress, Gateway) or load balancer ARNs that receive
//!   the accelerated traffic.
//!
//! # Consumed
//!
//! Kinds not covered by `k8s-openapi` are declared here with only the fields the
//! operator reads:
//!
//! - [`Gateway`] - Gateway API gateway (listeners and status addresses)
//! - [`ReferenceGrant`] - Gateway API cross-namespace reference grant
//! - [`IngressClassParams`] - AWS Load Balancer Controller ingress class parameters
//!
//! # Example
//!
//! ```yaml
//! apiVersion: aga.k8s.aws/v1beta1
//! kind: GlobalAccelerator
//! metadata:
//!   name: web
//!   namespace: shop
//! spec:
//!   ipAddressType: IPV4
//!   listeners:
//!     - protocol: TCP
//!       portRanges:
//!         - fromPort: 443
//!           toPort: 443
//!       endpointGroups:
//!         - region: us-west-2
//!           endpoints:
//!             - type: Service
//!               name: web-nlb
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g. Ready).
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

// ============================================================================
// GlobalAccelerator
// ============================================================================

/// Transport protocol of an accelerator listener.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

/// IP addressing mode of the accelerator.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum IpAddressType {
    #[default]
    #[serde(rename = "IPV4")]
    Ipv4,
    #[serde(rename = "DUAL_STACK")]
    DualStack,
}

impl fmt::Display for IpAddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpAddressType::Ipv4 => write!(f, "IPV4"),
            IpAddressType::DualStack => write!(f, "DUAL_STACK"),
        }
    }
}

/// Client affinity of a listener.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ClientAffinity {
    #[default]
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "SOURCE_IP")]
    SourceIp,
}

/// Kind of resource an endpoint declaration points at.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointType {
    Service,
    Ingress,
    Gateway,
    #[serde(rename = "EndpointID")]
    EndpointId,
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointType::Service => write!(f, "Service"),
            EndpointType::Ingress => write!(f, "Ingress"),
            EndpointType::Gateway => write!(f, "Gateway"),
            EndpointType::EndpointId => write!(f, "EndpointID"),
        }
    }
}

/// Inclusive range of listener ports.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct PortRange {
    #[schemars(range(min = 1, max = 65535))]
    pub from_port: i32,
    #[schemars(range(min = 1, max = 65535))]
    pub to_port: i32,
}

impl PortRange {
    #[must_use]
    pub fn new(from_port: i32, to_port: i32) -> Self {
        Self { from_port, to_port }
    }

    #[must_use]
    pub fn single(port: i32) -> Self {
        Self::new(port, port)
    }
}

/// Maps a listener port to a different port on the endpoints.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortOverride {
    #[schemars(range(min = 1, max = 65535))]
    pub listener_port: i32,
    #[schemars(range(min = 1, max = 65535))]
    pub endpoint_port: i32,
}

/// One endpoint declaration inside an endpoint group.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAcceleratorEndpoint {
    /// Kind of the referenced resource.
    pub r#type: EndpointType,

    /// Name of the Service, Ingress or Gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Namespace of the referenced resource. Defaults to the accelerator's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Load balancer ARN, used when `type` is `EndpointID`.
    #[serde(default, rename = "endpointID", skip_serializing_if = "Option::is_none")]
    pub endpoint_id: Option<String>,

    /// Relative weight of the endpoint inside its group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0, max = 255))]
    pub weight: Option<i32>,

    /// Whether the client IP address is preserved towards the endpoint.
    #[serde(
        default,
        rename = "clientIPPreservationEnabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_ip_preservation_enabled: Option<bool>,
}

/// Regional group of endpoints under a listener.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAcceleratorEndpointGroup {
    /// AWS region of the endpoints. Defaults to the controller's region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Percentage of traffic dialed to this group (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0, max = 100))]
    pub traffic_dial_percentage: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_overrides: Option<Vec<PortOverride>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_interval_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<GlobalAcceleratorEndpoint>>,
}

/// Accelerator listener.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAcceleratorListener {
    /// Listener protocol. Discovered from the endpoint when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,

    /// Listener port ranges. Discovered from the endpoint when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_ranges: Option<Vec<PortRange>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_affinity: Option<ClientAffinity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_groups: Option<Vec<GlobalAcceleratorEndpointGroup>>,
}

/// `GlobalAccelerator` declares an AWS Global Accelerator fronting cluster load balancers.
///
/// # Example
///
/// ```yaml
/// apiVersion: aga.k8s.aws/v1beta1
/// kind: GlobalAccelerator
/// metadata:
///   name: api
///   namespace: shop
/// spec:
///   listeners:
///     - endpointGroups:
///         - endpoints:
///             - type: Service
///               name: api-nlb
/// ```
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "aga.k8s.aws",
    version = "v1beta1",
    kind = "GlobalAccelerator",
    namespaced,
    doc = "GlobalAccelerator declares an AWS Global Accelerator with listeners and endpoint groups whose endpoints are Services, Ingresses, Gateways or load balancer ARNs."
)]
#[kube(status = "GlobalAcceleratorStatus")]
#[serde(rename_all = "camelCase")]
pub struct GlobalAcceleratorSpec {
    /// Accelerator name. Generated from the cluster, namespace and name when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(regex(pattern = r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,62}[a-zA-Z0-9])?$"))]
    pub name: Option<String>,

    /// IP addressing mode; IPV4 when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address_type: Option<IpAddressType>,

    /// Additional AWS tags for the accelerator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listeners: Option<Vec<GlobalAcceleratorListener>>,
}

/// Resolution outcome of one endpoint, as reported in status.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatusEntry {
    pub r#type: EndpointType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Loaded, Warning or Fatal.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GlobalAccelerator` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAcceleratorStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Name the accelerator was modeled with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerator_name: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<EndpointStatusEntry>,
}

// ============================================================================
// Gateway API (consumed)
// ============================================================================

/// Gateway API `Gateway`, reduced to the fields read during endpoint loading.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gateway.networking.k8s.io",
    version = "v1",
    kind = "Gateway",
    namespaced
)]
#[kube(status = "GatewayStatus")]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    pub gateway_class_name: String,
    #[serde(default)]
    pub listeners: Vec<GatewayListener>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayListener {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub port: i32,
    pub protocol: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    #[serde(default)]
    pub addresses: Vec<GatewayStatusAddress>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatusAddress {
    /// `IPAddress` or `Hostname`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    pub value: String,
}

/// Gateway API `ReferenceGrant`, granting cross-namespace references into its namespace.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gateway.networking.k8s.io",
    version = "v1beta1",
    kind = "ReferenceGrant",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceGrantSpec {
    pub from: Vec<ReferenceGrantFrom>,
    pub to: Vec<ReferenceGrantTo>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ReferenceGrantFrom {
    pub group: String,
    pub kind: String,
    pub namespace: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ReferenceGrantTo {
    pub group: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ============================================================================
// AWS Load Balancer Controller (consumed)
// ============================================================================

/// Cluster-scoped `IngressClassParams` referenced from an `IngressClass`.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(group = "elbv2.k8s.aws", version = "v1beta1", kind = "IngressClassParams")]
#[serde(rename_all = "camelCase")]
pub struct IngressClassParamsSpec {
    /// ACM certificate ARNs applied to every Ingress of the class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_arn: Option<Vec<String>>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
