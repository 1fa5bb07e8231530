// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the accelerator operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `GlobalAccelerator` CRD
pub const API_GROUP: &str = "aga.k8s.aws";

/// API version for the `GlobalAccelerator` CRD
pub const API_VERSION: &str = "v1beta1";

/// Kind name for `GlobalAccelerator` resource
pub const KIND_GLOBAL_ACCELERATOR: &str = "GlobalAccelerator";

/// API group of the Gateway API resources (`Gateway`, `ReferenceGrant`)
pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";

/// API group/version probed to decide whether the Gateway API is installed
pub const GATEWAY_API_GROUP_VERSION: &str = "gateway.networking.k8s.io/v1";

/// API group of `Ingress` and `IngressClass`
pub const NETWORKING_API_GROUP: &str = "networking.k8s.io";

/// API group of the load balancer controller's `IngressClassParams`
pub const ELBV2_API_GROUP: &str = "elbv2.k8s.aws";

/// Kind name for `IngressClassParams`
pub const KIND_INGRESS_CLASS_PARAMS: &str = "IngressClassParams";

/// Finalizer placed on `GlobalAccelerator` resources
pub const GLOBAL_ACCELERATOR_FINALIZER: &str = "aga.k8s.aws/resources";

// ============================================================================
// Port Constants
// ============================================================================

/// Lowest valid listener port
pub const MIN_PORT: i32 = 1;

/// Highest valid listener port
pub const MAX_PORT: i32 = 65535;

/// Port discovered for an Ingress that terminates TLS
pub const INGRESS_HTTPS_PORT: i32 = 443;

/// Port discovered for an Ingress without TLS
pub const INGRESS_HTTP_PORT: i32 = 80;

// ============================================================================
// Endpoint Group Constants
// ============================================================================

/// Traffic dial percentage applied when an endpoint group does not set one
pub const DEFAULT_TRAFFIC_DIAL_PERCENTAGE: i32 = 100;

/// Highest traffic dial percentage
pub const MAX_TRAFFIC_DIAL_PERCENTAGE: i32 = 100;

/// Highest endpoint weight accepted by Global Accelerator
pub const MAX_ENDPOINT_WEIGHT: i32 = 255;

// ============================================================================
// Accelerator Naming Constants
// ============================================================================

/// Maximum length of an accelerator name
pub const MAX_ACCELERATOR_NAME_LEN: usize = 64;

/// Prefix of generated accelerator names
pub const GENERATED_NAME_PREFIX: &str = "k8s";

/// Characters of namespace/name kept in a generated accelerator name
pub const GENERATED_NAME_SEGMENT_LEN: usize = 8;

/// Hex characters of the content hash kept in a generated accelerator name
pub const GENERATED_NAME_HASH_LEN: usize = 10;

// ============================================================================
// DNS Resolution Constants
// ============================================================================

/// Default lifetime of a DNS name to load balancer ARN cache entry (5 minutes)
pub const DEFAULT_DNS_CACHE_TTL_SECS: u64 = 300;

/// Hostname fragment identifying the Application Load Balancer provisioned for an Ingress.
///
/// An Ingress may carry a second hostname (a fronting Network Load Balancer); only the
/// hostname containing this fragment is used.
pub const INGRESS_PRIMARY_HOSTNAME_MARKER: &str = ".elb.amazonaws.com";

/// Gateway status address type carrying a DNS name
pub const GATEWAY_ADDRESS_TYPE_HOSTNAME: &str = "Hostname";

/// Upper bound on loading a single endpoint (cluster lookups plus ARN resolution)
pub const ENDPOINT_LOAD_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Controller Constants
// ============================================================================

/// Requeue interval after a successful reconciliation (10 minutes)
pub const RESYNC_INTERVAL_SECS: u64 = 600;

/// Requeue interval after a failed reconciliation (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Default bind address of the metrics HTTP server
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Page size for Kubernetes list operations
pub const KUBE_LIST_PAGE_SIZE: u32 = 100;

/// Field manager used for status patches
pub const FIELD_MANAGER: &str = "accelerator-operator";

/// Condition type summarising reconciliation health
pub const CONDITION_TYPE_READY: &str = "Ready";
