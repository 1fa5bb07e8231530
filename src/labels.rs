// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Annotation and tag keys used across the operator.
//!
//! This module defines the Ingress annotations read during protocol/port discovery and
//! the AWS tag keys the operator reserves on the accelerators it models.

// ============================================================================
// Ingress Annotations (AWS Load Balancer Controller)
// ============================================================================

/// JSON list of `{"PROTOCOL": port}` objects the ALB listens on
pub const INGRESS_LISTEN_PORTS: &str = "alb.ingress.kubernetes.io/listen-ports";

/// Comma separated ACM certificate ARNs attached to the ALB
pub const INGRESS_CERTIFICATE_ARN: &str = "alb.ingress.kubernetes.io/certificate-arn";

/// Legacy annotation naming the ingress class
pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

// ============================================================================
// Operator Tags
// ============================================================================

/// Tag holding the name of the cluster that owns the accelerator
pub const TAG_CLUSTER: &str = "elbv2.k8s.aws/cluster";

/// Tag holding the kind of resource the accelerator was created for
pub const TAG_RESOURCE: &str = "aga.k8s.aws/resource";

/// Tag holding `namespace/name` of the owning `GlobalAccelerator`
pub const TAG_STACK: &str = "aga.k8s.aws/stack";

/// Tag keys that user-supplied tags may not set
pub const RESERVED_TAG_KEYS: &[&str] = &[TAG_CLUSTER, TAG_RESOURCE, TAG_STACK];

/// Value of [`TAG_RESOURCE`] for accelerators
pub const TAG_RESOURCE_ACCELERATOR: &str = "GlobalAccelerator";
