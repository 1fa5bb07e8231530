// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Accelerator Operator - AWS Global Accelerator models for Kubernetes
//!
//! The accelerator operator watches `GlobalAccelerator` custom resources and turns
//! them, together with the Services, Ingresses and Gateways they reference, into
//! an accelerator resource model ready to be realised in AWS.
//!
//! ## Overview
//!
//! - Endpoint loading with cross-namespace authorization through `ReferenceGrant`s
//! - DNS name to load balancer ARN resolution with a TTL cache
//! - Listener auto-discovery from Services, Ingresses, Gateways and ELBv2 listeners
//! - Model building with port range and port override validation
//! - Reference-counted watches on every referenced cluster resource
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definitions owned and consumed by the operator
//! - [`endpoints`] - Endpoint references, loading, authorization and discovery
//! - [`builder`] - Accelerator, listener and endpoint group model building
//! - [`model`] - The accelerator resource model
//! - [`tracking`] - Reference tracker and endpoint resource watches
//! - [`reconcilers`] - `GlobalAccelerator` reconciliation
//! - [`dns_resolver`] - Cached load balancer ARN resolution
//! - [`cluster`] / [`cloud`] - Kubernetes and ELBv2 read access
//!
//! ## Example
//!
//! ```rust,no_run
//! use accelerator_operator::crd::{EndpointType, GlobalAcceleratorEndpoint};
//! use accelerator_operator::endpoints::EndpointReference;
//!
//! let declared = GlobalAcceleratorEndpoint {
//!     r#type: EndpointType::Service,
//!     name: Some("api-nlb".to_string()),
//!     namespace: None,
//!     endpoint_id: None,
//!     weight: None,
//!     client_ip_preservation_enabled: None,
//! };
//! let reference = EndpointReference::from_declaration(&declared, "shop");
//! assert_eq!(reference.to_string(), "Service shop/api-nlb");
//! ```

pub mod actuator;
pub mod builder;
pub mod cloud;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod dns_resolver;
pub mod endpoints;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod model;
pub mod ports;
pub mod reconcilers;
pub mod tracking;

#[cfg(test)]
pub(crate) mod test_utils;
