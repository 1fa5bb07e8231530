// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state resource model of one accelerator.
//!
//! The model is a tree: an accelerator owns listeners, a listener owns endpoint groups.
//! Children do not know their parent's cloud identifier at build time, so they hold a
//! [`ResourceRef`] naming the parent's model id and the field that will carry the ARN
//! once the parent exists. Whatever deploys the model resolves those references in
//! creation order.

use crate::crd::{ClientAffinity, IpAddressType, PortOverride, PortRange, Protocol};
use serde::Serialize;
use std::collections::BTreeMap;

/// Model id of the accelerator node.
pub const ACCELERATOR_MODEL_ID: &str = "GlobalAccelerator";

/// Field of a created resource carrying its ARN.
pub const ARN_FIELD: &str = "status.arn";

/// Forward reference to a field of another model node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub resource_type: String,
    pub resource_id: String,
    pub field: String,
}

impl ResourceRef {
    /// Reference to the ARN of the node `resource_id` of type `resource_type`.
    #[must_use]
    pub fn arn_of(resource_type: &str, resource_id: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            field: ARN_FIELD.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorModel {
    pub id: String,
    pub name: String,
    pub ip_address_type: IpAddressType,
    pub enabled: bool,
    pub tags: BTreeMap<String, String>,
    pub listeners: Vec<ListenerModel>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerModel {
    pub id: String,
    pub accelerator_arn: ResourceRef,
    pub protocol: Protocol,
    pub port_ranges: Vec<PortRange>,
    pub client_affinity: ClientAffinity,
    pub endpoint_groups: Vec<EndpointGroupModel>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointGroupModel {
    pub id: String,
    pub listener_arn: ResourceRef,
    pub region: String,
    pub traffic_dial_percentage: i32,
    pub port_overrides: Vec<PortOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_interval_seconds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_count: Option<i32>,
    pub endpoints: Vec<EndpointConfiguration>,
}

/// One endpoint of an endpoint group, identified by load balancer ARN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfiguration {
    pub endpoint_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
    #[serde(rename = "clientIPPreservationEnabled", skip_serializing_if = "Option::is_none")]
    pub client_ip_preservation_enabled: Option<bool>,
}

impl AcceleratorModel {
    /// Every endpoint ARN in the model, in listener/group order.
    #[must_use]
    pub fn endpoint_ids(&self) -> Vec<&str> {
        self.listeners
            .iter()
            .flat_map(|listener| &listener.endpoint_groups)
            .flat_map(|group| &group.endpoints)
            .map(|endpoint| endpoint.endpoint_id.as_str())
            .collect()
    }
}
