// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Endpoint group construction and port override validation.
//!
//! Port overrides must satisfy, across all listeners of the accelerator:
//!
//! 1. every override's listener port lies in its own listener's port ranges;
//! 2. inside one endpoint group, listener ports are unique and endpoint ports are unique;
//! 3. no endpoint port lies in any listener's port ranges;
//! 4. an endpoint port used by one listener's overrides is not used by another listener's.
//!
//! Only `Loaded` endpoints become endpoint configurations; the rest are skipped.

use super::listener::ResolvedListener;
use crate::constants::{
    DEFAULT_TRAFFIC_DIAL_PERCENTAGE, MAX_ENDPOINT_WEIGHT, MAX_TRAFFIC_DIAL_PERCENTAGE,
};
use crate::endpoints::{EndpointReference, LoadResult};
use crate::errors::ValidationError;
use crate::model::{EndpointConfiguration, EndpointGroupModel, ResourceRef};
use crate::ports::is_port_in_ranges;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Model type name of listener nodes, used in forward references.
pub const LISTENER_RESOURCE_TYPE: &str = "AWS::GlobalAccelerator::Listener";

/// Validate the port overrides of every endpoint group.
///
/// # Errors
///
/// Returns the first violated rule as a [`ValidationError`].
pub fn validate_port_overrides(listeners: &[ResolvedListener]) -> Result<(), ValidationError> {
    let mut endpoint_port_owner: HashMap<i32, usize> = HashMap::new();

    for (listener_index, listener) in listeners.iter().enumerate() {
        for (group_index, group) in listener.endpoint_groups.iter().enumerate() {
            let mut listener_ports = HashSet::new();
            let mut endpoint_ports = HashSet::new();

            for port_override in group.port_overrides.iter().flatten() {
                if !is_port_in_ranges(port_override.listener_port, &listener.port_ranges) {
                    return Err(ValidationError::ListenerPortOutOfRange {
                        listener: listener_index,
                        listener_port: port_override.listener_port,
                    });
                }

                if !listener_ports.insert(port_override.listener_port) {
                    return Err(ValidationError::DuplicateListenerPort {
                        listener: listener_index,
                        group: group_index,
                        listener_port: port_override.listener_port,
                    });
                }
                if !endpoint_ports.insert(port_override.endpoint_port) {
                    return Err(ValidationError::DuplicateEndpointPort {
                        listener: listener_index,
                        group: group_index,
                        endpoint_port: port_override.endpoint_port,
                    });
                }

                if let Some(conflicting_listener) = listeners
                    .iter()
                    .position(|other| is_port_in_ranges(port_override.endpoint_port, &other.port_ranges))
                {
                    return Err(ValidationError::EndpointPortInListenerRange {
                        listener: listener_index,
                        endpoint_port: port_override.endpoint_port,
                        conflicting_listener,
                    });
                }

                match endpoint_port_owner.get(&port_override.endpoint_port) {
                    Some(&first) if first != listener_index => {
                        return Err(ValidationError::EndpointPortSharedAcrossListeners {
                            endpoint_port: port_override.endpoint_port,
                            first,
                            second: listener_index,
                        });
                    }
                    Some(_) => {}
                    None => {
                        endpoint_port_owner.insert(port_override.endpoint_port, listener_index);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Build the endpoint groups of one listener.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a missing region, traffic dial or weight out of bounds.
pub fn build_endpoint_groups(
    listener_index: usize,
    listener_id: &str,
    listener: &ResolvedListener,
    loaded: &LoadResult,
    owner_namespace: &str,
    default_region: Option<&str>,
) -> Result<Vec<EndpointGroupModel>, ValidationError> {
    let mut groups = Vec::with_capacity(listener.endpoint_groups.len());

    for (group_index, group) in listener.endpoint_groups.iter().enumerate() {
        let region = group
            .region
            .as_deref()
            .filter(|region| !region.is_empty())
            .or(default_region)
            .ok_or(ValidationError::MissingRegion {
                listener: listener_index,
                group: group_index,
            })?
            .to_string();

        let traffic_dial_percentage = group
            .traffic_dial_percentage
            .unwrap_or(DEFAULT_TRAFFIC_DIAL_PERCENTAGE);
        if !(0..=MAX_TRAFFIC_DIAL_PERCENTAGE).contains(&traffic_dial_percentage) {
            return Err(ValidationError::InvalidTrafficDial {
                listener: listener_index,
                group: group_index,
                value: traffic_dial_percentage,
            });
        }

        let mut endpoints: Vec<EndpointConfiguration> = Vec::new();
        for declared in group.endpoints.iter().flatten() {
            if let Some(weight) = declared.weight {
                if !(0..=MAX_ENDPOINT_WEIGHT).contains(&weight) {
                    return Err(ValidationError::InvalidWeight { value: weight });
                }
            }

            let reference = EndpointReference::from_declaration(declared, owner_namespace);
            let Some(arn) = loaded
                .get(&reference.key())
                .filter(|endpoint| endpoint.is_loaded())
                .and_then(|endpoint| endpoint.arn.clone())
            else {
                debug!(endpoint = %reference, "Endpoint not loaded, leaving it out of the group");
                continue;
            };

            if endpoints.iter().any(|existing| existing.endpoint_id == arn) {
                continue;
            }
            endpoints.push(EndpointConfiguration {
                endpoint_id: arn,
                weight: declared.weight,
                client_ip_preservation_enabled: declared.client_ip_preservation_enabled,
            });
        }

        groups.push(EndpointGroupModel {
            id: format!("{listener_id}/EndpointGroup-{group_index}"),
            listener_arn: ResourceRef::arn_of(LISTENER_RESOURCE_TYPE, listener_id),
            region,
            traffic_dial_percentage,
            port_overrides: group.port_overrides.clone().unwrap_or_default(),
            health_check_port: group.health_check_port,
            health_check_protocol: group.health_check_protocol.clone(),
            health_check_path: group.health_check_path.clone(),
            health_check_interval_seconds: group.health_check_interval_seconds,
            threshold_count: group.threshold_count,
            endpoints,
        });
    }

    Ok(groups)
}

#[cfg(test)]
#[path = "endpoint_group_tests.rs"]
mod endpoint_group_tests;
