// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Listener resolution: explicit listeners, auto-discovered listeners, and port range
//! validation.
//!
//! A listener missing its protocol or port ranges is filled in from its endpoint, which
//! is only possible when the accelerator declares a single listener with a single
//! endpoint group holding a single `Loaded` endpoint. Discovery may turn that one
//! declared listener into one listener per discovered protocol:
//!
//! | Declared | Result |
//! |----------|--------|
//! | protocol and ports | as declared |
//! | neither | one listener per discovered protocol, ports consolidated |
//! | protocol only | the discovered ports of that protocol |
//! | ports only | one listener per discovered protocol, declared ports |

use crate::cloud::LoadBalancerApi;
use crate::cluster::ClusterClient;
use crate::constants::{MAX_PORT, MIN_PORT};
use crate::crd::{
    ClientAffinity, GlobalAcceleratorEndpointGroup, GlobalAcceleratorListener, PortRange, Protocol,
};
use crate::endpoints::discovery::{discover_listeners, DiscoveredListener};
use crate::endpoints::{EndpointReference, LoadResult, LoadedEndpoint};
use crate::errors::{BuildError, DiscoveryError, ValidationError};
use crate::ports::{consolidate_port_ranges, ranges_overlap};
use tracing::info;

/// A listener with protocol and ports settled.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedListener {
    pub protocol: Protocol,
    pub port_ranges: Vec<PortRange>,
    pub client_affinity: ClientAffinity,
    pub endpoint_groups: Vec<GlobalAcceleratorEndpointGroup>,
}

/// Resolve every declared listener and validate the result.
///
/// # Errors
///
/// Returns a validation error for unusable port ranges, overlapping listeners, or a
/// listener that needs discovery when discovery does not apply, and a discovery error
/// when inference fails.
pub async fn resolve_listeners(
    declared: &[GlobalAcceleratorListener],
    loaded: &LoadResult,
    owner_namespace: &str,
    cluster: &dyn ClusterClient,
    cloud: &dyn LoadBalancerApi,
) -> Result<Vec<ResolvedListener>, BuildError> {
    let mut resolved = Vec::with_capacity(declared.len());

    for (index, listener) in declared.iter().enumerate() {
        let declared_ranges = listener
            .port_ranges
            .clone()
            .filter(|ranges| !ranges.is_empty());
        let client_affinity = listener.client_affinity.unwrap_or_default();
        let endpoint_groups = listener.endpoint_groups.clone().unwrap_or_default();

        if let (Some(protocol), Some(port_ranges)) = (listener.protocol, declared_ranges.clone()) {
            resolved.push(ResolvedListener {
                protocol,
                port_ranges,
                client_affinity,
                endpoint_groups,
            });
            continue;
        }

        let endpoint = match auto_discovery_endpoint(declared, loaded, owner_namespace) {
            Ok(endpoint) => endpoint,
            Err(reason) if listener.protocol.is_none() => {
                return Err(ValidationError::MissingProtocol {
                    listener: index,
                    reason,
                }
                .into());
            }
            Err(reason) => {
                return Err(ValidationError::MissingPortRanges {
                    listener: index,
                    reason,
                }
                .into());
            }
        };

        let discovered = discover_listeners(endpoint, cluster, cloud).await?;
        info!(
            listener = index,
            endpoint = %endpoint.reference,
            protocols = discovered.len(),
            "Auto-discovered listener configuration"
        );

        let synthesized = synthesize(listener.protocol, declared_ranges, discovered, endpoint)?;
        resolved.extend(synthesized.into_iter().map(|(protocol, port_ranges)| ResolvedListener {
            protocol,
            port_ranges,
            client_affinity,
            endpoint_groups: endpoint_groups.clone(),
        }));
    }

    validate_listeners(&resolved)?;
    Ok(resolved)
}

fn synthesize(
    protocol: Option<Protocol>,
    declared_ranges: Option<Vec<PortRange>>,
    discovered: Vec<DiscoveredListener>,
    endpoint: &LoadedEndpoint,
) -> Result<Vec<(Protocol, Vec<PortRange>)>, DiscoveryError> {
    match (protocol, declared_ranges) {
        (Some(protocol), _) => discovered
            .into_iter()
            .find(|listener| listener.protocol == protocol)
            .map(|listener| vec![(protocol, consolidate_port_ranges(&listener.ports))])
            .ok_or_else(|| DiscoveryError::NoPorts {
                endpoint: format!("{} for protocol {protocol}", endpoint.reference),
            }),
        (None, Some(ranges)) => Ok(discovered
            .into_iter()
            .map(|listener| (listener.protocol, ranges.clone()))
            .collect()),
        (None, None) => Ok(discovered
            .into_iter()
            .map(|listener| (listener.protocol, consolidate_port_ranges(&listener.ports)))
            .collect()),
    }
}

/// The single endpoint auto-discovery may read from, or the reason there is none.
///
/// # Errors
///
/// Returns a human-readable reason when the accelerator does not declare exactly one
/// listener, endpoint group and endpoint, or that endpoint is not `Loaded`.
pub fn auto_discovery_endpoint<'a>(
    declared: &[GlobalAcceleratorListener],
    loaded: &'a LoadResult,
    owner_namespace: &str,
) -> Result<&'a LoadedEndpoint, String> {
    let [listener] = declared else {
        return Err(format!(
            "auto-discovery requires exactly one listener, found {}",
            declared.len()
        ));
    };
    let groups = listener.endpoint_groups.as_deref().unwrap_or_default();
    let [group] = groups else {
        return Err(format!(
            "auto-discovery requires exactly one endpoint group, found {}",
            groups.len()
        ));
    };
    let endpoints = group.endpoints.as_deref().unwrap_or_default();
    let [endpoint] = endpoints else {
        return Err(format!(
            "auto-discovery requires exactly one endpoint, found {}",
            endpoints.len()
        ));
    };

    let reference = EndpointReference::from_declaration(endpoint, owner_namespace);
    match loaded.get(&reference.key()) {
        Some(endpoint) if endpoint.is_loaded() => Ok(endpoint),
        Some(endpoint) => Err(format!(
            "endpoint {reference} is not loaded: {}",
            endpoint.message.as_deref().unwrap_or("unknown reason")
        )),
        None => Err(format!("endpoint {reference} was not loaded")),
    }
}

/// Check port bounds and reject listeners of one protocol with overlapping ranges.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_listeners(listeners: &[ResolvedListener]) -> Result<(), ValidationError> {
    for (index, listener) in listeners.iter().enumerate() {
        for range in &listener.port_ranges {
            if range.from_port < MIN_PORT || range.to_port > MAX_PORT || range.from_port > range.to_port
            {
                return Err(ValidationError::InvalidPortRange {
                    listener: index,
                    from_port: range.from_port,
                    to_port: range.to_port,
                });
            }
        }
    }

    for (first, left) in listeners.iter().enumerate() {
        for (offset, right) in listeners[first + 1..].iter().enumerate() {
            if left.protocol == right.protocol && ranges_overlap(&left.port_ranges, &right.port_ranges)
            {
                return Err(ValidationError::OverlappingListeners {
                    first,
                    second: first + 1 + offset,
                    protocol: left.protocol,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod listener_tests;
