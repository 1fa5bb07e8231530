// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Listener protocol and port inference from a loaded endpoint.
//!
//! When a listener omits its protocol or port ranges, the ports come from the single
//! endpoint behind it:
//!
//! - **Service** - ports published in the load balancer status, with their protocol
//! - **Ingress** - the `listen-ports` annotation; otherwise 443 when a certificate is
//!   configured (annotation or `IngressClassParams`) and 80 when not. Always TCP.
//! - **Gateway** - listener ports; UDP listeners map to UDP, everything else to TCP
//! - **Load balancer ARN** - the load balancer's listeners, read from ELBv2
//!
//! A port exposed under both TCP and UDP cannot be split into two accelerator listeners
//! and is rejected.

use super::{EndpointReference, LoadedEndpoint, ResourceSnapshot};
use crate::cloud::LoadBalancerApi;
use crate::cluster::ClusterClient;
use crate::constants::{
    ELBV2_API_GROUP, INGRESS_HTTPS_PORT, INGRESS_HTTP_PORT, KIND_INGRESS_CLASS_PARAMS,
};
use crate::crd::{Gateway, Protocol};
use crate::errors::DiscoveryError;
use crate::labels::{INGRESS_CERTIFICATE_ARN, INGRESS_CLASS_ANNOTATION, INGRESS_LISTEN_PORTS};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use std::collections::BTreeMap;
use tracing::debug;

/// Ports discovered for one protocol, sorted and deduplicated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredListener {
    pub protocol: Protocol,
    pub ports: Vec<i32>,
}

/// Discover listener protocols and ports from a `Loaded` endpoint.
///
/// Results are ordered TCP before UDP.
///
/// # Errors
///
/// Returns an error when the endpoint exposes no ports, exposes a port under two
/// protocols, uses a protocol that cannot be accelerated, or a lookup fails.
pub async fn discover_listeners(
    endpoint: &LoadedEndpoint,
    cluster: &dyn ClusterClient,
    cloud: &dyn LoadBalancerApi,
) -> Result<Vec<DiscoveredListener>, DiscoveryError> {
    let label = endpoint.reference.to_string();

    let pairs = match (&endpoint.reference, &endpoint.snapshot) {
        (EndpointReference::EndpointId { arn }, _) => load_balancer_ports(&label, arn, cloud).await?,
        (_, Some(ResourceSnapshot::Service(service))) => service_ports(&label, service)?,
        (_, Some(ResourceSnapshot::Ingress(ingress))) => ingress_ports(&label, ingress, cluster).await?,
        (_, Some(ResourceSnapshot::Gateway(gateway))) => gateway_ports(gateway),
        (_, None) => return Err(DiscoveryError::MissingSnapshot { endpoint: label }),
    };

    let discovered = group_by_protocol(&label, pairs)?;
    debug!(endpoint = %label, ?discovered, "Discovered listener ports");
    Ok(discovered)
}

/// Group `(protocol, port)` pairs, rejecting ports seen under both protocols.
///
/// # Errors
///
/// Returns [`DiscoveryError::AmbiguousProtocol`] or [`DiscoveryError::NoPorts`].
pub fn group_by_protocol(
    endpoint: &str,
    pairs: impl IntoIterator<Item = (Protocol, i32)>,
) -> Result<Vec<DiscoveredListener>, DiscoveryError> {
    let mut protocol_by_port: BTreeMap<i32, Protocol> = BTreeMap::new();
    for (protocol, port) in pairs {
        match protocol_by_port.insert(port, protocol) {
            Some(previous) if previous != protocol => {
                return Err(DiscoveryError::AmbiguousProtocol {
                    endpoint: endpoint.to_string(),
                    port,
                });
            }
            _ => {}
        }
    }

    let mut ports_by_protocol: BTreeMap<Protocol, Vec<i32>> = BTreeMap::new();
    for (port, protocol) in protocol_by_port {
        ports_by_protocol.entry(protocol).or_default().push(port);
    }

    if ports_by_protocol.is_empty() {
        return Err(DiscoveryError::NoPorts {
            endpoint: endpoint.to_string(),
        });
    }

    Ok(ports_by_protocol
        .into_iter()
        .map(|(protocol, ports)| DiscoveredListener { protocol, ports })
        .collect())
}

fn service_ports(endpoint: &str, service: &Service) -> Result<Vec<(Protocol, i32)>, DiscoveryError> {
    let port_statuses = service
        .status
        .iter()
        .filter_map(|status| status.load_balancer.as_ref())
        .filter_map(|lb| lb.ingress.as_ref())
        .flatten()
        .filter_map(|ingress| ingress.ports.as_ref())
        .flatten();

    port_statuses
        .map(|status| match status.protocol.to_ascii_uppercase().as_str() {
            "TCP" => Ok((Protocol::Tcp, status.port)),
            "UDP" => Ok((Protocol::Udp, status.port)),
            other => Err(DiscoveryError::UnsupportedProtocol {
                endpoint: endpoint.to_string(),
                protocol: other.to_string(),
            }),
        })
        .collect()
}

async fn ingress_ports(
    endpoint: &str,
    ingress: &Ingress,
    cluster: &dyn ClusterClient,
) -> Result<Vec<(Protocol, i32)>, DiscoveryError> {
    if let Some(raw) = annotation(ingress, INGRESS_LISTEN_PORTS) {
        let listen_ports = parse_listen_ports(raw).map_err(|reason| {
            DiscoveryError::InvalidAnnotation {
                endpoint: endpoint.to_string(),
                annotation: INGRESS_LISTEN_PORTS.to_string(),
                reason,
            }
        })?;
        return Ok(listen_ports
            .into_iter()
            .map(|port| (Protocol::Tcp, port))
            .collect());
    }

    let port = if ingress_has_certificate(ingress, cluster).await? {
        INGRESS_HTTPS_PORT
    } else {
        INGRESS_HTTP_PORT
    };
    Ok(vec![(Protocol::Tcp, port)])
}

/// Parse the `listen-ports` annotation, e.g. `[{"HTTP": 80}, {"HTTPS": 443}]`.
///
/// # Errors
///
/// Returns the parse failure as text.
pub fn parse_listen_ports(raw: &str) -> Result<Vec<i32>, String> {
    let entries: Vec<BTreeMap<String, i32>> =
        serde_json::from_str(raw).map_err(|err| err.to_string())?;
    Ok(entries
        .into_iter()
        .flat_map(BTreeMap::into_values)
        .collect())
}

async fn ingress_has_certificate(
    ingress: &Ingress,
    cluster: &dyn ClusterClient,
) -> Result<bool, DiscoveryError> {
    if annotation(ingress, INGRESS_CERTIFICATE_ARN).is_some_and(|arns| !arns.trim().is_empty()) {
        return Ok(true);
    }

    let class_name = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.ingress_class_name.as_deref())
        .or_else(|| annotation(ingress, INGRESS_CLASS_ANNOTATION));
    let Some(class_name) = class_name else {
        return Ok(false);
    };

    let class = match cluster.get_ingress_class(class_name).await {
        Ok(class) => class,
        Err(err) if err.is_not_found() => return Ok(false),
        Err(err) => return Err(err.into()),
    };

    let Some(parameters) = class.spec.and_then(|spec| spec.parameters) else {
        return Ok(false);
    };
    if parameters.api_group.as_deref() != Some(ELBV2_API_GROUP)
        || parameters.kind != KIND_INGRESS_CLASS_PARAMS
    {
        return Ok(false);
    }

    match cluster.get_ingress_class_params(&parameters.name).await {
        Ok(params) => Ok(params
            .spec
            .certificate_arn
            .is_some_and(|arns| arns.iter().any(|arn| !arn.is_empty()))),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn gateway_ports(gateway: &Gateway) -> Vec<(Protocol, i32)> {
    gateway
        .spec
        .listeners
        .iter()
        .map(|listener| {
            let protocol = if listener.protocol.eq_ignore_ascii_case("UDP") {
                Protocol::Udp
            } else {
                Protocol::Tcp
            };
            (protocol, listener.port)
        })
        .collect()
}

async fn load_balancer_ports(
    endpoint: &str,
    arn: &str,
    cloud: &dyn LoadBalancerApi,
) -> Result<Vec<(Protocol, i32)>, DiscoveryError> {
    cloud
        .list_listeners(arn)
        .await?
        .into_iter()
        .map(|listener| match listener.protocol.as_str() {
            "TCP" | "TLS" | "HTTP" | "HTTPS" => Ok((Protocol::Tcp, listener.port)),
            "UDP" => Ok((Protocol::Udp, listener.port)),
            other => Err(DiscoveryError::UnsupportedProtocol {
                endpoint: endpoint.to_string(),
                protocol: other.to_string(),
            }),
        })
        .collect()
}

fn annotation<'a>(ingress: &'a Ingress, key: &str) -> Option<&'a str> {
    ingress
        .metadata
        .annotations
        .as_ref()?
        .get(key)
        .map(String::as_str)
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod discovery_tests;
