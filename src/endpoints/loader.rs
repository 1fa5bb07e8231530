// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Loading of endpoint references.
//!
//! Each reference is authorized, fetched from the cluster, reduced to the DNS name of
//! its load balancer, and resolved to an ARN through the shared [`DnsResolver`].
//!
//! ## Classification
//!
//! | Situation | Status |
//! |-----------|--------|
//! | ARN resolved | `Loaded` |
//! | Cross-namespace reference without a grant | `Warning` |
//! | Resource not found | `Warning` |
//! | No load balancer hostname in status yet | `Warning` |
//! | Hostname does not resolve to a load balancer | `Warning` |
//! | API server failure, empty identifier, timeout | `Fatal` |
//!
//! Warnings let the rest of the accelerator proceed. A single `Fatal` endpoint aborts
//! the reconciliation, which is retried.

use super::authorization::is_reference_allowed;
use super::{EndpointReference, LoadStatus, LoadedEndpoint, OwnerKey, ResourceKey, ResourceSnapshot};
use crate::cluster::ClusterClient;
use crate::constants::{
    ENDPOINT_LOAD_TIMEOUT_SECS, GATEWAY_ADDRESS_TYPE_HOSTNAME, INGRESS_PRIMARY_HOSTNAME_MARKER,
};
use crate::crd::Gateway;
use crate::dns_resolver::DnsResolver;
use crate::errors::ClusterError;
use crate::metrics::record_endpoint_load;
use futures::future::join_all;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of loading every endpoint of one accelerator.
#[derive(Clone, Debug, Default)]
pub struct LoadResult {
    /// One entry per reference, in reference order
    pub endpoints: Vec<LoadedEndpoint>,
    /// `reference: message` for every `Fatal` endpoint
    pub fatal_errors: Vec<String>,
}

impl LoadResult {
    #[must_use]
    pub fn has_fatal(&self) -> bool {
        !self.fatal_errors.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &ResourceKey) -> Option<&LoadedEndpoint> {
        self.endpoints.iter().find(|endpoint| &endpoint.key() == key)
    }

    pub fn count(&self, status: LoadStatus) -> usize {
        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.status == status)
            .count()
    }
}

/// Loads [`EndpointReference`]s into [`LoadedEndpoint`]s.
#[derive(Clone)]
pub struct EndpointLoader {
    cluster: Arc<dyn ClusterClient>,
    resolver: Arc<DnsResolver>,
    timeout: Duration,
}

impl EndpointLoader {
    #[must_use]
    pub fn new(cluster: Arc<dyn ClusterClient>, resolver: Arc<DnsResolver>) -> Self {
        Self {
            cluster,
            resolver,
            timeout: Duration::from_secs(ENDPOINT_LOAD_TIMEOUT_SECS),
        }
    }

    /// Override the per-endpoint timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load every reference of `owner` concurrently.
    pub async fn load_endpoints(
        &self,
        owner: &OwnerKey,
        references: &[EndpointReference],
    ) -> LoadResult {
        let endpoints = join_all(
            references
                .iter()
                .map(|reference| self.load_endpoint(reference, &owner.namespace)),
        )
        .await;

        let mut fatal_errors = Vec::new();
        for endpoint in &endpoints {
            record_endpoint_load(&endpoint.reference.kind().to_string(), endpoint.status.as_str());
            match endpoint.status {
                LoadStatus::Loaded => {}
                LoadStatus::Warning => warn!(
                    owner = %owner,
                    endpoint = %endpoint.reference,
                    message = endpoint.message.as_deref().unwrap_or_default(),
                    "Skipping endpoint"
                ),
                LoadStatus::Fatal => fatal_errors.push(format!(
                    "{}: {}",
                    endpoint.reference,
                    endpoint.message.as_deref().unwrap_or_default()
                )),
            }
        }

        let result = LoadResult {
            endpoints,
            fatal_errors,
        };

        info!(
            owner = %owner,
            total = result.endpoints.len(),
            loaded = result.count(LoadStatus::Loaded),
            warnings = result.count(LoadStatus::Warning),
            fatal = result.count(LoadStatus::Fatal),
            "Loaded endpoints"
        );

        result
    }

    /// Load one reference on behalf of an accelerator in `owner_namespace`.
    ///
    /// Never fails; every problem is expressed through the returned status.
    pub async fn load_endpoint(
        &self,
        reference: &EndpointReference,
        owner_namespace: &str,
    ) -> LoadedEndpoint {
        match tokio::time::timeout(self.timeout, self.load(reference, owner_namespace)).await {
            Ok(endpoint) => endpoint,
            Err(_) => LoadedEndpoint::fatal(
                reference.clone(),
                format!("loading timed out after {}s", self.timeout.as_secs()),
            ),
        }
    }

    async fn load(&self, reference: &EndpointReference, owner_namespace: &str) -> LoadedEndpoint {
        if reference.name().is_empty() {
            let field = match reference {
                EndpointReference::EndpointId { .. } => "endpointID",
                _ => "name",
            };
            return LoadedEndpoint::fatal(
                reference.clone(),
                format!("{} endpoint has an empty {field}", reference.kind()),
            );
        }

        match is_reference_allowed(self.cluster.as_ref(), owner_namespace, reference).await {
            Ok(true) => {}
            Ok(false) => {
                let mut endpoint = LoadedEndpoint::warning(
                    reference.clone(),
                    format!(
                        "cross-namespace reference from {owner_namespace} is not permitted by any ReferenceGrant"
                    ),
                );
                endpoint.reference_allowed = false;
                return endpoint;
            }
            Err(err) => return LoadedEndpoint::fatal(reference.clone(), err.to_string()),
        }

        let fetched = match reference {
            EndpointReference::EndpointId { arn } => {
                return LoadedEndpoint::loaded(reference.clone(), arn.clone());
            }
            EndpointReference::Service { namespace, name } => self
                .cluster
                .get_service(namespace, name)
                .await
                .map(|svc| {
                    let dns_name = service_dns_name(&svc);
                    (ResourceSnapshot::Service(Arc::new(svc)), dns_name)
                }),
            EndpointReference::Ingress { namespace, name } => self
                .cluster
                .get_ingress(namespace, name)
                .await
                .map(|ingress| {
                    let dns_name = ingress_dns_name(&ingress);
                    (ResourceSnapshot::Ingress(Arc::new(ingress)), dns_name)
                }),
            EndpointReference::Gateway { namespace, name } => self
                .cluster
                .get_gateway(namespace, name)
                .await
                .map(|gateway| {
                    let dns_name = gateway_dns_name(&gateway);
                    (ResourceSnapshot::Gateway(Arc::new(gateway)), dns_name)
                }),
        };

        let (snapshot, dns_name) = match fetched {
            Ok(found) => found,
            Err(err @ ClusterError::NotFound { .. }) => {
                return LoadedEndpoint::warning(reference.clone(), err.to_string());
            }
            Err(err) => return LoadedEndpoint::fatal(reference.clone(), err.to_string()),
        };

        let Some(dns_name) = dns_name else {
            let mut endpoint = LoadedEndpoint::warning(
                reference.clone(),
                "no load balancer hostname in status yet",
            );
            endpoint.snapshot = Some(snapshot);
            return endpoint;
        };

        match self.resolver.resolve(&dns_name).await {
            Ok(arn) => {
                debug!(endpoint = %reference, dns_name = %dns_name, arn = %arn, "Endpoint loaded");
                let mut endpoint = LoadedEndpoint::loaded(reference.clone(), arn);
                endpoint.dns_name = Some(dns_name);
                endpoint.snapshot = Some(snapshot);
                endpoint
            }
            Err(err) => {
                let mut endpoint = LoadedEndpoint::warning(reference.clone(), err.to_string());
                endpoint.dns_name = Some(dns_name);
                endpoint.snapshot = Some(snapshot);
                endpoint
            }
        }
    }
}

/// First load balancer hostname published in a Service's status.
#[must_use]
pub fn service_dns_name(service: &Service) -> Option<String> {
    service
        .status
        .as_ref()?
        .load_balancer
        .as_ref()?
        .ingress
        .as_ref()?
        .iter()
        .filter_map(|ingress| ingress.hostname.as_deref())
        .find(|hostname| !hostname.is_empty())
        .map(str::to_string)
}

/// Hostname of the load balancer provisioned for an Ingress.
///
/// Only the hostname identifying an ELB is used; other published hostnames (e.g. of a
/// fronting proxy) are ignored.
#[must_use]
pub fn ingress_dns_name(ingress: &Ingress) -> Option<String> {
    ingress
        .status
        .as_ref()?
        .load_balancer
        .as_ref()?
        .ingress
        .as_ref()?
        .iter()
        .filter_map(|entry| entry.hostname.as_deref())
        .find(|hostname| {
            hostname
                .to_ascii_lowercase()
                .contains(INGRESS_PRIMARY_HOSTNAME_MARKER)
        })
        .map(str::to_string)
}

/// First `Hostname` address published in a Gateway's status.
#[must_use]
pub fn gateway_dns_name(gateway: &Gateway) -> Option<String> {
    gateway
        .status
        .as_ref()?
        .addresses
        .iter()
        .find(|address| {
            address.r#type.as_deref() == Some(GATEWAY_ADDRESS_TYPE_HOSTNAME)
                && !address.value.is_empty()
        })
        .map(|address| address.value.clone())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod loader_tests;
