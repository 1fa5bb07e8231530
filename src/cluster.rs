// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read access to the Kubernetes resources an accelerator can reference.
//!
//! The endpoint pipeline only needs `get`/`list` over a handful of kinds plus a probe
//! for the optional Gateway API. [`ClusterClient`] captures exactly that surface so
//! the pipeline can run against the API server ([`KubeClusterClient`]) or an
//! in-memory fake in tests.

use crate::constants::{GATEWAY_API_GROUP_VERSION, KUBE_LIST_PAGE_SIZE};
use crate::crd::{Gateway, IngressClassParams, ReferenceGrant};
use crate::errors::ClusterError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::{Ingress, IngressClass};
use kube::api::ListParams;
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// Minimal Kubernetes capability surface used while loading and discovering endpoints.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError>;

    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Ingress, ClusterError>;

    async fn get_gateway(&self, namespace: &str, name: &str) -> Result<Gateway, ClusterError>;

    async fn get_ingress_class(&self, name: &str) -> Result<IngressClass, ClusterError>;

    async fn get_ingress_class_params(
        &self,
        name: &str,
    ) -> Result<IngressClassParams, ClusterError>;

    async fn list_reference_grants(
        &self,
        namespace: &str,
    ) -> Result<Vec<ReferenceGrant>, ClusterError>;

    /// Whether the Gateway API (`Gateway`, `ReferenceGrant`) is served by the cluster.
    ///
    /// Probed on every call; the API can be installed or removed while the operator runs.
    async fn has_gateway_api(&self) -> bool;
}

/// [`ClusterClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_namespaced<K>(&self, namespace: &str, name: &str) -> Result<K, ClusterError>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|err| map_kube_error(&K::kind(&()), namespace, name, err))
    }

    async fn get_cluster_scoped<K>(&self, name: &str) -> Result<K, ClusterError>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
    {
        let api: Api<K> = Api::all(self.client.clone());
        api.get(name)
            .await
            .map_err(|err| map_kube_error(&K::kind(&()), "", name, err))
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError> {
        self.get_namespaced(namespace, name).await
    }

    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Ingress, ClusterError> {
        self.get_namespaced(namespace, name).await
    }

    async fn get_gateway(&self, namespace: &str, name: &str) -> Result<Gateway, ClusterError> {
        self.get_namespaced(namespace, name).await
    }

    async fn get_ingress_class(&self, name: &str) -> Result<IngressClass, ClusterError> {
        self.get_cluster_scoped(name).await
    }

    async fn get_ingress_class_params(
        &self,
        name: &str,
    ) -> Result<IngressClassParams, ClusterError> {
        self.get_cluster_scoped(name).await
    }

    async fn list_reference_grants(
        &self,
        namespace: &str,
    ) -> Result<Vec<ReferenceGrant>, ClusterError> {
        let api: Api<ReferenceGrant> = Api::namespaced(self.client.clone(), namespace);
        list_all_paginated(&api, ListParams::default())
            .await
            .map_err(|err| map_kube_error("ReferenceGrant", namespace, "*", err))
    }

    async fn has_gateway_api(&self) -> bool {
        match self
            .client
            .list_api_group_resources(GATEWAY_API_GROUP_VERSION)
            .await
        {
            Ok(resources) => resources.resources.iter().any(|r| r.kind == "Gateway"),
            Err(err) => {
                debug!(error = %err, "Gateway API is not available");
                false
            }
        }
    }
}

/// List all resources with automatic pagination.
///
/// # Errors
///
/// Returns an error if any page request fails.
pub async fn list_all_paginated<K>(
    api: &Api<K>,
    mut list_params: ListParams,
) -> Result<Vec<K>, kube::Error>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    list_params.limit = Some(KUBE_LIST_PAGE_SIZE);

    let mut all_items = Vec::new();
    let mut page_count = 0;

    loop {
        page_count += 1;
        let result = api.list(&list_params).await?;
        all_items.extend(result.items);

        match result.metadata.continue_ {
            Some(token) if !token.is_empty() => list_params.continue_token = Some(token),
            _ => break,
        }
    }

    debug!(
        total_pages = page_count,
        total_items = all_items.len(),
        "Completed paginated list operation"
    );

    Ok(all_items)
}

/// Classify a kube error as NotFound or a generic request failure.
#[must_use]
pub fn map_kube_error(kind: &str, namespace: &str, name: &str, err: kube::Error) -> ClusterError {
    match &err {
        kube::Error::Api(response) if response.code == 404 => ClusterError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        _ => ClusterError::Request {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: err.to_string(),
        },
    }
}
