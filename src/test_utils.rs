// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory collaborators and fixture builders shared by unit tests.

use crate::actuator::Actuator;
use crate::cloud::{CloudListener, LoadBalancerApi};
use crate::cluster::ClusterClient;
use crate::crd::{
    EndpointType, Gateway, GatewayListener, GatewaySpec, GatewayStatus, GatewayStatusAddress,
    GlobalAccelerator, GlobalAcceleratorEndpoint, GlobalAcceleratorEndpointGroup,
    GlobalAcceleratorListener, GlobalAcceleratorSpec, IngressClassParams, IngressClassParamsSpec,
    PortRange, Protocol, ReferenceGrant, ReferenceGrantFrom, ReferenceGrantSpec, ReferenceGrantTo,
};
use crate::endpoints::{OwnerKey, ResourceKey};
use crate::errors::{ActuatorError, CloudError, ClusterError};
use crate::model::AcceleratorModel;
use crate::tracking::watcher::{WatchFactory, WatchHandle};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, PortStatus, Service, ServiceStatus,
};
use k8s_openapi::api::networking::v1::{
    Ingress, IngressClass, IngressClassParametersReference, IngressClassSpec,
    IngressLoadBalancerIngress, IngressLoadBalancerStatus, IngressSpec, IngressStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// FakeCluster
// ============================================================================

/// In-memory [`ClusterClient`].
#[derive(Default)]
pub struct FakeCluster {
    services: HashMap<(String, String), Service>,
    ingresses: HashMap<(String, String), Ingress>,
    gateways: HashMap<(String, String), Gateway>,
    ingress_classes: HashMap<String, IngressClass>,
    class_params: HashMap<String, IngressClassParams>,
    grants: HashMap<String, Vec<ReferenceGrant>>,
    gateway_api: AtomicBool,
    /// Names whose lookup fails with a non-404 error
    failing: HashSet<String>,
    /// Names whose lookup never completes
    hanging: HashSet<String>,
    pub gateway_probes: AtomicUsize,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.insert(key_of(&service.metadata), service);
        self
    }

    pub fn with_ingress(mut self, ingress: Ingress) -> Self {
        self.ingresses.insert(key_of(&ingress.metadata), ingress);
        self
    }

    pub fn with_gateway(mut self, gateway: Gateway) -> Self {
        self.gateways.insert(key_of(&gateway.metadata), gateway);
        self
    }

    pub fn with_ingress_class(mut self, class: IngressClass) -> Self {
        let name = class.metadata.name.clone().unwrap_or_default();
        self.ingress_classes.insert(name, class);
        self
    }

    pub fn with_class_params(mut self, params: IngressClassParams) -> Self {
        let name = params.metadata.name.clone().unwrap_or_default();
        self.class_params.insert(name, params);
        self
    }

    pub fn with_grant(mut self, grant: ReferenceGrant) -> Self {
        let namespace = grant.metadata.namespace.clone().unwrap_or_default();
        self.grants.entry(namespace).or_default().push(grant);
        self
    }

    pub fn with_gateway_api(self) -> Self {
        self.gateway_api.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn with_hanging(mut self, name: &str) -> Self {
        self.hanging.insert(name.to_string());
        self
    }

    pub fn set_gateway_api(&self, installed: bool) {
        self.gateway_api.store(installed, Ordering::SeqCst);
    }

    async fn lookup<T: Clone>(
        &self,
        store: &HashMap<(String, String), T>,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<T, ClusterError> {
        if self.hanging.contains(name) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(name) {
            return Err(ClusterError::Request {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        store
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

fn key_of(meta: &ObjectMeta) -> (String, String) {
    (
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError> {
        self.lookup(&self.services, "Service", namespace, name).await
    }

    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Ingress, ClusterError> {
        self.lookup(&self.ingresses, "Ingress", namespace, name).await
    }

    async fn get_gateway(&self, namespace: &str, name: &str) -> Result<Gateway, ClusterError> {
        self.lookup(&self.gateways, "Gateway", namespace, name).await
    }

    async fn get_ingress_class(&self, name: &str) -> Result<IngressClass, ClusterError> {
        self.ingress_classes
            .get(name)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                kind: "IngressClass".to_string(),
                namespace: String::new(),
                name: name.to_string(),
            })
    }

    async fn get_ingress_class_params(
        &self,
        name: &str,
    ) -> Result<IngressClassParams, ClusterError> {
        self.class_params
            .get(name)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                kind: "IngressClassParams".to_string(),
                namespace: String::new(),
                name: name.to_string(),
            })
    }

    async fn list_reference_grants(
        &self,
        namespace: &str,
    ) -> Result<Vec<ReferenceGrant>, ClusterError> {
        Ok(self.grants.get(namespace).cloned().unwrap_or_default())
    }

    async fn has_gateway_api(&self) -> bool {
        self.gateway_probes.fetch_add(1, Ordering::SeqCst);
        self.gateway_api.load(Ordering::SeqCst)
    }
}

// ============================================================================
// FakeCloud
// ============================================================================

/// In-memory [`LoadBalancerApi`] that counts ARN lookups.
#[derive(Default)]
pub struct FakeCloud {
    arns: Mutex<HashMap<String, String>>,
    listeners: HashMap<String, Vec<CloudListener>>,
    lookups: AtomicUsize,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load_balancer(self, dns_name: &str, arn: &str) -> Self {
        self.set_load_balancer(dns_name, arn);
        self
    }

    pub fn with_listeners(mut self, arn: &str, listeners: &[(&str, i32)]) -> Self {
        self.listeners.insert(
            arn.to_string(),
            listeners
                .iter()
                .map(|(protocol, port)| CloudListener {
                    protocol: (*protocol).to_string(),
                    port: *port,
                })
                .collect(),
        );
        self
    }

    pub fn set_load_balancer(&self, dns_name: &str, arn: &str) {
        self.arns
            .lock()
            .unwrap()
            .insert(dns_name.to_ascii_lowercase(), arn.to_string());
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoadBalancerApi for FakeCloud {
    async fn find_load_balancer_arn(&self, dns_name: &str) -> Result<String, CloudError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.arns
            .lock()
            .unwrap()
            .get(&dns_name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| CloudError::LoadBalancerNotFound {
                dns_name: dns_name.to_string(),
            })
    }

    async fn list_listeners(
        &self,
        load_balancer_arn: &str,
    ) -> Result<Vec<CloudListener>, CloudError> {
        self.listeners
            .get(load_balancer_arn)
            .cloned()
            .ok_or_else(|| CloudError::Request {
                operation: "DescribeListeners".to_string(),
                reason: format!("load balancer {load_balancer_arn} not found"),
            })
    }
}

// ============================================================================
// FakeWatchFactory
// ============================================================================

/// [`WatchFactory`] recording every start and stop.
#[derive(Default)]
pub struct FakeWatchFactory {
    pub started: Mutex<Vec<ResourceKey>>,
    pub stopped: Arc<Mutex<Vec<ResourceKey>>>,
}

impl FakeWatchFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<ResourceKey> {
        self.started.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> Vec<ResourceKey> {
        self.stopped.lock().unwrap().clone()
    }

    /// Watches started and not yet stopped.
    pub fn live(&self) -> usize {
        self.started().len() - self.stopped().len()
    }
}

impl WatchFactory for FakeWatchFactory {
    fn start(&self, key: &ResourceKey) -> WatchHandle {
        self.started.lock().unwrap().push(key.clone());
        let stopped = Arc::clone(&self.stopped);
        let key = key.clone();
        WatchHandle::from_fn(move || stopped.lock().unwrap().push(key))
    }
}

// ============================================================================
// RecordingActuator
// ============================================================================

/// [`Actuator`] keeping every deployed model and torn down owner.
#[derive(Default)]
pub struct RecordingActuator {
    pub deployed: Mutex<Vec<(OwnerKey, AcceleratorModel)>>,
    pub torn_down: Mutex<Vec<OwnerKey>>,
    fail: AtomicBool,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn deployed(&self) -> Vec<(OwnerKey, AcceleratorModel)> {
        self.deployed.lock().unwrap().clone()
    }

    pub fn torn_down(&self) -> Vec<OwnerKey> {
        self.torn_down.lock().unwrap().clone()
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    async fn deploy(
        &self,
        owner: &OwnerKey,
        model: &AcceleratorModel,
    ) -> Result<(), ActuatorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActuatorError::Deploy {
                owner: owner.to_string(),
                reason: "deploy refused".to_string(),
            });
        }
        self.deployed
            .lock()
            .unwrap()
            .push((owner.clone(), model.clone()));
        Ok(())
    }

    async fn teardown(&self, owner: &OwnerKey) -> Result<(), ActuatorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActuatorError::Teardown {
                owner: owner.to_string(),
                reason: "teardown refused".to_string(),
            });
        }
        self.torn_down.lock().unwrap().push(owner.clone());
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// LoadBalancer Service publishing `hostname` and `ports` (`(port, protocol)`).
pub fn service(namespace: &str, name: &str, hostname: Option<&str>, ports: &[(i32, &str)]) -> Service {
    let ingress = LoadBalancerIngress {
        hostname: hostname.map(str::to_string),
        ports: Some(
            ports
                .iter()
                .map(|(port, protocol)| PortStatus {
                    port: *port,
                    protocol: (*protocol).to_string(),
                    ..Default::default()
                })
                .collect(),
        ),
        ..Default::default()
    };
    Service {
        metadata: meta(namespace, name),
        status: Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(vec![ingress]),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Ingress publishing `hostnames` in its load balancer status.
pub fn ingress(namespace: &str, name: &str, hostnames: &[&str]) -> Ingress {
    Ingress {
        metadata: meta(namespace, name),
        status: Some(IngressStatus {
            load_balancer: Some(IngressLoadBalancerStatus {
                ingress: Some(
                    hostnames
                        .iter()
                        .map(|hostname| IngressLoadBalancerIngress {
                            hostname: Some((*hostname).to_string()),
                            ..Default::default()
                        })
                        .collect(),
                ),
            }),
        }),
        ..Default::default()
    }
}

pub fn with_annotation(mut ingress: Ingress, key: &str, value: &str) -> Ingress {
    ingress
        .metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(key.to_string(), value.to_string());
    ingress
}

pub fn with_ingress_class(mut ingress: Ingress, class_name: &str) -> Ingress {
    ingress.spec = Some(IngressSpec {
        ingress_class_name: Some(class_name.to_string()),
        ..Default::default()
    });
    ingress
}

/// IngressClass pointing at cluster-scoped `IngressClassParams` named `params_name`.
pub fn ingress_class(name: &str, params_name: &str) -> IngressClass {
    IngressClass {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(IngressClassSpec {
            controller: Some("ingress.k8s.aws/alb".to_string()),
            parameters: Some(IngressClassParametersReference {
                api_group: Some("elbv2.k8s.aws".to_string()),
                kind: "IngressClassParams".to_string(),
                name: params_name.to_string(),
                ..Default::default()
            }),
        }),
    }
}

pub fn class_params(name: &str, certificate_arns: &[&str]) -> IngressClassParams {
    IngressClassParams::new(
        name,
        IngressClassParamsSpec {
            certificate_arn: Some(certificate_arns.iter().map(|s| (*s).to_string()).collect()),
        },
    )
}

/// Gateway publishing `hostname` with listeners `(port, protocol)`.
pub fn gateway(namespace: &str, name: &str, hostname: Option<&str>, listeners: &[(i32, &str)]) -> Gateway {
    let mut gateway = Gateway::new(
        name,
        GatewaySpec {
            gateway_class_name: "aws-nlb".to_string(),
            listeners: listeners
                .iter()
                .enumerate()
                .map(|(index, (port, protocol))| GatewayListener {
                    name: format!("listener-{index}"),
                    hostname: None,
                    port: *port,
                    protocol: (*protocol).to_string(),
                })
                .collect(),
        },
    );
    gateway.metadata.namespace = Some(namespace.to_string());
    gateway.status = Some(GatewayStatus {
        addresses: hostname
            .map(|value| GatewayStatusAddress {
                r#type: Some("Hostname".to_string()),
                value: value.to_string(),
            })
            .into_iter()
            .collect(),
    });
    gateway
}

/// Grant in `namespace` letting accelerators in `from_namespace` reference `kind`.
pub fn reference_grant(
    namespace: &str,
    from_namespace: &str,
    to_group: &str,
    to_kind: &str,
    to_name: Option<&str>,
) -> ReferenceGrant {
    let mut grant = ReferenceGrant::new(
        &format!("allow-{from_namespace}"),
        ReferenceGrantSpec {
            from: vec![ReferenceGrantFrom {
                group: "aga.k8s.aws".to_string(),
                kind: "GlobalAccelerator".to_string(),
                namespace: from_namespace.to_string(),
            }],
            to: vec![ReferenceGrantTo {
                group: to_group.to_string(),
                kind: to_kind.to_string(),
                name: to_name.map(str::to_string),
            }],
        },
    );
    grant.metadata.namespace = Some(namespace.to_string());
    grant
}

pub fn endpoint(kind: EndpointType, name: &str) -> GlobalAcceleratorEndpoint {
    GlobalAcceleratorEndpoint {
        r#type: kind,
        name: Some(name.to_string()),
        namespace: None,
        endpoint_id: None,
        weight: None,
        client_ip_preservation_enabled: None,
    }
}

pub fn endpoint_in(kind: EndpointType, namespace: &str, name: &str) -> GlobalAcceleratorEndpoint {
    GlobalAcceleratorEndpoint {
        namespace: Some(namespace.to_string()),
        ..endpoint(kind, name)
    }
}

pub fn endpoint_id(arn: &str) -> GlobalAcceleratorEndpoint {
    GlobalAcceleratorEndpoint {
        r#type: EndpointType::EndpointId,
        name: None,
        namespace: None,
        endpoint_id: Some(arn.to_string()),
        weight: None,
        client_ip_preservation_enabled: None,
    }
}

pub fn group(region: Option<&str>, endpoints: Vec<GlobalAcceleratorEndpoint>) -> GlobalAcceleratorEndpointGroup {
    GlobalAcceleratorEndpointGroup {
        region: region.map(str::to_string),
        endpoints: Some(endpoints),
        ..Default::default()
    }
}

pub fn listener(
    protocol: Option<Protocol>,
    port_ranges: Option<Vec<PortRange>>,
    groups: Vec<GlobalAcceleratorEndpointGroup>,
) -> GlobalAcceleratorListener {
    GlobalAcceleratorListener {
        protocol,
        port_ranges,
        client_affinity: None,
        endpoint_groups: Some(groups),
    }
}

pub fn accelerator(namespace: &str, name: &str, listeners: Vec<GlobalAcceleratorListener>) -> GlobalAccelerator {
    let mut ga = GlobalAccelerator::new(
        name,
        GlobalAcceleratorSpec {
            listeners: Some(listeners),
            ..Default::default()
        },
    );
    ga.metadata.namespace = Some(namespace.to_string());
    ga
}
