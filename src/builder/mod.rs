// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Translation of a `GlobalAccelerator` plus its loaded endpoints into an
//! [`AcceleratorModel`].
//!
//! # Modules
//!
//! - [`accelerator`] - Accelerator name generation and tags
//! - [`listener`] - Listener resolution, auto-discovery and port range validation
//! - [`endpoint_group`] - Endpoint groups and port override validation
//!
//! Building is deterministic for a given spec, configuration and set of loaded
//! endpoints, except where auto-discovery reads the cluster or ELBv2.

pub mod accelerator;
pub mod endpoint_group;
pub mod listener;

use crate::cloud::LoadBalancerApi;
use crate::cluster::ClusterClient;
use crate::config::ControllerConfig;
use crate::crd::GlobalAccelerator;
use crate::endpoints::{LoadResult, OwnerKey};
use crate::errors::BuildError;
use crate::model::{AcceleratorModel, ListenerModel, ResourceRef, ACCELERATOR_MODEL_ID};
use accelerator::{accelerator_name, build_tags};
use endpoint_group::{build_endpoint_groups, validate_port_overrides};
use listener::resolve_listeners;
use std::sync::Arc;
use tracing::debug;

/// Model type name of the accelerator node, used in forward references.
pub const ACCELERATOR_RESOURCE_TYPE: &str = "AWS::GlobalAccelerator::Accelerator";

/// Builds [`AcceleratorModel`]s.
#[derive(Clone)]
pub struct ModelBuilder {
    cluster: Arc<dyn ClusterClient>,
    cloud: Arc<dyn LoadBalancerApi>,
    config: Arc<ControllerConfig>,
}

impl ModelBuilder {
    #[must_use]
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        cloud: Arc<dyn LoadBalancerApi>,
        config: Arc<ControllerConfig>,
    ) -> Self {
        Self {
            cluster,
            cloud,
            config,
        }
    }

    /// Build the model of `ga` from the endpoints loaded for it.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Validation`] for misconfiguration the user must fix and
    /// [`BuildError::Discovery`] when auto-discovery fails.
    pub async fn build_model(
        &self,
        ga: &GlobalAccelerator,
        loaded: &LoadResult,
    ) -> Result<AcceleratorModel, BuildError> {
        let owner = OwnerKey::from_accelerator(ga);

        let ip_address_type = ga.spec.ip_address_type.unwrap_or_default();
        let name = accelerator_name(
            &self.config.cluster_name,
            &owner,
            ip_address_type,
            ga.spec.name.as_deref(),
        );
        let tags = build_tags(&self.config, &owner, ga.spec.tags.as_ref())?;

        let declared = ga.spec.listeners.as_deref().unwrap_or_default();
        let listeners = resolve_listeners(
            declared,
            loaded,
            &owner.namespace,
            self.cluster.as_ref(),
            self.cloud.as_ref(),
        )
        .await?;
        validate_port_overrides(&listeners)?;

        let mut listener_models = Vec::with_capacity(listeners.len());
        for (index, listener) in listeners.iter().enumerate() {
            let id = format!("Listener-{index}");
            let endpoint_groups = build_endpoint_groups(
                index,
                &id,
                listener,
                loaded,
                &owner.namespace,
                self.config.default_region.as_deref(),
            )?;
            listener_models.push(ListenerModel {
                accelerator_arn: ResourceRef::arn_of(ACCELERATOR_RESOURCE_TYPE, ACCELERATOR_MODEL_ID),
                id,
                protocol: listener.protocol,
                port_ranges: listener.port_ranges.clone(),
                client_affinity: listener.client_affinity,
                endpoint_groups,
            });
        }

        let model = AcceleratorModel {
            id: ACCELERATOR_MODEL_ID.to_string(),
            name,
            ip_address_type,
            enabled: true,
            tags,
            listeners: listener_models,
        };

        debug!(
            owner = %owner,
            accelerator = %model.name,
            listeners = model.listeners.len(),
            endpoints = model.endpoint_ids().len(),
            "Built accelerator model"
        );

        Ok(model)
    }
}
