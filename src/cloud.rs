// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read access to AWS Elastic Load Balancing.
//!
//! The operator never mutates cloud resources; it only needs to map a load balancer
//! DNS name to its ARN and to list the listeners of a load balancer during
//! auto-discovery.

use crate::errors::CloudError;
use async_trait::async_trait;
use aws_sdk_elasticloadbalancingv2::error::DisplayErrorContext;
use aws_sdk_elasticloadbalancingv2::Client;
use tracing::debug;

/// A listener of an Elastic Load Balancer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloudListener {
    /// Protocol as reported by ELBv2 (`TCP`, `UDP`, `TCP_UDP`, `TLS`, `HTTP`, `HTTPS`, ...)
    pub protocol: String,
    pub port: i32,
}

/// Minimal ELBv2 capability surface.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    /// Find the ARN of the load balancer whose DNS name is `dns_name`.
    async fn find_load_balancer_arn(&self, dns_name: &str) -> Result<String, CloudError>;

    /// List the listeners of a load balancer.
    async fn list_listeners(&self, load_balancer_arn: &str)
        -> Result<Vec<CloudListener>, CloudError>;
}

/// [`LoadBalancerApi`] backed by the AWS SDK.
#[derive(Clone)]
pub struct Elbv2Client {
    client: Client,
}

impl Elbv2Client {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration (environment, IRSA, profile).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl LoadBalancerApi for Elbv2Client {
    async fn find_load_balancer_arn(&self, dns_name: &str) -> Result<String, CloudError> {
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|err| CloudError::Request {
                    operation: "DescribeLoadBalancers".to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                })?;

            let found = output.load_balancers().iter().find(|lb| {
                lb.dns_name()
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(dns_name))
            });
            if let Some(arn) = found.and_then(|lb| lb.load_balancer_arn()) {
                debug!(dns_name, arn, "Resolved load balancer ARN");
                return Ok(arn.to_string());
            }

            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Err(CloudError::LoadBalancerNotFound {
            dns_name: dns_name.to_string(),
        })
    }

    async fn list_listeners(
        &self,
        load_balancer_arn: &str,
    ) -> Result<Vec<CloudListener>, CloudError> {
        let mut listeners = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_listeners()
                .load_balancer_arn(load_balancer_arn)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|err| CloudError::Request {
                    operation: "DescribeListeners".to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                })?;

            listeners.extend(output.listeners().iter().filter_map(|listener| {
                Some(CloudListener {
                    protocol: listener.protocol()?.as_str().to_string(),
                    port: listener.port()?,
                })
            }));

            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(listeners)
    }
}
