// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller configuration.
//!
//! Every option can be given as a command line flag or through the environment,
//! which is how the operator is configured when deployed.

use crate::constants::{DEFAULT_DNS_CACHE_TTL_SECS, DEFAULT_METRICS_BIND_ADDRESS};
use clap::{Parser, ValueEnum};
use std::collections::BTreeMap;
use std::time::Duration;

/// Which side wins when a default tag and a user tag share a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TagPrecedence {
    /// Controller default tags override user tags
    #[default]
    Defaults,
    /// User tags override controller default tags
    User,
}

/// Runtime configuration of the accelerator operator.
#[derive(Parser, Debug, Clone)]
#[command(name = "accelerator-operator", version, about)]
pub struct ControllerConfig {
    /// Name of the Kubernetes cluster, used in generated names and tags
    #[arg(long, env = "CLUSTER_NAME")]
    pub cluster_name: String,

    /// Region applied to endpoint groups that do not declare one
    #[arg(long, env = "AWS_REGION")]
    pub default_region: Option<String>,

    /// Tags applied to every accelerator, as comma separated key=value pairs
    #[arg(long, env = "DEFAULT_TAGS", value_delimiter = ',', value_parser = parse_tag)]
    pub default_tags: Vec<(String, String)>,

    /// Whether default tags or user tags win on key collisions
    #[arg(long, env = "TAG_PRECEDENCE", value_enum, default_value_t = TagPrecedence::Defaults)]
    pub tag_precedence: TagPrecedence,

    /// Lifetime of cached DNS name to load balancer ARN mappings, in seconds
    #[arg(long, env = "DNS_CACHE_TTL_SECS", default_value_t = DEFAULT_DNS_CACHE_TTL_SECS)]
    pub dns_cache_ttl_secs: u64,

    /// Address the metrics HTTP server listens on
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = DEFAULT_METRICS_BIND_ADDRESS)]
    pub metrics_bind_address: String,
}

impl ControllerConfig {
    /// Configuration with defaults for everything but the cluster name.
    #[must_use]
    pub fn for_cluster(cluster_name: &str) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            default_region: None,
            default_tags: Vec::new(),
            tag_precedence: TagPrecedence::default(),
            dns_cache_ttl_secs: DEFAULT_DNS_CACHE_TTL_SECS,
            metrics_bind_address: DEFAULT_METRICS_BIND_ADDRESS.to_string(),
        }
    }

    #[must_use]
    pub fn default_tags_map(&self) -> BTreeMap<String, String> {
        self.default_tags.iter().cloned().collect()
    }

    #[must_use]
    pub fn dns_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.dns_cache_ttl_secs)
    }
}

/// Parse one `key=value` tag.
///
/// # Errors
///
/// Returns an error when the `=` separator is missing or the key is empty.
pub fn parse_tag(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("tag '{raw}' must be in key=value form"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("tag '{raw}' has an empty key"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
