// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cached resolution of load balancer DNS names to load balancer ARNs.
//!
//! Every Service, Ingress and Gateway endpoint is reduced to the DNS name of its load
//! balancer; Global Accelerator needs the ARN. Looking the ARN up means paging through
//! `DescribeLoadBalancers`, so results are kept for a fixed TTL and shared by all
//! reconciliations.
//!
//! Hits take a shared read lock. A miss performs the lookup without holding any lock
//! and then inserts under the write lock; two concurrent misses for the same name may
//! both call the backend, which is harmless since the answers agree.

use crate::cloud::LoadBalancerApi;
use crate::errors::CloudError;
use crate::metrics::record_dns_cache_lookup;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone, Debug)]
struct CacheEntry {
    arn: String,
    expires_at: Instant,
}

/// Resolves load balancer DNS names to ARNs, caching successful answers.
pub struct DnsResolver {
    cloud: Arc<dyn LoadBalancerApi>,
    ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl DnsResolver {
    #[must_use]
    pub fn new(cloud: Arc<dyn LoadBalancerApi>, ttl: Duration) -> Self {
        Self {
            cloud,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `dns_name` to the ARN of its load balancer.
    ///
    /// DNS names are case-insensitive and cached in lowercase. Failures are never cached.
    ///
    /// # Errors
    ///
    /// Returns the [`CloudError`] of the backend lookup on a cache miss.
    pub async fn resolve(&self, dns_name: &str) -> Result<String, CloudError> {
        let key = dns_name.to_ascii_lowercase();

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&key) {
                if entry.expires_at > Instant::now() {
                    record_dns_cache_lookup(true);
                    return Ok(entry.arn.clone());
                }
            }
        }

        record_dns_cache_lookup(false);
        debug!(dns_name = %key, "DNS cache miss, looking up load balancer");
        let arn = self.cloud.find_load_balancer_arn(&key).await?;

        self.cache.write().await.insert(
            key,
            CacheEntry {
                arn: arn.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(arn)
    }

    /// Drop the cached answer for `dns_name`, if any.
    pub async fn invalidate(&self, dns_name: &str) {
        self.cache
            .write()
            .await
            .remove(&dns_name.to_ascii_lowercase());
    }

    /// Drop every expired entry. Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|_, entry| entry.expires_at > now);
        before - cache.len()
    }

    /// Number of cached entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

#[cfg(test)]
#[path = "dns_resolver_tests.rs"]
mod dns_resolver_tests;
