// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `endpoints/authorization.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::test_utils::{reference_grant, FakeCluster};

    fn service_ref(namespace: &str, name: &str) -> EndpointReference {
        EndpointReference::Service {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_grant_without_name_allows_any_target_of_kind() {
        let grant = reference_grant("backend", "shop", "", "Service", None);
        assert!(grant_allows(&grant, "shop", EndpointType::Service, "api"));
        assert!(grant_allows(&grant, "shop", EndpointType::Service, "other"));
    }

    #[test]
    fn test_grant_with_name_allows_only_that_target() {
        let grant = reference_grant("backend", "shop", "", "Service", Some("api"));
        assert!(grant_allows(&grant, "shop", EndpointType::Service, "api"));
        assert!(!grant_allows(&grant, "shop", EndpointType::Service, "other"));
    }

    #[test]
    fn test_grant_requires_matching_source_namespace_and_kind() {
        let grant = reference_grant("backend", "shop", "", "Service", None);
        assert!(!grant_allows(&grant, "billing", EndpointType::Service, "api"));
        assert!(!grant_allows(&grant, "shop", EndpointType::Ingress, "api"));
    }

    #[test]
    fn test_grant_requires_target_group() {
        let grant = reference_grant("backend", "shop", "networking.k8s.io", "Ingress", None);
        assert!(grant_allows(&grant, "shop", EndpointType::Ingress, "site"));

        let wrong_group = reference_grant("backend", "shop", "", "Ingress", None);
        assert!(!grant_allows(&wrong_group, "shop", EndpointType::Ingress, "site"));
    }

    #[tokio::test]
    async fn test_same_namespace_is_allowed_without_probing() {
        let cluster = FakeCluster::new();
        let allowed = is_reference_allowed(&cluster, "shop", &service_ref("shop", "api"))
            .await
            .unwrap();
        assert!(allowed);
        assert_eq!(
            cluster
                .gateway_probes
                .load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_direct_reference_is_allowed() {
        let cluster = FakeCluster::new();
        let reference = EndpointReference::EndpointId {
            arn: "arn:lb".to_string(),
        };
        assert!(is_reference_allowed(&cluster, "shop", &reference).await.unwrap());
    }

    #[tokio::test]
    async fn test_cross_namespace_denied_without_gateway_api() {
        let cluster =
            FakeCluster::new().with_grant(reference_grant("backend", "shop", "", "Service", None));
        let allowed = is_reference_allowed(&cluster, "shop", &service_ref("backend", "api"))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_cross_namespace_allowed_with_grant() {
        let cluster = FakeCluster::new()
            .with_gateway_api()
            .with_grant(reference_grant("backend", "shop", "", "Service", Some("api")));

        assert!(
            is_reference_allowed(&cluster, "shop", &service_ref("backend", "api"))
                .await
                .unwrap()
        );
        assert!(
            !is_reference_allowed(&cluster, "shop", &service_ref("backend", "admin"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_cross_namespace_denied_without_grant() {
        let cluster = FakeCluster::new().with_gateway_api();
        assert!(
            !is_reference_allowed(&cluster, "shop", &service_ref("backend", "api"))
                .await
                .unwrap()
        );
    }
}
