// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `tracking/resources_manager.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::endpoints::EndpointReference;
    use crate::test_utils::{FakeCluster, FakeWatchFactory};

    fn manager(cluster: FakeCluster) -> (EndpointResourcesManager, Arc<FakeWatchFactory>) {
        let factory = Arc::new(FakeWatchFactory::new());
        let manager = EndpointResourcesManager::new(factory.clone(), Arc::new(cluster));
        (manager, factory)
    }

    fn loaded_service(name: &str) -> LoadedEndpoint {
        LoadedEndpoint::loaded(
            EndpointReference::Service {
                namespace: "shop".to_string(),
                name: name.to_string(),
            },
            format!("arn:{name}"),
        )
    }

    fn loaded_gateway(name: &str) -> LoadedEndpoint {
        LoadedEndpoint::loaded(
            EndpointReference::Gateway {
                namespace: "shop".to_string(),
                name: name.to_string(),
            },
            format!("arn:{name}"),
        )
    }

    fn service_key(name: &str) -> ResourceKey {
        ResourceKey::new(EndpointType::Service, "shop", name)
    }

    #[tokio::test]
    async fn test_shared_watch_lives_until_last_consumer_leaves() {
        let (manager, factory) = manager(FakeCluster::new());
        let web = OwnerKey::new("shop", "web");
        let mobile = OwnerKey::new("shop", "mobile");

        manager.monitor_endpoint_resources(&web, &[loaded_service("api")]).await;
        manager.monitor_endpoint_resources(&mobile, &[loaded_service("api")]).await;

        assert_eq!(factory.started(), vec![service_key("api")]);
        assert_eq!(manager.consumers_of(&service_key("api")).await, vec![mobile.clone(), web.clone()]);

        manager.remove_ga(&web).await;
        assert!(factory.stopped().is_empty());
        assert_eq!(manager.watch_count().await, 1);

        manager.remove_ga(&mobile).await;
        assert_eq!(factory.stopped(), vec![service_key("api")]);
        assert_eq!(manager.watch_count().await, 0);
    }

    #[tokio::test]
    async fn test_monitor_releases_resources_no_longer_referenced() {
        let (manager, factory) = manager(FakeCluster::new());
        let web = OwnerKey::new("shop", "web");

        manager
            .monitor_endpoint_resources(&web, &[loaded_service("api"), loaded_service("admin")])
            .await;
        manager.monitor_endpoint_resources(&web, &[loaded_service("api")]).await;

        assert_eq!(factory.started().len(), 2);
        assert_eq!(factory.stopped(), vec![service_key("admin")]);
        assert_eq!(manager.watch_count().await, 1);
        assert_eq!(factory.live(), 1);
    }

    #[tokio::test]
    async fn test_repeated_monitor_does_not_restart_watches() {
        let (manager, factory) = manager(FakeCluster::new());
        let web = OwnerKey::new("shop", "web");

        for _ in 0..3 {
            manager.monitor_endpoint_resources(&web, &[loaded_service("api")]).await;
        }

        assert_eq!(factory.started().len(), 1);
        assert!(factory.stopped().is_empty());
    }

    #[tokio::test]
    async fn test_missing_resources_are_watched_but_denied_and_direct_are_not() {
        let (manager, factory) = manager(FakeCluster::new());
        let web = OwnerKey::new("shop", "web");

        let missing = LoadedEndpoint::warning(
            EndpointReference::Service {
                namespace: "shop".to_string(),
                name: "later".to_string(),
            },
            "not found",
        );
        let mut denied = LoadedEndpoint::warning(
            EndpointReference::Service {
                namespace: "backend".to_string(),
                name: "api".to_string(),
            },
            "not permitted",
        );
        denied.reference_allowed = false;
        let direct = LoadedEndpoint::loaded(
            EndpointReference::EndpointId {
                arn: "arn:lb".to_string(),
            },
            "arn:lb".to_string(),
        );

        manager
            .monitor_endpoint_resources(&web, &[missing, denied, direct])
            .await;

        assert_eq!(factory.started(), vec![service_key("later")]);
    }

    #[tokio::test]
    async fn test_gateways_skipped_without_gateway_api() {
        let cluster = Arc::new(FakeCluster::new());
        let factory = Arc::new(FakeWatchFactory::new());
        let manager = EndpointResourcesManager::new(factory.clone(), cluster.clone());
        let web = OwnerKey::new("shop", "web");

        manager
            .monitor_endpoint_resources(&web, &[loaded_service("api"), loaded_gateway("edge")])
            .await;
        assert_eq!(factory.started(), vec![service_key("api")]);

        cluster.set_gateway_api(true);
        manager
            .monitor_endpoint_resources(&web, &[loaded_service("api"), loaded_gateway("edge")])
            .await;
        assert_eq!(
            factory.started(),
            vec![
                service_key("api"),
                ResourceKey::new(EndpointType::Gateway, "shop", "edge")
            ]
        );
    }

    #[tokio::test]
    async fn test_watch_count_matches_consumed_resources_after_interleaving() {
        let (manager, factory) = manager(FakeCluster::new());
        let owners: Vec<OwnerKey> = (0..4)
            .map(|index| OwnerKey::new("shop", &format!("ga-{index}")))
            .collect();

        manager
            .monitor_endpoint_resources(&owners[0], &[loaded_service("a"), loaded_service("b")])
            .await;
        manager
            .monitor_endpoint_resources(&owners[1], &[loaded_service("b"), loaded_service("c")])
            .await;
        manager.monitor_endpoint_resources(&owners[2], &[loaded_service("c")]).await;
        manager.remove_ga(&owners[1]).await;
        manager.monitor_endpoint_resources(&owners[0], &[loaded_service("d")]).await;
        manager.remove_ga(&owners[3]).await;

        // owners[0] -> d, owners[2] -> c
        assert_eq!(manager.watch_count().await, 2);
        assert_eq!(factory.live(), 2);
        assert_eq!(manager.consumers_of(&service_key("c")).await, vec![owners[2].clone()]);
        assert!(manager.consumers_of(&service_key("a")).await.is_empty());
    }
}
