// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `builder/accelerator.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    fn owner() -> OwnerKey {
        OwnerKey::new("shop", "web")
    }

    #[test]
    fn test_explicit_name_is_kept() {
        assert_eq!(
            accelerator_name(
                "prod",
                &owner(),
                IpAddressType::Ipv4,
                Some("my-accelerator")
            ),
            "my-accelerator"
        );
    }

    #[test]
    fn test_generated_name_is_stable_and_bounded() {
        let first = accelerator_name("prod", &owner(), IpAddressType::Ipv4, None);
        let second = accelerator_name("prod", &owner(), IpAddressType::Ipv4, Some(""));
        assert_eq!(first, second);
        assert!(first.starts_with("k8s-shop-web-"));
        assert_eq!(first.len(), "k8s-shop-web-".len() + GENERATED_NAME_HASH_LEN);
        assert!(first.len() <= MAX_ACCELERATOR_NAME_LEN);
    }

    #[test]
    fn test_generated_name_depends_on_cluster_and_owner() {
        let base = accelerator_name("prod", &owner(), IpAddressType::Ipv4, None);
        assert_ne!(
            base,
            accelerator_name("staging", &owner(), IpAddressType::Ipv4, None)
        );
        assert_ne!(
            base,
            accelerator_name(
                "prod",
                &OwnerKey::new("shop", "api"),
                IpAddressType::Ipv4,
                None
            )
        );
    }

    #[test]
    fn test_generated_name_depends_on_ip_address_type() {
        let ipv4 = accelerator_name("prod", &owner(), IpAddressType::Ipv4, None);
        let dual_stack = accelerator_name("prod", &owner(), IpAddressType::DualStack, None);
        assert_ne!(ipv4, dual_stack);
        assert!(dual_stack.starts_with("k8s-shop-web-"));
    }

    #[test]
    fn test_generated_name_sanitizes_and_truncates_segments() {
        let name = accelerator_name(
            "prod",
            &OwnerKey::new("very-long-namespace", "web.frontend.v2"),
            IpAddressType::Ipv4,
            None,
        );
        let segments: Vec<&str> = name.split('-').collect();
        assert_eq!(segments[0], "k8s");
        assert_eq!(segments[1], "verylong");
        assert_eq!(segments[2], "webfront");
        assert!(segments[3].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tracking_tags_are_applied() {
        let config = ControllerConfig::for_cluster("prod");
        let tags = build_tags(&config, &owner(), None).unwrap();

        assert_eq!(tags.get(TAG_CLUSTER).map(String::as_str), Some("prod"));
        assert_eq!(
            tags.get(TAG_RESOURCE).map(String::as_str),
            Some(TAG_RESOURCE_ACCELERATOR)
        );
        assert_eq!(tags.get(TAG_STACK).map(String::as_str), Some("shop/web"));
    }

    #[test]
    fn test_reserved_user_tag_is_rejected() {
        let config = ControllerConfig::for_cluster("prod");
        let user = BTreeMap::from([(TAG_STACK.to_string(), "spoofed".to_string())]);

        let err = build_tags(&config, &owner(), Some(&user)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ReservedTagKey {
                key: TAG_STACK.to_string()
            }
        );
    }

    #[test]
    fn test_default_tags_win_by_default() {
        let mut config = ControllerConfig::for_cluster("prod");
        config.default_tags = vec![
            ("team".to_string(), "platform".to_string()),
            ("env".to_string(), "prod".to_string()),
        ];
        let user = BTreeMap::from([
            ("team".to_string(), "checkout".to_string()),
            ("app".to_string(), "web".to_string()),
        ]);

        let tags = build_tags(&config, &owner(), Some(&user)).unwrap();
        assert_eq!(tags["team"], "platform");
        assert_eq!(tags["env"], "prod");
        assert_eq!(tags["app"], "web");
    }

    #[test]
    fn test_user_tags_win_when_configured() {
        let mut config = ControllerConfig::for_cluster("prod");
        config.tag_precedence = TagPrecedence::User;
        config.default_tags = vec![("team".to_string(), "platform".to_string())];
        let user = BTreeMap::from([("team".to_string(), "checkout".to_string())]);

        let tags = build_tags(&config, &owner(), Some(&user)).unwrap();
        assert_eq!(tags["team"], "checkout");
    }
}
