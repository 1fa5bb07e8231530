// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use clap::Parser;

    #[test]
    fn test_parse_minimal_flags() {
        let config =
            ControllerConfig::try_parse_from(["accelerator-operator", "--cluster-name", "prod"])
                .unwrap();

        assert_eq!(config.cluster_name, "prod");
        assert_eq!(config.tag_precedence, TagPrecedence::Defaults);
        assert_eq!(config.dns_cache_ttl(), Duration::from_secs(300));
        assert!(config.default_tags.is_empty());
    }

    #[test]
    fn test_parse_tags_and_precedence() {
        let config = ControllerConfig::try_parse_from([
            "accelerator-operator",
            "--cluster-name",
            "prod",
            "--default-tags",
            "team=edge,cost-center = 42",
            "--tag-precedence",
            "user",
            "--default-region",
            "us-east-1",
        ])
        .unwrap();

        let tags = config.default_tags_map();
        assert_eq!(tags.get("team").map(String::as_str), Some("edge"));
        assert_eq!(tags.get("cost-center").map(String::as_str), Some("42"));
        assert_eq!(config.tag_precedence, TagPrecedence::User);
        assert_eq!(config.default_region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_parse_tag_rejects_malformed() {
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=value").is_err());
        assert_eq!(
            parse_tag("k=").unwrap(),
            ("k".to_string(), String::new())
        );
    }
}
