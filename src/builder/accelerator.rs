// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Accelerator naming and tagging.

use crate::config::{ControllerConfig, TagPrecedence};
use crate::crd::IpAddressType;
use crate::constants::{
    GENERATED_NAME_HASH_LEN, GENERATED_NAME_PREFIX, GENERATED_NAME_SEGMENT_LEN,
    MAX_ACCELERATOR_NAME_LEN,
};
use crate::endpoints::OwnerKey;
use crate::errors::ValidationError;
use crate::labels::{
    RESERVED_TAG_KEYS, TAG_CLUSTER, TAG_RESOURCE, TAG_RESOURCE_ACCELERATOR, TAG_STACK,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Name of the accelerator: the explicit name when given, otherwise a stable name
/// derived from the cluster, the owner and the IP addressing mode.
///
/// Generated names look like `k8s-shop-web-1a2b3c4d5e` and never exceed
/// [`MAX_ACCELERATOR_NAME_LEN`].
#[must_use]
pub fn accelerator_name(
    cluster_name: &str,
    owner: &OwnerKey,
    ip_address_type: IpAddressType,
    explicit: Option<&str>,
) -> String {
    if let Some(name) = explicit.filter(|name| !name.is_empty()) {
        return name.to_string();
    }

    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{cluster_name}/{}/{}/{ip_address_type}",
        owner.namespace, owner.name
    ));
    let hash = format!("{:x}", hasher.finalize());

    let mut name = format!(
        "{GENERATED_NAME_PREFIX}-{}-{}-{}",
        name_segment(&owner.namespace),
        name_segment(&owner.name),
        &hash[..GENERATED_NAME_HASH_LEN]
    );
    name.truncate(MAX_ACCELERATOR_NAME_LEN);
    name
}

fn name_segment(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .take(GENERATED_NAME_SEGMENT_LEN)
        .collect()
}

/// Merge controller default tags with user tags and apply the operator's tracking tags.
///
/// Tracking tags always win.
///
/// # Errors
///
/// Returns [`ValidationError::ReservedTagKey`] when a user tag uses a tracking key.
pub fn build_tags(
    config: &ControllerConfig,
    owner: &OwnerKey,
    user_tags: Option<&BTreeMap<String, String>>,
) -> Result<BTreeMap<String, String>, ValidationError> {
    let user_tags = user_tags.cloned().unwrap_or_default();
    if let Some(key) = user_tags
        .keys()
        .find(|key| RESERVED_TAG_KEYS.contains(&key.as_str()))
    {
        return Err(ValidationError::ReservedTagKey { key: key.clone() });
    }

    let defaults = config.default_tags_map();
    let mut tags = match config.tag_precedence {
        TagPrecedence::Defaults => {
            let mut tags = user_tags;
            tags.extend(defaults);
            tags
        }
        TagPrecedence::User => {
            let mut tags = defaults;
            tags.extend(user_tags);
            tags
        }
    };

    tags.insert(TAG_CLUSTER.to_string(), config.cluster_name.clone());
    tags.insert(TAG_RESOURCE.to_string(), TAG_RESOURCE_ACCELERATOR.to_string());
    tags.insert(TAG_STACK.to_string(), owner.to_string());

    Ok(tags)
}

#[cfg(test)]
#[path = "accelerator_tests.rs"]
mod accelerator_tests;
