// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::Identity;
use crate::constants::document::ALL_NAMESPACES;
use crate::types::{AuthMethod, Role, StringList, StringSet};
use serde_json::Map;
use tracing::debug;

/// Create or extend the Kubernetes auth role named after the identity.
///
/// Roles are keyed by name only: identities with the same name in several namespaces share
/// one role bound to all of their namespaces.
pub fn upsert_kubernetes_role(
    auth: &mut AuthMethod,
    identity: &Identity,
    bind_all_namespaces: bool,
    token_ttl: &str,
) {
    let namespace = if bind_all_namespaces {
        ALL_NAMESPACES
    } else {
        identity.namespace.as_str()
    };

    let Some(role) = auth.roles.iter_mut().find(|r| r.name == identity.name) else {
        debug!(
            "Adding Kubernetes role {} bound to namespace {}",
            identity.name, namespace
        );
        auth.roles.push(Role {
            name: identity.name.clone(),
            bound_service_account_names: Some(StringSet::Single(identity.name.clone())),
            bound_service_account_namespaces: Some(StringSet::of(namespace)),
            token_policies: Some(StringList::of(&identity.name)),
            token_ttl: Some(token_ttl.to_string()),
            extra: Map::new(),
        });
        return;
    };

    if bind_all_namespaces {
        role.bound_service_account_namespaces = Some(StringSet::of(ALL_NAMESPACES));
        return;
    }

    let namespaces = role
        .bound_service_account_namespaces
        .get_or_insert_with(StringSet::default)
        .normalize();
    if namespaces.insert(identity.namespace.clone()) {
        debug!(
            "Bound Kubernetes role {} to additional namespace {}",
            identity.name, identity.namespace
        );
    }
}
