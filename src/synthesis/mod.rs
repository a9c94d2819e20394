// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pure synthesis of Vault configuration from annotated service accounts.
//!
//! Each phase takes the current configuration document and returns the converged one;
//! applying a phase to its own output returns that output unchanged.

pub mod database_role;
pub mod defaults;
pub mod kubernetes_role;
pub mod policy;
pub mod template;

pub use database_role::{upsert_database_role, DbRoleRequest};
pub use defaults::Defaults;
pub use kubernetes_role::upsert_kubernetes_role;
pub use policy::upsert_policy;
pub use template::PolicyTemplate;

use crate::config::Config;
use crate::constants::{ENABLED_VALUE, RESERVED_IDENTITY_NAME};
use crate::document::{extract, merge, Section};
use crate::error::{BinderError, Result};
use crate::types::{AuthMethod, Policy, SecretsEngine};
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::ResourceExt;
use serde_json::Value;

/// The name and namespace of a service account being synthesized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub namespace: String,
}

impl Identity {
    pub fn of(sa: &ServiceAccount) -> Self {
        Self {
            name: sa.name_any(),
            namespace: sa.namespace().unwrap_or_default(),
        }
    }
}

/// Check if a service account has the auto-configure annotation set to "true"
pub fn is_auto_configured(sa: &ServiceAccount, config: &Config) -> bool {
    sa.annotations()
        .get(&config.auto_configure_key())
        .is_some_and(|v| v == ENABLED_VALUE)
}

/// Database connection requested through the dynamic credentials annotation
pub fn requested_database<'a>(sa: &'a ServiceAccount, config: &Config) -> Option<&'a str> {
    sa.annotations()
        .get(&config.db_creds_key())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Whether synthesis may run for this service account at all
pub fn passes_gate(sa: &ServiceAccount, config: &Config) -> bool {
    is_auto_configured(sa, config) && sa.name_any() != RESERVED_IDENTITY_NAME
}

/// Upsert the identity's policy and Kubernetes auth role.
pub fn apply_auth_phase(
    document: &Value,
    identity: &Identity,
    config: &Config,
    defaults: &Defaults,
) -> Result<Value> {
    let mut auth: AuthMethod =
        extract(document, Section::KubernetesAuth)?.ok_or(BinderError::AuthMethodNotFound)?;
    let mut policies: Vec<Policy> = extract(document, Section::Policies)?.unwrap_or_default();

    upsert_policy(&mut policies, identity, &defaults.policy_template)?;
    upsert_kubernetes_role(
        &mut auth,
        identity,
        config.bind_all_namespaces,
        &config.token_ttl,
    );

    let mut updated = document.clone();
    merge(&mut updated, Section::Policies, &policies)?;
    merge(&mut updated, Section::KubernetesAuth, &auth)?;
    Ok(updated)
}

/// Create the identity's dynamic credentials role on `db_name`.
pub fn apply_db_phase(
    document: &Value,
    identity: &Identity,
    db_name: &str,
    defaults: &Defaults,
) -> Result<Value> {
    let mut engine: SecretsEngine =
        extract(document, Section::DatabaseEngine)?.ok_or(BinderError::SecretsEngineNotFound)?;

    let request = DbRoleRequest {
        db_name,
        creation_statement: &defaults.db_creation_statement,
        default_ttl: &defaults.db_default_ttl,
        max_ttl: &defaults.db_max_ttl,
    };
    if !upsert_database_role(&mut engine, identity, &request)? {
        return Ok(document.clone());
    }

    let mut updated = document.clone();
    merge(&mut updated, Section::DatabaseEngine, &engine)?;
    Ok(updated)
}
