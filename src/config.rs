// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::num::NonZeroU16;

const SERVICE_ACCOUNT_NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the Vault custom resource whose external config is managed
    pub target_vault_name: String,
    /// Namespace holding the target Vault resource
    pub vault_namespace: String,
    pub annotation_prefix: String,
    pub auto_configure_annotation: String,
    pub db_creds_annotation: String,
    /// Bind roles to `*` instead of the service account's namespace
    pub bind_all_namespaces: bool,
    /// Value written to `token_ttl` of new roles
    pub token_ttl: String,
    pub defaults_configmap_name: String,
    pub defaults_configmap_namespace: String,
    /// Maximum number of service accounts reconciled in parallel
    pub concurrency: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let vault_namespace = match lookup("VAULT_NAMESPACE") {
            Some(ns) => ns,
            None => operator_namespace().unwrap_or_else(|| "default".to_string()),
        };

        let bind_all_namespaces: bool = get("BIND_ALL_NAMESPACES", "false")
            .parse()
            .context("BIND_ALL_NAMESPACES must be 'true' or 'false'")?;
        // kube-runtime reads a concurrency of 0 as unbounded
        let concurrency = get("CONCURRENCY", "4")
            .parse::<NonZeroU16>()
            .context("CONCURRENCY must be a positive integer")?
            .get();

        Ok(Config {
            target_vault_name: get("TARGET_VAULT_NAME", "vault"),
            vault_namespace,
            annotation_prefix: get("ANNOTATION_PREFIX", "vault.binder.io"),
            auto_configure_annotation: get("AUTO_CONFIGURE_ANNOTATION", "auto-configure"),
            db_creds_annotation: get("DB_CREDS_ANNOTATION", "db-dynamic-creds"),
            bind_all_namespaces,
            token_ttl: get("TOKEN_TTL", "5m"),
            defaults_configmap_name: get("DEFAULTS_CONFIGMAP_NAME", "vault-dynamic-configuration"),
            defaults_configmap_namespace: get("DEFAULTS_CONFIGMAP_NAMESPACE", "vault"),
            concurrency,
        })
    }

    /// Full key of the annotation that gates all synthesis
    pub fn auto_configure_key(&self) -> String {
        format!("{}/{}", self.annotation_prefix, self.auto_configure_annotation)
    }

    /// Full key of the annotation naming the database connection
    pub fn db_creds_key(&self) -> String {
        format!("{}/{}", self.annotation_prefix, self.db_creds_annotation)
    }
}

/// Namespace the operator pod runs in, when running in-cluster
fn operator_namespace() -> Option<String> {
    fs::read_to_string(SERVICE_ACCOUNT_NAMESPACE_FILE)
        .ok()
        .map(|ns| ns.trim().to_string())
        .filter(|ns| !ns.is_empty())
}
