// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Converges the Vault configuration document for a single service account.
//!
//! A reconciliation fetches the service account, checks the gate, fetches the defaults and
//! the Vault resource, then runs the auth phase and, when requested, the database phase.
//! Each phase ends with its own conditional write, skipped when the phase changed nothing.

use crate::config::Config;
use crate::constants::OPERATOR_NAME;
use crate::document::{write_patch, Section};
use crate::error::{BinderError, Result};
use crate::synthesis::{
    apply_auth_phase, apply_db_phase, passes_gate, requested_database, Defaults, Identity,
};
use crate::types::Vault;
use k8s_openapi::api::core::v1::{ConfigMap, ServiceAccount};
use kube::{
    api::{Patch, PatchParams},
    Api, Client, ResourceExt,
};
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Result of a reconciliation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The service account no longer exists
    IdentityGone,
    /// The service account is not annotated for synthesis, or uses the reserved name
    NotEnabled,
    /// Synthesis ran; `writes` is the number of document writes it needed
    Synthesized { writes: usize },
}

pub struct Synthesizer {
    client: Client,
    config: Config,
}

impl Synthesizer {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[instrument(skip(self))]
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<Outcome> {
        let service_accounts: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        let Some(sa) = service_accounts.get_opt(name).await? else {
            debug!("Service account {}/{} is gone, nothing to do", namespace, name);
            return Ok(Outcome::IdentityGone);
        };

        if !passes_gate(&sa, &self.config) {
            debug!(
                "Service account {}/{} is not enabled for synthesis, skipping",
                namespace, name
            );
            return Ok(Outcome::NotEnabled);
        }

        let identity = Identity::of(&sa);
        let defaults = self.fetch_defaults().await?;
        let mut vault = self.fetch_vault().await?;
        let mut writes = 0;

        let updated = apply_auth_phase(&vault.document(), &identity, &self.config, &defaults)?;
        if let Some(written) = self
            .write(&vault, &updated, &[Section::Policies, Section::KubernetesAuth])
            .await?
        {
            info!("Configured Vault policy and role for {}/{}", namespace, name);
            vault = written;
            writes += 1;
        }

        if let Some(db_name) = requested_database(&sa, &self.config) {
            let updated = apply_db_phase(&vault.document(), &identity, db_name, &defaults)?;
            if self
                .write(&vault, &updated, &[Section::DatabaseEngine])
                .await?
                .is_some()
            {
                info!(
                    "Configured database role for {}/{} on {}",
                    namespace, name, db_name
                );
                writes += 1;
            }
        }

        Ok(Outcome::Synthesized { writes })
    }

    /// Read the defaults-override ConfigMap, using built-in defaults when it does not exist
    async fn fetch_defaults(&self) -> Result<Defaults> {
        let config_maps: Api<ConfigMap> =
            Api::namespaced(self.client.clone(), &self.config.defaults_configmap_namespace);
        let config_map = config_maps
            .get_opt(&self.config.defaults_configmap_name)
            .await?;
        if config_map.is_none() {
            debug!(
                "ConfigMap {}/{} not found, using defaults",
                self.config.defaults_configmap_namespace, self.config.defaults_configmap_name
            );
        }
        Defaults::from_config_map(config_map.as_ref())
    }

    async fn fetch_vault(&self) -> Result<Vault> {
        let vaults: Api<Vault> = Api::namespaced(self.client.clone(), &self.config.vault_namespace);
        vaults
            .get_opt(&self.config.target_vault_name)
            .await?
            .ok_or_else(|| BinderError::VaultNotFound {
                namespace: self.config.vault_namespace.clone(),
                name: self.config.target_vault_name.clone(),
            })
    }

    /// Write `sections` of `updated` back to the Vault resource, conditional on its
    /// resource version. Returns the written resource, or `None` when nothing changed.
    async fn write(&self, vault: &Vault, updated: &Value, sections: &[Section]) -> Result<Option<Vault>> {
        if vault.document() == *updated {
            debug!("Vault configuration already up to date");
            return Ok(None);
        }

        let patch = write_patch(vault.resource_version().as_deref(), updated, sections);
        let params = PatchParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };
        let vaults: Api<Vault> = Api::namespaced(self.client.clone(), &self.config.vault_namespace);
        let written = vaults
            .patch(&vault.name_any(), &params, &Patch::Merge(&patch))
            .await?;
        Ok(Some(written))
    }
}
