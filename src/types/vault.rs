// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The bank-vaults `Vault` resource. Only `externalConfig` is interpreted; every other
/// spec field is carried along untouched.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(group = "vault.banzaicloud.com", version = "v1alpha1", kind = "Vault")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct VaultSpec {
    #[serde(default)]
    pub external_config: Value,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Vault {
    /// The configuration document, as an empty object when the resource has none yet
    pub fn document(&self) -> Value {
        match &self.spec.external_config {
            Value::Null => Value::Object(Default::default()),
            doc => doc.clone(),
        }
    }
}
