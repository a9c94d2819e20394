// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Synthesis defaults, optionally overridden by a ConfigMap.

use super::template::PolicyTemplate;
use crate::constants::defaults::*;
use crate::error::Result;
use k8s_openapi::api::core::v1::ConfigMap;

#[derive(Debug, Clone)]
pub struct Defaults {
    pub policy_template: PolicyTemplate,
    pub db_creation_statement: String,
    pub db_default_ttl: String,
    pub db_max_ttl: String,
}

impl Defaults {
    /// Built-in defaults, used when no override ConfigMap exists
    pub fn builtin() -> Result<Self> {
        Self::from_config_map(None)
    }

    /// Resolve every value from the ConfigMap, falling back to the built-in constant per key.
    pub fn from_config_map(config_map: Option<&ConfigMap>) -> Result<Self> {
        let data = config_map.and_then(|cm| cm.data.as_ref());
        let get = |key: &str, default: &str| {
            data.and_then(|d| d.get(key))
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Defaults {
            policy_template: PolicyTemplate::parse(&get(POLICY_TEMPLATE, DEFAULT_POLICY_TEMPLATE))?,
            db_creation_statement: get(DB_USER_CREATION_STATEMENT, DEFAULT_DB_USER_CREATION_STATEMENT),
            db_default_ttl: get(DB_DEFAULT_TTL, DEFAULT_DB_DEFAULT_TTL),
            db_max_ttl: get(DB_MAX_TTL, DEFAULT_DB_MAX_TTL),
        })
    }
}
