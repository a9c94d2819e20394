// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed views of the sections of the Vault configuration document we manage.
//!
//! Every struct keeps the fields it does not model in `extra`, so a section survives
//! a decode/encode cycle without losing configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A field Vault accepts either as a single (comma separated) string or as a list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringSet {
    Single(String),
    Many(BTreeSet<String>),
}

impl Default for StringSet {
    fn default() -> Self {
        StringSet::Many(BTreeSet::new())
    }
}

impl StringSet {
    pub fn of(value: &str) -> Self {
        StringSet::Many(BTreeSet::from([value.to_string()]))
    }

    /// Convert to the `Many` form. Must be called before any mutation.
    pub fn normalize(&mut self) -> &mut BTreeSet<String> {
        if let StringSet::Single(value) = self {
            let values = value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            *self = StringSet::Many(values);
        }
        match self {
            StringSet::Many(values) => values,
            StringSet::Single(_) => unreachable!("normalized above"),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            StringSet::Single(v) => v.split(',').any(|v| v.trim() == value),
            StringSet::Many(values) => values.contains(value),
        }
    }
}

/// A list Vault also accepts as a single string. Order is kept as written.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringList {
    Single(String),
    Many(Vec<String>),
}

impl StringList {
    pub fn of(value: &str) -> Self {
        StringList::Many(vec![value.to_string()])
    }
}

/// An `auth` entry
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AuthMethod {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthMethod {
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Role {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_service_account_names: Option<StringSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_service_account_namespaces: Option<StringSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_policies: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ttl: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `policies` entry
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Policy {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `secrets` entry
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SecretsEngine {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub configuration: DbConfiguration,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SecretsEngine {
    pub fn connection(&self, name: &str) -> Option<&DbConnection> {
        self.configuration.config.iter().find(|c| c.name == name)
    }

    pub fn connection_mut(&mut self, name: &str) -> Option<&mut DbConnection> {
        self.configuration.config.iter_mut().find(|c| c.name == name)
    }

    pub fn role(&self, name: &str) -> Option<&DbRole> {
        self.configuration.roles.iter().find(|r| r.name == name)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DbConfiguration {
    #[serde(default)]
    pub config: Vec<DbConnection>,
    #[serde(default)]
    pub roles: Vec<DbRole>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A configured database; connection parameters stay in `extra`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DbConnection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<StringSet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DbRole {
    pub name: String,
    pub db_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_statements: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ttl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ttl: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
