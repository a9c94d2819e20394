// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Extract and merge the managed sections of the configuration document.
//!
//! The document is kept as an untyped [`Value`]; only the addressed section is decoded
//! into a typed subtree and only that section is written back. Nothing outside the
//! managed sections (other auth methods, other secret engines, audit devices, ...) is
//! ever re-encoded.

use crate::constants::document::{DATABASE_SECRETS_TYPE, KUBERNETES_AUTH_TYPE};
use crate::error::{BinderError, Result};
use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// A managed section of the configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// The `auth` entry with `type: kubernetes`
    KubernetesAuth,
    /// The `policies` list
    Policies,
    /// The `secrets` entry with `type: database`
    DatabaseEngine,
}

impl Section {
    /// Top-level document key owning this section
    pub fn key(self) -> &'static str {
        match self {
            Section::KubernetesAuth => "auth",
            Section::Policies => "policies",
            Section::DatabaseEngine => "secrets",
        }
    }

    /// Discriminator of the list entry, for sections that live inside a typed list
    fn entry_type(self) -> Option<&'static str> {
        match self {
            Section::KubernetesAuth => Some(KUBERNETES_AUTH_TYPE),
            Section::Policies => None,
            Section::DatabaseEngine => Some(DATABASE_SECRETS_TYPE),
        }
    }

    fn not_found(self) -> BinderError {
        match self {
            Section::KubernetesAuth => BinderError::AuthMethodNotFound,
            Section::DatabaseEngine => BinderError::SecretsEngineNotFound,
            Section::Policies => BinderError::DocumentError(serde_json::Error::custom(
                "policies section not found",
            )),
        }
    }
}

/// Index of the first entry of `entries` whose `type` is `kind`
fn entry_index(entries: &[Value], kind: &str) -> Option<usize> {
    entries
        .iter()
        .position(|e| e.get("type").and_then(Value::as_str) == Some(kind))
}

fn locate(document: &Value, section: Section) -> Option<&Value> {
    let value = document.get(section.key())?;
    match section.entry_type() {
        None => Some(value),
        Some(kind) => {
            let entries = value.as_array()?;
            entries.get(entry_index(entries, kind)?)
        }
    }
}

fn locate_mut(document: &mut Value, section: Section) -> Option<&mut Value> {
    let value = document.get_mut(section.key())?;
    match section.entry_type() {
        None => Some(value),
        Some(kind) => {
            let entries = value.as_array_mut()?;
            let index = entry_index(entries, kind)?;
            entries.get_mut(index)
        }
    }
}

/// Decode the addressed section, `None` when the document does not contain it.
pub fn extract<T: DeserializeOwned>(document: &Value, section: Section) -> Result<Option<T>> {
    match locate(document, section) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(T::deserialize(value)?)),
    }
}

/// Replace the addressed section with `subtree`, leaving the rest of the document as is.
///
/// The `policies` list is created when missing; typed list entries must already exist.
pub fn merge<T: Serialize>(document: &mut Value, section: Section, subtree: &T) -> Result<()> {
    let encoded = serde_json::to_value(subtree)?;

    if let Some(slot) = locate_mut(document, section) {
        *slot = encoded;
        return Ok(());
    }

    if section.entry_type().is_some() {
        return Err(section.not_found());
    }

    match document {
        Value::Object(map) => {
            map.insert(section.key().to_string(), encoded);
            Ok(())
        }
        _ => Err(BinderError::DocumentError(serde_json::Error::custom(
            "configuration document is not an object",
        ))),
    }
}

/// Build the JSON merge patch writing `sections` of `document` back to the Vault resource.
///
/// Only the top-level keys owning the sections are included. When a resource version is
/// given it is sent along, turning the patch into a conditional write that the API server
/// rejects with a conflict if the resource changed since it was read.
pub fn write_patch(resource_version: Option<&str>, document: &Value, sections: &[Section]) -> Value {
    let mut external_config = Map::new();
    for section in sections {
        let key = section.key();
        if let Some(value) = document.get(key) {
            external_config.insert(key.to_string(), value.clone());
        }
    }

    let mut patch = json!({ "spec": { "externalConfig": external_config } });
    if let Some(version) = resource_version {
        patch["metadata"] = json!({ "resourceVersion": version });
    }
    patch
}
