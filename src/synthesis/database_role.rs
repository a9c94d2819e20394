// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::Identity;
use crate::error::{BinderError, Result};
use crate::types::{DbRole, SecretsEngine, StringList, StringSet};
use serde_json::Map;
use tracing::{debug, info};

/// Parameters of a dynamic credentials role, resolved from the defaults
#[derive(Debug, Clone, Copy)]
pub struct DbRoleRequest<'a> {
    pub db_name: &'a str,
    pub creation_statement: &'a str,
    pub default_ttl: &'a str,
    pub max_ttl: &'a str,
}

/// Create the identity's database role if it does not exist yet.
///
/// An existing role is never touched, even when it points to another database than
/// `request.db_name`. Returns whether a role was created.
pub fn upsert_database_role(
    engine: &mut SecretsEngine,
    identity: &Identity,
    request: &DbRoleRequest<'_>,
) -> Result<bool> {
    if engine.connection(request.db_name).is_none() {
        return Err(BinderError::DbConnectionNotFound(request.db_name.to_string()));
    }

    if let Some(existing) = engine.role(&identity.name) {
        if existing.db_name != request.db_name {
            debug!(
                "Database role {} already bound to {}, not moving it to {}",
                identity.name, existing.db_name, request.db_name
            );
        }
        return Ok(false);
    }

    info!(
        "Configuring dynamic database credentials for {}/{} on {}",
        identity.namespace, identity.name, request.db_name
    );

    let connection = engine
        .connection_mut(request.db_name)
        .ok_or_else(|| BinderError::DbConnectionNotFound(request.db_name.to_string()))?;
    connection
        .allowed_roles
        .get_or_insert_with(StringSet::default)
        .normalize()
        .insert(identity.name.clone());

    engine.configuration.roles.push(DbRole {
        name: identity.name.clone(),
        db_name: request.db_name.to_string(),
        creation_statements: Some(StringList::of(request.creation_statement)),
        default_ttl: Some(request.default_ttl.to_string()),
        max_ttl: Some(request.max_ttl.to_string()),
        extra: Map::new(),
    });
    Ok(true)
}
