// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::template::PolicyTemplate;
use super::Identity;
use crate::error::Result;
use crate::types::Policy;
use serde_json::Map;
use tracing::debug;

/// Create the identity's policy, or re-render the rules of the existing one so template
/// changes reach policies created earlier.
pub fn upsert_policy(
    policies: &mut Vec<Policy>,
    identity: &Identity,
    template: &PolicyTemplate,
) -> Result<()> {
    let rules = template.render(identity)?;

    if let Some(policy) = policies.iter_mut().find(|p| p.name == identity.name) {
        policy.rules = Some(rules);
        return Ok(());
    }

    debug!("Adding policy {}", identity.name);
    policies.push(Policy {
        name: identity.name.clone(),
        rules: Some(rules),
        extra: Map::new(),
    });
    Ok(())
}
