// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Waiting for the CRDs the operator depends on

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS, VAULT_GROUP};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// A served API resource, identified by group, version and kind
#[derive(Debug, Clone, Copy)]
pub struct ApiResourceId {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
}

pub const VAULT_CRD: ApiResourceId = ApiResourceId {
    group: VAULT_GROUP,
    version: "v1alpha1",
    kind: "Vault",
};

impl std::fmt::Display for ApiResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{})", self.kind, self.group, self.version)
    }
}

/// Block until the bank-vaults operator has registered the Vault CRD.
pub async fn wait_for_vault_crd(client: &Client) -> Result<()> {
    wait_for_crd(client, VAULT_CRD).await
}

/// Poll discovery until `target` is served, backing off exponentially between attempts.
pub async fn wait_for_crd(client: &Client, target: ApiResourceId) -> Result<()> {
    let mut interval = Duration::from_secs(POLL_INTERVAL_SECS);

    loop {
        match is_served(client, target).await {
            Ok(true) => {
                info!("CRD {} is available", target);
                return Ok(());
            }
            Ok(false) => info!(
                "CRD {} not yet available, waiting {} seconds...",
                target,
                interval.as_secs()
            ),
            Err(e) => warn!(
                "Error checking for CRD {}: {}, retrying in {} seconds...",
                target,
                e,
                interval.as_secs()
            ),
        }

        sleep(interval).await;
        interval = next_interval(interval);
    }
}

fn next_interval(interval: Duration) -> Duration {
    (interval * 2).min(Duration::from_secs(POLL_MAX_INTERVAL_SECS))
}

async fn is_served(client: &Client, target: ApiResourceId) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[target.group])
        .run()
        .await?;

    let served = discovery
        .groups()
        .filter(|group| group.name() == target.group)
        .flat_map(|group| group.recommended_resources())
        .any(|(ar, _)| ar.kind == target.kind && ar.version == target.version);
    Ok(served)
}
