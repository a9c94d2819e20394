// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fan-out re-indexing after a change to a resource shared by every service account.
//!
//! A change to the defaults ConfigMap or to the Vault resource may affect the output for
//! every enabled service account, so all of them are rescanned and handed to the identity
//! controller. There is no secondary index; the cost is one list per namespace.

use crate::config::Config;
use crate::constants::requeue;
use crate::error::Result;
use crate::kubernetes::list_namespaces;
use crate::synthesis::is_auto_configured;
use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::{
    api::ListParams,
    runtime::{reflector::ObjectRef, watcher},
    Api, Client, Resource, ResourceExt,
};
use std::pin::pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Receiving end of the reconciliation requests produced by the indexer
pub type TriggerReceiver = mpsc::Receiver<ObjectRef<ServiceAccount>>;

#[derive(Clone)]
pub struct FanOutIndexer {
    client: Client,
    config: Config,
    trigger_tx: mpsc::Sender<ObjectRef<ServiceAccount>>,
}

impl FanOutIndexer {
    pub fn new(client: Client, config: Config) -> (Self, TriggerReceiver) {
        let (trigger_tx, trigger_rx) = mpsc::channel(256);
        let indexer = Self {
            client,
            config,
            trigger_tx,
        };
        (indexer, trigger_rx)
    }

    /// Request reconciliation of every enabled service account. Returns how many were requested.
    #[instrument(skip(self))]
    pub async fn reindex(&self, reason: &str) -> Result<usize> {
        let targets = collect_targets(&self.client, &self.config).await?;
        info!(
            "Re-indexing {} enabled service accounts after {}",
            targets.len(),
            reason
        );

        let count = targets.len();
        for target in targets {
            if self.trigger_tx.send(target).await.is_err() {
                warn!("Identity controller is no longer receiving reconciliation requests");
                break;
            }
        }
        Ok(count)
    }

    /// Re-index once for every object `changes` yields, including deleted ones. A failed
    /// rescan is retried until it succeeds before the next change is taken.
    pub async fn reindex_on<K, S>(&self, kind: &str, changes: S)
    where
        K: Resource,
        S: Stream<Item = std::result::Result<K, watcher::Error>>,
    {
        let mut changes = pin!(changes);
        while let Some(change) = changes.next().await {
            let object = match change {
                Ok(object) => object,
                Err(e) => {
                    warn!("Error watching {}: {}", kind, e);
                    continue;
                }
            };

            let reason = format!(
                "change to {} {}/{}",
                kind,
                object.namespace().unwrap_or_default(),
                object.name_any()
            );
            while let Err(e) = self.reindex(&reason).await {
                error!(
                    "Re-indexing after {} failed: {}, retrying in {} seconds",
                    reason,
                    e,
                    requeue::ERROR_SECS
                );
                sleep(Duration::from_secs(requeue::ERROR_SECS)).await;
            }
        }
        warn!("Watch on {} ended", kind);
    }
}

/// All service accounts, across all namespaces, carrying the auto-configure annotation
pub async fn collect_targets(client: &Client, config: &Config) -> Result<Vec<ObjectRef<ServiceAccount>>> {
    let mut targets = Vec::new();

    for namespace in list_namespaces(client).await? {
        let service_accounts: Api<ServiceAccount> = Api::namespaced(client.clone(), &namespace);
        let list = service_accounts.list(&ListParams::default()).await?;
        let enabled: Vec<_> = list
            .items
            .iter()
            .filter(|sa| is_auto_configured(sa, config))
            .map(ObjectRef::from_obj)
            .collect();
        debug!(
            "Namespace {} has {} enabled service accounts",
            namespace,
            enabled.len()
        );
        targets.extend(enabled);
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    const ENABLED: (&str, &str) = ("vault.binder.io/auto-configure", "true");
    const DISABLED: (&str, &str) = ("vault.binder.io/auto-configure", "false");

    fn mock() -> MockService {
        MockService::new()
            .on_get("/api/v1/namespaces", 200, &namespace_list_json(&["a", "b", "empty"]))
            .on_get(
                "/api/v1/namespaces/a/serviceaccounts",
                200,
                &service_account_list_json(&[
                    ("a", "svc", &[ENABLED]),
                    ("a", "default", &[]),
                    ("a", "off", &[DISABLED]),
                ]),
            )
            .on_get(
                "/api/v1/namespaces/b/serviceaccounts",
                200,
                &service_account_list_json(&[("b", "svc", &[ENABLED]), ("b", "worker", &[ENABLED])]),
            )
            .on_get(
                "/api/v1/namespaces/empty/serviceaccounts",
                200,
                &service_account_list_json(&[]),
            )
    }

    #[tokio::test]
    async fn test_collect_targets_filters_on_annotation() {
        let client = mock().into_client();

        let targets = collect_targets(&client, &test_config()).await.unwrap();

        let keys: Vec<(String, String)> = targets
            .iter()
            .map(|t| (t.namespace.clone().unwrap_or_default(), t.name.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a".to_string(), "svc".to_string()),
                ("b".to_string(), "svc".to_string()),
                ("b".to_string(), "worker".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_reindex_sends_triggers() {
        let (indexer, mut triggers) = FanOutIndexer::new(mock().into_client(), test_config());

        let count = indexer.reindex("test").await.unwrap();

        assert_eq!(count, 3);
        let mut received = Vec::new();
        while let Ok(target) = triggers.try_recv() {
            received.push(target.name);
        }
        assert_eq!(received, vec!["svc", "svc", "worker"]);
    }

    #[tokio::test]
    async fn test_reindex_fails_when_listing_fails() {
        let (indexer, _triggers) = FanOutIndexer::new(MockService::new().into_client(), test_config());

        assert!(indexer.reindex("test").await.is_err());
    }
}
