// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Vault reconciler - watches the target Vault resource so that edits made outside the
//! operator are converged again.

use crate::sync::FanOutIndexer;
use crate::types::Vault;
use futures::Stream;
use kube::{
    runtime::{predicates, watcher, WatchStreamExt},
    Api, Client,
};
use tracing::info;

pub struct VaultReconciler {
    client: Client,
    indexer: FanOutIndexer,
    namespace: String,
    name: String,
}

impl VaultReconciler {
    pub fn new(client: Client, indexer: FanOutIndexer, namespace: &str, name: &str) -> Self {
        Self {
            client,
            indexer,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let vaults: Api<Vault> = Api::namespaced(self.client.clone(), &self.namespace);
        let watcher_config = watcher::Config::default().fields(&format!("metadata.name={}", self.name));
        info!("Watching Vault {}/{}", self.namespace, self.name);

        let events = watcher(vaults, watcher_config).default_backoff();
        self.indexer.reindex_on("Vault", spec_changes(events)).await;

        Ok(())
    }
}

/// Keep only Vault objects whose generation moved, dropping status and metadata updates.
///
/// Our own writes land here as well; they re-index into no-op reconciliations because
/// converged documents are not written again.
fn spec_changes<S>(events: S) -> impl Stream<Item = Result<Vault, watcher::Error>>
where
    S: Stream<Item = Result<watcher::Event<Vault>, watcher::Error>>,
{
    events
        .applied_objects()
        .predicate_filter(predicates::generation)
}
