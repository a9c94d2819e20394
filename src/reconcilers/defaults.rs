// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Defaults reconciler - watches the defaults-override ConfigMap and re-indexes on change.
//!
//! Deleting the ConfigMap counts as a change: every policy falls back to the built-in
//! template, so the rescan has to run for deletions as well.

use crate::sync::FanOutIndexer;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
    runtime::{watcher, WatchStreamExt},
    Api, Client,
};
use tracing::info;

pub struct DefaultsReconciler {
    client: Client,
    indexer: FanOutIndexer,
    namespace: String,
    name: String,
}

impl DefaultsReconciler {
    pub fn new(client: Client, indexer: FanOutIndexer, namespace: &str, name: &str) -> Self {
        Self {
            client,
            indexer,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.namespace);
        let watcher_config = watcher::Config::default().fields(&format!("metadata.name={}", self.name));
        info!(
            "Watching ConfigMap {}/{} for default overrides",
            self.namespace, self.name
        );

        let changes = watcher(config_maps, watcher_config)
            .default_backoff()
            .touched_objects();
        self.indexer.reindex_on("ConfigMap", changes).await;

        Ok(())
    }
}
