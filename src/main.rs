// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vault_binder::config::Config;
use vault_binder::kubernetes::wait_for_vault_crd;
use vault_binder::reconcilers::{DefaultsReconciler, IdentityReconciler, VaultReconciler};
use vault_binder::sync::{FanOutIndexer, Synthesizer};
use vault_binder::synthesis::Defaults;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting vault-binder operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: vault={}/{}, annotation={}, bind_all_namespaces={}",
        config.vault_namespace,
        config.target_vault_name,
        config.auto_configure_key(),
        config.bind_all_namespaces
    );

    // The built-in templates are constants; a broken one must stop the operator here
    Defaults::builtin()?;

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for Vault CRD to become available...");
    wait_for_vault_crd(&client).await?;

    let (indexer, triggers) = FanOutIndexer::new(client.clone(), config.clone());

    let identity_reconciler = IdentityReconciler::new(
        client.clone(),
        Synthesizer::new(client.clone(), config.clone()),
    );
    let defaults_reconciler = DefaultsReconciler::new(
        client.clone(),
        indexer.clone(),
        &config.defaults_configmap_namespace,
        &config.defaults_configmap_name,
    );
    let vault_reconciler = VaultReconciler::new(
        client,
        indexer,
        &config.vault_namespace,
        &config.target_vault_name,
    );

    info!("Starting reconcilers...");

    tokio::try_join!(
        identity_reconciler.run(triggers),
        defaults_reconciler.run(),
        vault_reconciler.run()
    )?;

    // This should never be reached as reconcilers run forever
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
