// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identity reconciler - watches ServiceAccounts and synthesizes their Vault configuration.

use crate::constants::requeue;
use crate::error::{BinderError, Result};
use crate::synthesis::passes_gate;
use crate::sync::{Outcome, Synthesizer, TriggerReceiver};
use futures::{stream, StreamExt};
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::{
    runtime::{controller, controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub struct IdentityReconciler {
    client: Client,
    synthesizer: Synthesizer,
}

impl IdentityReconciler {
    pub fn new(client: Client, synthesizer: Synthesizer) -> Self {
        Self {
            client,
            synthesizer,
        }
    }

    /// Run the controller. Besides watch events, every reference received on `triggers`
    /// is scheduled for reconciliation; pending requests for the same key collapse.
    pub async fn run(self, mut triggers: TriggerReceiver) -> anyhow::Result<()> {
        let service_accounts: Api<ServiceAccount> = Api::all(self.client.clone());
        let concurrency = self.synthesizer.config().concurrency;
        let context = Arc::new(self);

        Controller::new(service_accounts, watcher::Config::default())
            .with_config(controller::Config::default().concurrency(concurrency))
            .reconcile_on(stream::poll_fn(move |cx| triggers.poll_recv(cx)))
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled service account: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(sa: Arc<ServiceAccount>, ctx: Arc<IdentityReconciler>) -> Result<Action> {
    // Most service accounts are never annotated; skip them without an API round trip
    if !passes_gate(&sa, ctx.synthesizer.config()) {
        return Ok(Action::await_change());
    }

    let name = sa.name_any();
    let namespace = sa.namespace().unwrap_or_default();

    match ctx.synthesizer.reconcile(&namespace, &name).await? {
        Outcome::Synthesized { writes } => {
            debug!(
                "Service account {}/{} converged with {} writes",
                namespace, name, writes
            );
        }
        outcome => debug!("Service account {}/{}: {:?}", namespace, name, outcome),
    }

    Ok(Action::await_change())
}

fn error_policy(
    sa: Arc<ServiceAccount>,
    error: &BinderError,
    _ctx: Arc<IdentityReconciler>,
) -> Action {
    let key = format!("{}/{}", sa.namespace().unwrap_or_default(), sa.name_any());

    if error.is_configuration_error() {
        error!(
            "Configuration error for {}: {}, waiting for the configuration to change",
            key, error
        );
        return Action::await_change();
    }

    if error.is_conflict() {
        warn!("Vault was modified concurrently while reconciling {}, retrying", key);
        return Action::requeue(Duration::from_secs(requeue::CONFLICT_SECS));
    }

    error!("Reconciliation error for {}: {}", key, error);
    Action::requeue(Duration::from_secs(requeue::ERROR_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use kube::api::ObjectMeta;

    fn context(mock: &MockService) -> Arc<IdentityReconciler> {
        let client = mock.clone().into_client();
        Arc::new(IdentityReconciler::new(
            client.clone(),
            Synthesizer::new(client, test_config()),
        ))
    }

    fn service_account(name: &str, enabled: bool) -> Arc<ServiceAccount> {
        let annotations = enabled.then(|| {
            [(
                "vault.binder.io/auto-configure".to_string(),
                "true".to_string(),
            )]
            .into()
        });
        Arc::new(ServiceAccount {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("apps".to_string()),
                annotations,
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_unannotated_service_account_makes_no_calls() {
        let mock = MockService::new();

        let action = reconcile(service_account("svc", false), context(&mock))
            .await
            .unwrap();

        assert_eq!(action, Action::await_change());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_service_account_is_success() {
        let mock = MockService::new();

        let action = reconcile(service_account("svc", true), context(&mock))
            .await
            .unwrap();

        assert_eq!(action, Action::await_change());
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_error_policy_conflict_requeues_quickly() {
        let mock = MockService::new()
            .on_get(
                &service_account_path("apps", "svc"),
                200,
                &service_account_json("apps", "svc", &[("vault.binder.io/auto-configure", "true")]),
            )
            .on_get(
                VAULT_PATH,
                200,
                &vault_json("1", serde_json::json!({"auth": [{"type": "kubernetes"}]})),
            )
            .on_patch(VAULT_PATH, 409, &conflict_json("vaults.vault.banzaicloud.com", "vault"));
        let ctx = context(&mock);
        let sa = service_account("svc", true);

        let err = reconcile(sa.clone(), ctx.clone()).await.unwrap_err();

        assert_eq!(
            error_policy(sa, &err, ctx),
            Action::requeue(Duration::from_secs(requeue::CONFLICT_SECS))
        );
    }

    #[tokio::test]
    async fn test_error_policy_missing_prerequisite_requeues() {
        let mock = MockService::new();
        let err = BinderError::AuthMethodNotFound;

        assert_eq!(
            error_policy(service_account("svc", true), &err, context(&mock)),
            Action::requeue(Duration::from_secs(requeue::ERROR_SECS))
        );
    }

    #[tokio::test]
    async fn test_error_policy_configuration_error_waits() {
        let mock = MockService::new();
        let err = crate::synthesis::PolicyTemplate::parse("{{ .Name ").unwrap_err();

        assert_eq!(
            error_policy(service_account("svc", true), &err, context(&mock)),
            Action::await_change()
        );
    }
}
