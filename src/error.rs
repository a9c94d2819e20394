// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinderError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Vault {namespace}/{name} not found")]
    VaultNotFound { namespace: String, name: String },

    #[error("Kubernetes authentication configuration not found")]
    AuthMethodNotFound,

    #[error("Database secrets configuration not found")]
    SecretsEngineNotFound,

    #[error("Database {0} configuration not found")]
    DbConnectionNotFound(String),

    #[error("Invalid policy template: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Malformed Vault configuration document: {0}")]
    DocumentError(#[from] serde_json::Error),
}

impl BinderError {
    /// Errors that only go away when an operator fixes the configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, BinderError::TemplateError(_))
    }

    /// The conditional write lost against a concurrent writer.
    pub fn is_conflict(&self) -> bool {
        matches!(self, BinderError::KubeError(kube::Error::Api(err)) if err.code == 409)
    }
}

pub type Result<T> = std::result::Result<T, BinderError>;
