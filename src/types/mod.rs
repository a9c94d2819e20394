// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes resources and Vault configuration document types.

pub mod document;
pub mod vault;

pub use document::{AuthMethod, DbConnection, DbRole, Policy, Role, SecretsEngine, StringList, StringSet};
pub use vault::{Vault, VaultSpec};
