// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod defaults;
pub mod identity;
pub mod vault;

pub use defaults::DefaultsReconciler;
pub use identity::IdentityReconciler;
pub use vault::VaultReconciler;
