// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and namespace listing.

pub mod crd;
pub mod namespaces;

pub use crd::wait_for_vault_crd;
pub use namespaces::list_namespaces;
