// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Path-scoped access to the Vault configuration document.

pub mod codec;

pub use codec::{extract, merge, write_patch, Section};
