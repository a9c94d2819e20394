// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation of service accounts against the Vault configuration document.

pub mod engine;
pub mod indexer;

pub use engine::{Outcome, Synthesizer};
pub use indexer::{collect_targets, FanOutIndexer, TriggerReceiver};
