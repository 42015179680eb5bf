// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photon — Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod geometry;

pub use config::PhotonConfig;
pub use error::{PhotonError, Result};
pub use geometry::*;

/// Identifier the UI server assigns to every DOM node.
pub type NodeId = u64;

/// Correlation id carried through the perf log and callback messages.
pub type LogId = u64;
