// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Callback registrations and the events sent back to the UI server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use photon_core::error::{PhotonError, Result};
use photon_core::{LogId, NodeId};

/// Attribute value registering a synchronous server handler.
pub const HANDLER_SYNC: &str = "noria-handler-sync";
/// Attribute value registering an asynchronous server handler.
pub const HANDLER_ASYNC: &str = "noria-handler-async";
/// Attribute value clearing a handler.
pub const HANDLER_NONE: &str = "-noria-handler";

/// Whether a node wants events of some kind, and how the server handles them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Callback {
    Sync,
    Async,
    #[default]
    None,
}

impl Callback {
    /// Parse a handler attribute value.
    pub fn parse(value: &Value) -> Result<Self> {
        match value.as_str() {
            Some(HANDLER_SYNC) => Ok(Callback::Sync),
            Some(HANDLER_ASYNC) => Ok(Callback::Async),
            Some(HANDLER_NONE) => Ok(Callback::None),
            _ => Err(PhotonError::Protocol(format!("unknown handler value {value}"))),
        }
    }

    pub fn is_some(&self) -> bool {
        !matches!(self, Callback::None)
    }
}

/// Event kinds reported to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKey {
    Click,
    Wheel,
}

impl CallbackKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackKey::Click => "on-click",
            CallbackKey::Wheel => "on-wheel",
        }
    }
}

/// One event delivered to a node's server-side handler.
///
/// Written to the socket as a bare JSON object with no length prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackMessage {
    pub log_id: LogId,
    /// Wall-clock milliseconds since the Unix epoch.
    pub ts: u64,
    pub node: NodeId,
    pub key: String,
    pub arguments: Vec<f32>,
}

impl CallbackMessage {
    /// Build a message stamped with the current time.
    pub fn new(log_id: LogId, node: NodeId, key: CallbackKey, arguments: [f32; 2]) -> Self {
        Self {
            log_id,
            ts: chrono::Utc::now().timestamp_millis().max(0) as u64,
            node,
            key: key.as_str().to_owned(),
            arguments: arguments.to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
