// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOM update messages.
//
// A message payload is a JSON array.  Every element is either a list of log
// ids (perf correlation for the whole message) or a single update object
// tagged by "update-type".

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use photon_core::NodeId;
use photon_core::error::{PhotonError, Result};

/// Create a node of the given type, replacing any node with the same id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MakeNode {
    #[serde(rename = "node")]
    pub node_id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
}

/// Remove a node from the DOM.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Destroy {
    #[serde(rename = "node")]
    pub node_id: NodeId,
}

/// Insert `value` into the list attribute `attribute` at `index`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Add {
    #[serde(rename = "node")]
    pub node_id: NodeId,
    #[serde(rename = "attr")]
    pub attribute: String,
    pub index: usize,
    pub value: Value,
}

/// Remove `value` from the list attribute `attribute`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Remove {
    #[serde(rename = "node")]
    pub node_id: NodeId,
    #[serde(rename = "attr")]
    pub attribute: String,
    pub value: Value,
}

/// Assign a scalar attribute.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetAttr {
    #[serde(rename = "node")]
    pub node_id: NodeId,
    #[serde(rename = "attr")]
    pub attribute: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "update-type")]
pub enum Update {
    #[serde(rename = "make-node")]
    MakeNode(MakeNode),
    #[serde(rename = "destroy")]
    Destroy(Destroy),
    #[serde(rename = "add")]
    Add(Add),
    #[serde(rename = "remove")]
    Remove(Remove),
    #[serde(rename = "set-attr")]
    SetAttr(SetAttr),
}

impl Update {
    /// The node this update targets.
    pub fn node_id(&self) -> NodeId {
        match self {
            Update::MakeNode(u) => u.node_id,
            Update::Destroy(u) => u.node_id,
            Update::Add(u) => u.node_id,
            Update::Remove(u) => u.node_id,
            Update::SetAttr(u) => u.node_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UpdateOrLogIds {
    Update(Update),
    LogIds(Vec<u64>),
}

/// Decode a message payload element by element.
///
/// The payload itself must be a JSON array; anything else fails the whole
/// message.  Elements that do not decode are reported individually so the
/// caller can skip them and keep applying the rest.
pub fn decode_message(payload: &[u8]) -> Result<Vec<Result<UpdateOrLogIds>>> {
    let elements: Vec<Value> = serde_json::from_slice(payload).map_err(|e| {
        PhotonError::Protocol(format!("update message is not a JSON array: {e}"))
    })?;

    Ok(elements
        .into_iter()
        .enumerate()
        .map(|(position, element)| {
            serde_json::from_value::<UpdateOrLogIds>(element.clone()).map_err(|e| {
                warn!(position, error = %e, "undecodable update element");
                PhotonError::Protocol(format!("element {position} ({element}): {e}"))
            })
        })
        .collect())
}
