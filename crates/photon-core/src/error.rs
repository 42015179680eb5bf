// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Photon.

use thiserror::Error;

use crate::NodeId;

/// Top-level error type for all Photon operations.
#[derive(Debug, Error)]
pub enum PhotonError {
    // -- Protocol errors --
    #[error("malformed update: {0}")]
    Protocol(String),

    #[error("no node with id {0}")]
    UnknownNode(NodeId),

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("framing error: {0}")]
    Framing(String),

    // -- Transport --
    #[error("connection failed: {0}")]
    Connection(String),

    // -- Text and rendering --
    #[error("font error: {0}")]
    Font(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("image encoding failed: {0}")]
    Image(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Local input --
    #[error("bad input command: {0}")]
    Input(String),

    // -- Host bridge --
    #[error("host bridge error: {0}")]
    Bridge(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PhotonError>;
