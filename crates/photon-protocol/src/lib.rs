// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photon Protocol — the conversation between the renderer and a UI server.
//
// Server -> renderer: length-prefixed frames, each a JSON array of DOM
// updates interleaved with perf log ids.
// Renderer -> server: a fixed handshake, then raw JSON callback objects.

pub mod callback;
pub mod framing;
pub mod updates;
pub mod values;

pub use callback::{Callback, CallbackKey, CallbackMessage};
pub use framing::{HANDSHAKE, encode_frame, read_frame, write_frame};
pub use updates::{Add, Destroy, MakeNode, Remove, SetAttr, Update, UpdateOrLogIds, decode_message};
