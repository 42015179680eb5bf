// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photon Client — connects to a UI server, applies the update stream to the
// shared engine, presents frames and turns local input into callbacks.

pub mod client;
pub mod controller;
pub mod engine;
pub mod input;
pub mod retry;
pub mod sink;

pub use client::{SessionEnd, connect_with_retry, handshake, run_session};
pub use controller::Controller;
pub use engine::{Engine, Frame, SharedEngine, lock_engine};
pub use input::{InputEvent, WheelDelta, forward_commands, parse_command};
pub use sink::{FrameSink, LogSink, SnapshotSink, sink_from_config};
