// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photon Bridge — the native side of `photon.PhotonApi`.
//
// The JVM class declares three instance methods and loads this library as
// `photonapi`.  Every export shares one process-global engine, configured
// from `$PHOTON_CONFIG` on first use.  The plain-Rust operations live in
// `api`; `jni_exports` only converts arguments, catches panics and turns
// errors into Java exceptions.

pub mod api;
pub mod jni_exports;

pub use api::{apply_updates_json, global_engine, init_logging, measure_text, run_blocking};
