// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Latency log.
//
// Input events and server messages carry log ids; recording when each id is
// seen at every stage lets an offline tool reconstruct input-to-frame
// latency.  Timestamps are relative to the log's creation.
//
// The log holds at most `capacity` entries and drops the oldest beyond that.
// A disabled log records nothing but still hands out ids, since callbacks
// carry them either way.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use photon_core::LogId;
use tracing::trace;

/// Entries kept by a log created with `PerfLog::new`.
pub const DEFAULT_PERF_CAPACITY: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerfEvent {
    GetMouseWheel { log_id: LogId },
    SendMouseWheel { log_id: LogId },
    GetServerMessage { log_ids: Vec<LogId> },
    SendTransaction { log_ids: Vec<LogId> },
    FrameReady { log_ids: Vec<LogId> },
}

#[derive(Debug)]
pub struct PerfLog {
    start: Instant,
    capacity: usize,
    entries: Mutex<VecDeque<(Duration, PerfEvent)>>,
    next_id: AtomicU64,
}

impl Default for PerfLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PERF_CAPACITY)
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            start: Instant::now(),
            capacity,
            entries: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn record(&self, event: PerfEvent) {
        if !self.is_enabled() {
            return;
        }
        trace!(?event, "perf");
        let elapsed = self.start.elapsed();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back((elapsed, event));
    }

    /// Allocate a fresh log id.  Ids start at 1 and never repeat.
    pub fn next_log_id(&self) -> LogId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocate an id for an incoming wheel event and record its arrival.
    pub fn on_get_mouse_wheel(&self) -> LogId {
        let log_id = self.next_log_id();
        self.record(PerfEvent::GetMouseWheel { log_id });
        log_id
    }

    pub fn on_send_mouse_wheel(&self, log_id: LogId) {
        self.record(PerfEvent::SendMouseWheel { log_id });
    }

    pub fn on_server_message(&self, log_ids: &[LogId]) {
        self.record(PerfEvent::GetServerMessage {
            log_ids: log_ids.to_vec(),
        });
    }

    pub fn on_send_transaction(&self, log_ids: &[LogId]) {
        self.record(PerfEvent::SendTransaction {
            log_ids: log_ids.to_vec(),
        });
    }

    pub fn on_frame_ready(&self, log_ids: &[LogId]) {
        self.record(PerfEvent::FrameReady {
            log_ids: log_ids.to_vec(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every recorded entry, oldest first.
    pub fn drain(&self) -> Vec<(Duration, PerfEvent)> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).drain(..).collect()
    }
}
