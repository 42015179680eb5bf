// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry engine with exponential backoff + jitter for connecting to the UI
// server.
//
// Errors are classified as Transient (server not up yet, network blip) or
// Permanent (bad address, protocol violation).  Only transient errors are
// retried.

use std::time::Duration;

use photon_core::PhotonConfig;
use photon_core::error::PhotonError;
use tracing::{debug, info, warn};

/// How an error should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Refused, reset, timed out: safe to retry automatically.
    Transient,
    /// Retrying cannot help.
    Permanent,
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn from_config(config: &PhotonConfig) -> Self {
        Self {
            max_retries: config.connect_max_retries,
            base_delay: config.connect_base_delay(),
            max_delay: config.connect_max_delay(),
        }
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Do not retry.
    GiveUp,
    /// Maximum retries exhausted.
    Exhausted,
}

/// Classify a `PhotonError` for retry decisions.
pub fn classify_error(err: &PhotonError) -> ErrorClass {
    match err {
        PhotonError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::AddrNotAvailable
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock => ErrorClass::Transient,
            std::io::ErrorKind::InvalidInput
            | std::io::ErrorKind::PermissionDenied
            | std::io::ErrorKind::Unsupported => ErrorClass::Permanent,
            _ => ErrorClass::Transient,
        },

        // Only raised once connecting has already given up.
        PhotonError::Connection(_)
        | PhotonError::Protocol(_)
        | PhotonError::UnknownNode(_)
        | PhotonError::UnknownNodeType(_)
        | PhotonError::Framing(_)
        | PhotonError::Font(_)
        | PhotonError::Render(_)
        | PhotonError::Image(_)
        | PhotonError::Config(_)
        | PhotonError::Input(_)
        | PhotonError::Bridge(_)
        | PhotonError::Serialization(_) => ErrorClass::Permanent,
    }
}

/// Decide whether to retry based on the error class and attempt count.
pub fn should_retry(err: &PhotonError, attempt: u32, config: &RetryConfig) -> RetryDecision {
    match classify_error(err) {
        ErrorClass::Permanent => {
            info!(error = %err, "permanent error, not retrying");
            RetryDecision::GiveUp
        }
        ErrorClass::Transient => {
            if attempt >= config.max_retries {
                warn!(attempt, max = config.max_retries, "retry limit exhausted");
                RetryDecision::Exhausted
            } else {
                let delay = compute_delay(attempt, config);
                debug!(attempt, delay_ms = delay.as_millis(), "scheduling retry");
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

/// Exponential backoff with jitter.
///
/// delay = min(base * 2^attempt + jitter, max_delay), jitter in [0, base).
fn compute_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_ms = config.base_delay.as_millis() as u64;
    let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(10));
    let total_ms = exp_ms.saturating_add(jitter(base_ms, attempt));
    let capped_ms = total_ms.min(config.max_delay.as_millis() as u64);

    Duration::from_millis(capped_ms)
}

/// Deterministic spread over [0, base) from the attempt number.
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let hash = (attempt as u64).wrapping_mul(6364136223846793005);
    hash % base_ms.max(1)
}
