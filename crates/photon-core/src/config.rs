// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Renderer configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PhotonError, Result};
use crate::geometry::{Color, Size};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "PHOTON_CONFIG";

/// Persistent renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotonConfig {
    /// Host the UI server listens on.
    pub host: String,
    /// Port the UI server listens on.
    pub port: u16,
    /// Logical viewport width in pixels.
    pub viewport_width: f32,
    /// Logical viewport height in pixels.
    pub viewport_height: f32,
    /// TrueType/OpenType font used for all text. The built-in metric-only
    /// face is used when unset.
    pub font_path: Option<PathBuf>,
    /// Font size in pixels.
    pub font_size: f32,
    /// Colour the frame is cleared to before painting.
    pub background: Color,
    /// Pixels scrolled per wheel "line".
    pub line_scroll_step: f32,
    /// Connection attempts after the first one fails.
    pub connect_max_retries: u32,
    /// Base delay for exponential connection backoff.
    pub connect_base_delay_ms: u64,
    /// Upper bound on a single backoff delay.
    pub connect_max_delay_ms: u64,
    /// When set, every presented frame is rasterised to a PNG in this directory.
    pub snapshot_dir: Option<PathBuf>,
    /// Largest accepted update frame.
    pub max_frame_bytes: usize,
    /// Keep a latency log of input, messages and frames.
    pub perf_log: bool,
}

impl Default for PhotonConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 9999,
            viewport_width: 800.0,
            viewport_height: 600.0,
            font_path: None,
            font_size: 14.0,
            background: Color::BLACK,
            line_scroll_step: 38.0,
            connect_max_retries: 5,
            connect_base_delay_ms: 200,
            connect_max_delay_ms: 5_000,
            snapshot_dir: None,
            max_frame_bytes: 64 * 1024 * 1024,
            perf_log: false,
        }
    }
}

impl PhotonConfig {
    /// Read a config file. Missing keys fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config: PhotonConfig = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load from `$PHOTON_CONFIG` when set, defaults otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err(PhotonError::Config(format!(
                "viewport must be positive, got {}x{}",
                self.viewport_width, self.viewport_height
            )));
        }
        if !(self.font_size > 0.0) {
            return Err(PhotonError::Config(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        if self.max_frame_bytes == 0 {
            return Err(PhotonError::Config("max_frame_bytes must be non-zero".into()));
        }
        Ok(())
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_base_delay(&self) -> Duration {
        Duration::from_millis(self.connect_base_delay_ms)
    }

    pub fn connect_max_delay(&self) -> Duration {
        Duration::from_millis(self.connect_max_delay_ms)
    }
}
