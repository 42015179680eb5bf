// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line options and layered configuration.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use photon_core::PhotonConfig;
use photon_core::error::Result;
use photon_render::PerfEvent;

#[derive(Debug, Parser)]
#[command(
    name = "photon",
    version,
    about = "Headless remote-DOM renderer",
    long_about = "Connects to a UI server, renders the DOM it streams and sends input callbacks back.\n\
                  Input is read from stdin, one command per line: `move x y`, `click x y`,\n\
                  `wheel dx dy`, `wheel-px dx dy`, `quit`."
)]
pub struct Cli {
    /// UI server host
    #[arg(long)]
    pub host: Option<String>,
    /// UI server port
    #[arg(short, long)]
    pub port: Option<u16>,
    /// JSON config file (defaults to $PHOTON_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// TrueType/OpenType font for text
    #[arg(long)]
    pub font: Option<PathBuf>,
    /// Write a PNG per frame into this directory
    #[arg(long, value_name = "DIR")]
    pub snapshots: Option<PathBuf>,
    /// Print the latency log on exit
    #[arg(long)]
    pub perf: bool,
}

impl Cli {
    /// Defaults, then the config file, then command-line overrides.
    pub fn resolve_config(&self) -> Result<PhotonConfig> {
        let mut config = match &self.config {
            Some(path) => PhotonConfig::load(path)?,
            None => PhotonConfig::from_env()?,
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }
        if let Some(dir) = &self.snapshots {
            config.snapshot_dir = Some(dir.clone());
        }
        if self.perf {
            config.perf_log = true;
        }
        config.validate()?;
        Ok(config)
    }
}

/// One line per entry: milliseconds since start, then the event.
pub fn perf_report(entries: &[(Duration, PerfEvent)]) -> String {
    let mut out = String::new();
    for (elapsed, event) in entries {
        let ms = elapsed.as_secs_f64() * 1000.0;
        let _ = match event {
            PerfEvent::GetMouseWheel { log_id } => writeln!(out, "{ms:>12.3} get-mouse-wheel {log_id}"),
            PerfEvent::SendMouseWheel { log_id } => writeln!(out, "{ms:>12.3} send-mouse-wheel {log_id}"),
            PerfEvent::GetServerMessage { log_ids } => writeln!(out, "{ms:>12.3} get-server-message {log_ids:?}"),
            PerfEvent::SendTransaction { log_ids } => writeln!(out, "{ms:>12.3} send-transaction {log_ids:?}"),
            PerfEvent::FrameReady { log_ids } => writeln!(out, "{ms:>12.3} frame-ready {log_ids:?}"),
        };
    }
    out
}
