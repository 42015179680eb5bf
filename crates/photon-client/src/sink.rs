// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame sinks: where presented frames go.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

use tracing::{debug, error, info};

use photon_core::PhotonConfig;
use photon_core::error::{PhotonError, Result};
use photon_render::{rasterize, save_png};

use crate::engine::Frame;

/// Receives every frame the session produces, in epoch order.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

/// Logs frame statistics and draws nothing.
#[derive(Debug, Default)]
pub struct LogSink {
    presented: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FrameSink for LogSink {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.presented += 1;
        info!(
            epoch = frame.epoch,
            items = frame.display_list.items.len(),
            spaces = frame.display_list.spaces.len(),
            scroll_frames = frame.display_list.scroll_frames().count(),
            log_ids = ?frame.log_ids,
            "frame presented"
        );
        Ok(())
    }
}

/// Rasterises each frame to `<dir>/frame-<epoch>.png`.
///
/// Painting and encoding happen on a dedicated writer thread so `present`
/// never blocks the session loop.  Dropping the sink waits for queued frames
/// to be written.
#[derive(Debug)]
pub struct SnapshotSink {
    dir: PathBuf,
    jobs: Option<mpsc::Sender<Frame>>,
    writer: Option<JoinHandle<()>>,
}

impl SnapshotSink {
    /// Create the sink, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let (jobs, queue) = mpsc::channel::<Frame>();
        let writer_dir = dir.clone();
        let writer = std::thread::Builder::new()
            .name("photon-snapshots".into())
            .spawn(move || {
                while let Ok(frame) = queue.recv() {
                    if let Err(e) = write_snapshot(&writer_dir, &frame) {
                        error!(epoch = frame.epoch, error = %e, "snapshot failed");
                    }
                }
            })?;

        Ok(Self {
            dir,
            jobs: Some(jobs),
            writer: Some(writer),
        })
    }

    pub fn path_for(&self, epoch: u64) -> PathBuf {
        snapshot_path(&self.dir, epoch)
    }
}

fn snapshot_path(dir: &Path, epoch: u64) -> PathBuf {
    dir.join(format!("frame-{epoch}.png"))
}

fn write_snapshot(dir: &Path, frame: &Frame) -> Result<()> {
    let image = rasterize(&frame.display_list, &frame.scroll);
    let path = snapshot_path(dir, frame.epoch);
    save_png(&image, &path)?;
    debug!(epoch = frame.epoch, path = %path.display(), "snapshot written");
    Ok(())
}

impl FrameSink for SnapshotSink {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| PhotonError::Render("snapshot sink is closed".into()))?;
        jobs.send(frame.clone())
            .map_err(|_| PhotonError::Render("snapshot writer stopped".into()))
    }
}

impl Drop for SnapshotSink {
    fn drop(&mut self) {
        // Closing the queue ends the writer once it has drained.
        self.jobs.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                error!(dir = %self.dir.display(), "snapshot writer panicked");
            }
        }
    }
}

/// A snapshot sink when a snapshot directory is configured, else a log sink.
pub fn sink_from_config(config: &PhotonConfig) -> Result<Box<dyn FrameSink>> {
    Ok(match &config.snapshot_dir {
        Some(dir) => Box::new(SnapshotSink::new(dir)?),
        None => Box::new(LogSink::new()),
    })
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        (**self).present(frame)
    }
}
