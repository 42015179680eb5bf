// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The renderer's state: DOM, fonts, the presented scene and the perf log.
//
// One engine is shared between the session loop, the input controller and
// in-process callers, so it lives behind `Arc<Mutex<_>>`.  Every operation
// holds the lock briefly and never across an await.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, instrument};

use photon_core::error::Result;
use photon_core::{LogId, PhotonConfig, Point};
use photon_render::{
    ApplyContext, DisplayList, Dom, HitItem, PerfLog, Scene, ScrollState, apply_updates, build_display_list,
};
use photon_text::FontManager;

pub type SharedEngine = Arc<Mutex<Engine>>;

/// Lock the shared engine, recovering the state if a holder panicked.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, Engine> {
    engine.lock().unwrap_or_else(|e| e.into_inner())
}

/// A presentable snapshot of the scene after one update message.
#[derive(Debug, Clone)]
pub struct Frame {
    pub epoch: u64,
    pub display_list: Arc<DisplayList>,
    pub scroll: ScrollState,
    pub log_ids: Vec<LogId>,
}

pub struct Engine {
    config: PhotonConfig,
    dom: Dom,
    fonts: FontManager,
    scene: Scene,
    perf: PerfLog,
}

impl Engine {
    /// Engine with the configured font, or the fallback face.
    pub fn new(config: PhotonConfig) -> Result<Self> {
        let fonts = FontManager::from_config(&config)?;
        Ok(Self::with_fonts(config, fonts))
    }

    pub fn with_fonts(config: PhotonConfig, fonts: FontManager) -> Self {
        let dom = Dom::new();
        let empty = build_display_list(&dom, config.viewport(), fonts.handle(), config.background);
        let perf = if config.perf_log {
            PerfLog::new()
        } else {
            PerfLog::disabled()
        };
        Self {
            scene: Scene::new(empty),
            config,
            dom,
            fonts,
            perf,
        }
    }

    pub fn shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &PhotonConfig {
        &self.config
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn perf(&self) -> &PerfLog {
        &self.perf
    }

    /// Apply one server message and produce the frame to present.
    ///
    /// The display list is rebuilt only when the message changed the tree;
    /// the epoch advances either way.
    #[instrument(skip_all, fields(bytes = payload.len()))]
    pub fn apply_message(&mut self, payload: &[u8]) -> Result<Frame> {
        let mut ctx = ApplyContext {
            fonts: &mut self.fonts,
            scroll: &mut self.scene.scroll,
            perf: &self.perf,
        };
        let outcome = apply_updates(&mut self.dom, &mut ctx, payload)?;

        if outcome.rebuild {
            let list = build_display_list(
                &self.dom,
                self.config.viewport(),
                self.fonts.handle(),
                self.config.background,
            );
            self.scene.set_display_list(list);
        }
        self.scene.epoch += 1;
        self.perf.on_send_transaction(&outcome.log_ids);

        debug!(
            epoch = self.scene.epoch,
            rebuilt = outcome.rebuild,
            rejected = outcome.rejected,
            "frame ready for presentation"
        );
        Ok(Frame {
            epoch: self.scene.epoch,
            display_list: Arc::clone(&self.scene.display_list),
            scroll: self.scene.scroll.clone(),
            log_ids: outcome.log_ids,
        })
    }

    /// Record that a frame reached the screen (or its stand-in).
    pub fn frame_presented(&self, frame: &Frame) {
        self.perf.on_frame_ready(&frame.log_ids);
    }

    pub fn hit_test(&self, point: Point) -> Vec<HitItem> {
        self.scene.hit_test(point)
    }

    /// Width of `text` laid out with the engine's font.
    pub fn measure_text(&mut self, text: &str) -> f32 {
        self.fonts.measure(text)
    }

    /// Forget the DOM and scene, keeping config, fonts and perf history.
    pub fn reset(&mut self) {
        info!(nodes = self.dom.len(), "resetting engine state");
        self.dom = Dom::new();
        let empty = build_display_list(&self.dom, self.config.viewport(), self.fonts.handle(), self.config.background);
        self.scene = Scene::new(empty);
    }
}
