// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Turns local input into callback messages for the UI server.
//
// The scene is hit-tested under the engine lock; the resulting messages are
// written after the lock is released.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use photon_core::error::Result;
use photon_core::{LogId, Point, Vector};
use photon_protocol::{CallbackKey, CallbackMessage};

use crate::engine::{SharedEngine, lock_engine};
use crate::input::{InputEvent, WheelDelta};

/// Tracks the cursor and dispatches input events.
pub struct Controller {
    engine: SharedEngine,
    cursor: Point,
}

impl Controller {
    pub fn new(engine: SharedEngine) -> Self {
        Self {
            engine,
            cursor: Point::zero(),
        }
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// Handle one event.  Returns `false` once the session should end.
    pub async fn handle<W>(&mut self, event: InputEvent, writer: &mut W) -> Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        match event {
            InputEvent::CursorMoved(point) => {
                trace!(x = point.x, y = point.y, "cursor moved");
                self.cursor = point;
            }
            InputEvent::Click => {
                self.mouse_click(self.cursor, writer).await?;
            }
            InputEvent::Wheel(delta) => {
                self.mouse_wheel(self.cursor, delta, writer).await?;
            }
            InputEvent::Close => return Ok(false),
        }
        Ok(true)
    }

    /// Send `on-click` to every hit node with a click handler.
    ///
    /// The arguments are the click point relative to each node's rect.  All
    /// callbacks for one click share a log id.  Returns the number sent.
    pub async fn mouse_click<W>(&self, point: Point, writer: &mut W) -> Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let messages: Vec<CallbackMessage> = {
            let engine = lock_engine(&self.engine);
            let log_id = engine.perf().next_log_id();
            engine
                .hit_test(point)
                .into_iter()
                .filter(|hit| {
                    engine
                        .dom()
                        .get(hit.tag.0)
                        .is_some_and(|node| node.kind.on_click().is_some())
                })
                .map(|hit| {
                    let rel = hit.point_relative_to_item;
                    CallbackMessage::new(log_id, hit.tag.0, CallbackKey::Click, [rel.x, rel.y])
                })
                .collect()
        };

        for message in &messages {
            writer.write_all(&message.to_bytes()?).await?;
        }
        writer.flush().await?;
        debug!(x = point.x, y = point.y, sent = messages.len(), "click dispatched");
        Ok(messages.len())
    }

    /// Send `on-wheel` with the scroll delta to every hit node with a wheel
    /// handler.  All callbacks for one wheel event share a log id.
    pub async fn mouse_wheel<W>(&self, point: Point, delta: WheelDelta, writer: &mut W) -> Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let (log_id, messages): (LogId, Vec<CallbackMessage>) = {
            let engine = lock_engine(&self.engine);
            let log_id = engine.perf().on_get_mouse_wheel();
            let scroll = scroll_delta(delta, engine.config().line_scroll_step);
            let messages = engine
                .hit_test(point)
                .into_iter()
                .filter(|hit| {
                    engine
                        .dom()
                        .get(hit.tag.0)
                        .is_some_and(|node| node.kind.on_wheel().is_some())
                })
                .map(|hit| CallbackMessage::new(log_id, hit.tag.0, CallbackKey::Wheel, [scroll.x, scroll.y]))
                .collect();
            (log_id, messages)
        };

        for message in &messages {
            writer.write_all(&message.to_bytes()?).await?;
            lock_engine(&self.engine).perf().on_send_mouse_wheel(log_id);
        }
        writer.flush().await?;
        debug!(log_id, sent = messages.len(), "wheel dispatched");
        Ok(messages.len())
    }
}

/// Wheel delta as the scroll offset change the server expects.
fn scroll_delta(delta: WheelDelta, line_scroll_step: f32) -> Vector {
    match delta {
        WheelDelta::Line(dx, dy) => Vector::new(-dx, -dy * line_scroll_step),
        WheelDelta::Pixel(x, y) => Vector::new(-x, -y),
    }
}
