// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scroll state and hit testing.
//
// Scroll offsets are keyed by the scroll node's id so they survive display
// list rebuilds.  The requested offset is stored as given and clamped to the
// frame's content bounds whenever the list is resolved, so a frame whose
// content grows later is not stuck at an old clamp.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use photon_core::{NodeId, Point, Rect, Vector};

use crate::display_list::{DisplayList, HitTag};

#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    offsets: HashMap<NodeId, Vector>,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested offset for a scroll node, zero if never scrolled.
    pub fn requested(&self, id: NodeId) -> Vector {
        self.offsets.get(&id).copied().unwrap_or_default()
    }

    pub fn set(&mut self, id: NodeId, offset: Vector) {
        self.offsets.insert(id, offset);
    }

    pub fn remove(&mut self, id: NodeId) {
        self.offsets.remove(&id);
    }

    /// Offset actually applied to a frame with the given `content` and
    /// viewport `clip`: within `0..=max(content - clip, 0)` on each axis.
    pub fn effective(&self, id: NodeId, content: &Rect, clip: &Rect) -> Vector {
        let requested = self.requested(id);
        let max_x = (content.size.width - clip.size.width).max(0.0);
        let max_y = (content.size.height - clip.size.height).max(0.0);
        Vector::new(requested.x.clamp(0.0, max_x), requested.y.clamp(0.0, max_y))
    }
}

/// A tagged item under the hit point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitItem {
    pub tag: HitTag,
    /// The hit point relative to the item's top-left corner.
    pub point_relative_to_item: Point,
}

/// Every tagged item under `point`, topmost first.
///
/// An item is hit when the point lies inside its rect and inside the clip of
/// every enclosing scroll frame.
pub fn hit_test(list: &DisplayList, scroll: &ScrollState, point: Point) -> Vec<HitItem> {
    let spaces = list.resolve_spaces(scroll);
    let mut hits = Vec::new();

    for item in list.items.iter().rev() {
        let Some(tag) = item.tag else { continue };
        let space = &spaces[item.space];
        if !space.visible() {
            continue;
        }
        let world = item.rect.translate(space.offset);
        if world.contains(point) && space.clip.is_none_or(|clip| clip.contains(point)) {
            let rel = point - world.origin;
            hits.push(HitItem {
                tag,
                point_relative_to_item: Point::new(rel.x, rel.y),
            });
        }
    }

    trace!(x = point.x, y = point.y, hits = hits.len(), "hit test");
    hits
}

/// The presented state: the latest display list plus scroll offsets.
#[derive(Debug, Clone)]
pub struct Scene {
    pub display_list: Arc<DisplayList>,
    pub scroll: ScrollState,
    pub epoch: u64,
}

impl Scene {
    pub fn new(display_list: DisplayList) -> Self {
        Self {
            display_list: Arc::new(display_list),
            scroll: ScrollState::new(),
            epoch: 0,
        }
    }

    pub fn set_display_list(&mut self, display_list: DisplayList) {
        self.display_list = Arc::new(display_list);
    }

    pub fn hit_test(&self, point: Point) -> Vec<HitItem> {
        hit_test(&self.display_list, &self.scroll, point)
    }
}
