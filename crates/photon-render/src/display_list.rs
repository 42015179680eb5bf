// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display lists.
//
// A display list is a flat, paint-ordered list of items plus a tree of
// coordinate spaces.  Every item is positioned in the local coordinates of
// its space:
//
//   - the root space is the viewport,
//   - a reference frame (stacking context) translates its children by an
//     origin,
//   - a scroll frame shifts its children by the node's scroll offset and
//     clips them to the frame's viewport rect.
//
// Spaces are created in tree order, so a space's parent always has a smaller
// id and resolving the whole tree is one forward pass.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use photon_core::{Color, NodeId, Rect, Size, Vector};
use photon_text::{FontHandle, GlyphInstance};

use crate::dom::{Dom, NodeKind};
use crate::scene::ScrollState;

pub type SpaceId = usize;

/// Hit-test tag: the node id plus a per-node item discriminator.
pub type HitTag = (NodeId, u16);

/// Border width and corner radius drawn around every div.
const DIV_BORDER_WIDTH: f32 = 1.0;
const DIV_BORDER_RADIUS: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SpaceKind {
    Root,
    Reference { origin: Vector },
    Scroll { id: NodeId, content: Rect, clip: Rect },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Space {
    pub parent: Option<SpaceId>,
    pub kind: SpaceKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Rect { color: Color },
    Border { width: f32, radius: f32, color: Color },
    Text { glyphs: Vec<GlyphInstance>, color: Color },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub space: SpaceId,
    pub rect: Rect,
    pub tag: Option<HitTag>,
    pub kind: ItemKind,
}

/// A space resolved against the current scroll state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSpace {
    /// Local -> world translation.
    pub offset: Vector,
    /// World-space clip, `None` when unclipped.
    pub clip: Option<Rect>,
    empty_clip: bool,
}

impl ResolvedSpace {
    /// False when the clip chain leaves nothing visible.
    pub fn visible(&self) -> bool {
        !self.empty_clip
    }
}

#[derive(Debug, Clone)]
pub struct DisplayList {
    pub spaces: Vec<Space>,
    pub items: Vec<DisplayItem>,
    pub content_size: Size,
    pub background: Color,
    pub font: FontHandle,
}

impl DisplayList {
    /// Resolve every space's world offset and clip.
    pub fn resolve_spaces(&self, scroll: &ScrollState) -> Vec<ResolvedSpace> {
        let mut resolved: Vec<ResolvedSpace> = Vec::with_capacity(self.spaces.len());
        for space in &self.spaces {
            let parent = space.parent.map(|p| resolved[p]).unwrap_or(ResolvedSpace {
                offset: Vector::zero(),
                clip: None,
                empty_clip: false,
            });
            let next = match &space.kind {
                SpaceKind::Root => parent,
                SpaceKind::Reference { origin } => ResolvedSpace {
                    offset: parent.offset + *origin,
                    ..parent
                },
                SpaceKind::Scroll { id, content, clip } => {
                    let frame_clip = clip.translate(parent.offset);
                    let (world_clip, empty_clip) = match parent.clip {
                        Some(outer) => match outer.intersection(&frame_clip) {
                            Some(c) => (c, parent.empty_clip),
                            None => (Rect::zero(), true),
                        },
                        None => (frame_clip, frame_clip.is_empty()),
                    };
                    ResolvedSpace {
                        offset: parent.offset - scroll.effective(*id, content, clip),
                        clip: Some(world_clip),
                        empty_clip,
                    }
                }
            };
            resolved.push(next);
        }
        resolved
    }

    /// Scroll node ids defined in this list, in tree order.
    pub fn scroll_frames(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.spaces.iter().filter_map(|s| match s.kind {
            SpaceKind::Scroll { id, .. } => Some(id),
            _ => None,
        })
    }
}

/// Incrementally builds a `DisplayList`, tracking the current space.
pub struct DisplayListBuilder {
    list: DisplayList,
    stack: Vec<SpaceId>,
}

impl DisplayListBuilder {
    pub fn new(content_size: Size, font: FontHandle, background: Color) -> Self {
        Self {
            list: DisplayList {
                spaces: vec![Space {
                    parent: None,
                    kind: SpaceKind::Root,
                }],
                items: Vec::new(),
                content_size,
                background,
                font,
            },
            stack: vec![0],
        }
    }

    pub fn content_size(&self) -> Size {
        self.list.content_size
    }

    pub fn current_space(&self) -> SpaceId {
        self.stack.last().copied().unwrap_or(0)
    }

    fn push_space(&mut self, kind: SpaceKind) -> SpaceId {
        let id = self.list.spaces.len();
        self.list.spaces.push(Space {
            parent: Some(self.current_space()),
            kind,
        });
        self.stack.push(id);
        id
    }

    /// Start a stacking context translated by `origin`.
    pub fn push_reference_frame(&mut self, origin: Vector) -> SpaceId {
        self.push_space(SpaceKind::Reference { origin })
    }

    /// Start a scroll frame showing `content` through the `clip` viewport.
    pub fn define_scroll_frame(&mut self, id: NodeId, content: Rect, clip: Rect) -> SpaceId {
        self.push_space(SpaceKind::Scroll { id, content, clip })
    }

    /// Leave the current space.  The root space is never popped.
    pub fn pop_space(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            warn!("unbalanced pop of the root space");
        }
    }

    fn push_item(&mut self, rect: Rect, tag: Option<HitTag>, kind: ItemKind) {
        let space = self.current_space();
        self.list.items.push(DisplayItem { space, rect, tag, kind });
    }

    pub fn push_rect(&mut self, rect: Rect, color: Color, tag: Option<HitTag>) {
        self.push_item(rect, tag, ItemKind::Rect { color });
    }

    pub fn push_border(&mut self, rect: Rect, width: f32, radius: f32, color: Color, tag: Option<HitTag>) {
        self.push_item(rect, tag, ItemKind::Border { width, radius, color });
    }

    pub fn push_text(&mut self, rect: Rect, glyphs: Vec<GlyphInstance>, color: Color) {
        self.push_item(rect, None, ItemKind::Text { glyphs, color });
    }

    pub fn finalize(self) -> DisplayList {
        self.list
    }
}

/// Build the display list for the tree under the DOM root.
///
/// Children that no longer exist are skipped, and a node that appears again
/// on its own ancestor path is not revisited.
#[instrument(skip_all, fields(nodes = dom.len()))]
pub fn build_display_list(dom: &Dom, content_size: Size, font: FontHandle, background: Color) -> DisplayList {
    let mut builder = DisplayListBuilder::new(content_size, font, background);
    if let Some(root) = dom.root() {
        let mut path = HashSet::new();
        visit(dom, root, &mut builder, &mut path);
    }
    let list = builder.finalize();
    debug!(spaces = list.spaces.len(), items = list.items.len(), "display list built");
    list
}

fn visit(dom: &Dom, id: NodeId, builder: &mut DisplayListBuilder, path: &mut HashSet<NodeId>) {
    let Some(node) = dom.get(id) else {
        debug!(node = id, "skipping child that no longer exists");
        return;
    };
    if !path.insert(id) {
        warn!(node = id, "node is its own ancestor, not revisiting");
        return;
    }

    // Every node kind opens exactly one space for its children.
    visit_down(id, &node.kind, builder);
    for child in &node.children {
        visit(dom, *child, builder, path);
    }
    builder.pop_space();

    path.remove(&id);
}

fn visit_down(id: NodeId, kind: &NodeKind, builder: &mut DisplayListBuilder) {
    match kind {
        NodeKind::Root => {
            builder.push_reference_frame(Vector::zero());
        }
        NodeKind::Div { color, rect, on_click, on_wheel } => {
            let tag = (on_click.is_some() || on_wheel.is_some()).then_some((id, 0));
            if !color.is_transparent() {
                builder.push_rect(*rect, *color, None);
            }
            builder.push_border(*rect, DIV_BORDER_WIDTH, DIV_BORDER_RADIUS, Color::TRANSPARENT, tag);
            builder.push_reference_frame(rect.origin.to_vector());
        }
        NodeKind::Scroll { position, content, on_wheel } => {
            builder.define_scroll_frame(id, *content, *position);
            let tag = on_wheel.is_some().then_some((id, 0));
            builder.push_rect(*content, Color::TRANSPARENT, tag);
        }
        NodeKind::Text { origin, layout, color, .. } => {
            builder.push_reference_frame(origin.to_vector());
            if let Some(layout) = layout {
                builder.push_text(layout.bounds(), layout.glyphs.clone(), *color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use photon_core::Point;
    use photon_text::{FallbackFont, FontManager};

    use crate::dom::{ApplyContext, apply_updates};
    use crate::perf::PerfLog;

    fn build(payload: &str) -> (DisplayList, ScrollState) {
        let mut dom = Dom::default();
        let mut fonts = FontManager::new(Arc::new(FallbackFont), 10.0);
        let mut scroll = ScrollState::new();
        let perf = PerfLog::new();
        let mut ctx = ApplyContext {
            fonts: &mut fonts,
            scroll: &mut scroll,
            perf: &perf,
        };
        apply_updates(&mut dom, &mut ctx, payload.as_bytes()).unwrap();
        let list = build_display_list(&dom, Size::new(800.0, 600.0), fonts.handle(), Color::BLACK);
        (list, scroll)
    }

    #[test]
    fn empty_dom_has_only_root_space() {
        let (list, _) = build("[]");
        assert_eq!(list.spaces.len(), 1);
        assert!(list.items.is_empty());
    }

    #[test]
    fn div_tree_produces_tagged_border_and_nested_space() {
        let (list, _) = build(
            r#"[
            {"update-type":"make-node","type":"root","node":1},
            {"update-type":"make-node","type":"div","node":2},
            {"update-type":"set-attr","node":2,"attr":"rect","value":{"x":10,"y":20,"width":100,"height":50}},
            {"update-type":"set-attr","node":2,"attr":"on-click","value":"noria-handler-sync"},
            {"update-type":"add","node":1,"attr":"children","index":0,"value":2}
        ]"#,
        );

        // root space, root stacking context, div stacking context
        assert_eq!(list.spaces.len(), 3);
        assert_eq!(list.spaces[2].kind, SpaceKind::Reference { origin: Vector::new(10.0, 20.0) });

        // transparent div: border only, tagged for hit testing
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].tag, Some((2, 0)));
        assert!(matches!(list.items[0].kind, ItemKind::Border { .. }));
    }

    #[test]
    fn coloured_div_paints_background_untagged() {
        let (list, _) = build(
            r#"[
            {"update-type":"make-node","type":"root","node":1},
            {"update-type":"make-node","type":"div","node":2},
            {"update-type":"set-attr","node":2,"attr":"color","value":{"r":255,"g":0,"b":0,"a":255}},
            {"update-type":"add","node":1,"attr":"children","index":0,"value":2}
        ]"#,
        );
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].kind, ItemKind::Rect { color: Color::from_rgba8(255, 0, 0, 255) });
        assert_eq!(list.items[0].tag, None);
        assert_eq!(list.items[1].tag, None);
    }

    #[test]
    fn text_inside_div_resolves_to_world_position() {
        let (list, scroll) = build(
            r#"[
            {"update-type":"make-node","type":"root","node":1},
            {"update-type":"make-node","type":"div","node":2},
            {"update-type":"set-attr","node":2,"attr":"rect","value":{"x":100,"y":100,"width":10,"height":10}},
            {"update-type":"make-node","type":"text","node":3},
            {"update-type":"set-attr","node":3,"attr":"text","value":"hi"},
            {"update-type":"set-attr","node":3,"attr":"origin","value":{"x":5,"y":6}},
            {"update-type":"add","node":1,"attr":"children","index":0,"value":2},
            {"update-type":"add","node":2,"attr":"children","index":0,"value":3}
        ]"#,
        );

        let text = list
            .items
            .iter()
            .find(|i| matches!(i.kind, ItemKind::Text { .. }))
            .expect("text item");
        let spaces = list.resolve_spaces(&scroll);
        assert_eq!(spaces[text.space].offset, Vector::new(105.0, 106.0));
        assert_eq!(text.rect.size, Size::new(12.0, 10.0));
        if let ItemKind::Text { glyphs, color } = &text.kind {
            assert_eq!(glyphs.len(), 2);
            assert_eq!(glyphs[1].point, Point::new(6.0, 8.0));
            assert_eq!(*color, Color::BLACK);
        }
    }

    #[test]
    fn scroll_frame_lists_its_node() {
        let (list, _) = build(
            r#"[
            {"update-type":"make-node","type":"root","node":1},
            {"update-type":"make-node","type":"scroll","node":4},
            {"update-type":"set-attr","node":4,"attr":"on-wheel","value":"noria-handler-async"},
            {"update-type":"add","node":1,"attr":"children","index":0,"value":4}
        ]"#,
        );
        assert_eq!(list.scroll_frames().collect::<Vec<_>>(), vec![4]);
        assert_eq!(list.items[0].tag, Some((4, 0)));
    }

    #[test]
    fn cycles_and_dangling_children_are_skipped() {
        let (list, _) = build(
            r#"[
            {"update-type":"make-node","type":"root","node":1},
            {"update-type":"make-node","type":"div","node":2},
            {"update-type":"make-node","type":"div","node":3},
            {"update-type":"add","node":1,"attr":"children","index":0,"value":2},
            {"update-type":"add","node":2,"attr":"children","index":0,"value":3},
            {"update-type":"add","node":3,"attr":"children","index":0,"value":2},
            {"update-type":"make-node","type":"div","node":9},
            {"update-type":"add","node":3,"attr":"children","index":1,"value":9},
            {"update-type":"destroy","node":9}
        ]"#,
        );
        // root frame + div 2 + div 3; the cycle back to 2 and the destroyed 9 add nothing.
        assert_eq!(list.spaces.len(), 4);
        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn builder_never_pops_root() {
        let font = FontManager::new(Arc::new(FallbackFont), 10.0).handle();
        let mut b = DisplayListBuilder::new(Size::new(1.0, 1.0), font, Color::BLACK);
        b.pop_space();
        b.pop_space();
        assert_eq!(b.current_space(), 0);
    }
}
