// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The retained node tree mutated by server update messages.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use photon_core::error::{PhotonError, Result};
use photon_core::{Color, LogId, NodeId, Point, Rect, Vector};
use photon_protocol::values::{parse_color, parse_node_id, parse_point, parse_rect, parse_string};
use photon_protocol::{Add, Callback, MakeNode, Remove, SetAttr, Update, UpdateOrLogIds, decode_message};
use photon_text::{FontManager, LayoutedText};

use crate::perf::PerfLog;
use crate::scene::ScrollState;

/// Attribute holding a node's child list.
const CHILDREN: &str = "children";

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Div {
        color: Color,
        rect: Rect,
        on_click: Callback,
        on_wheel: Callback,
    },
    Text {
        text: String,
        origin: Point,
        color: Color,
        layout: Option<LayoutedText>,
    },
    Scroll {
        position: Rect,
        content: Rect,
        on_wheel: Callback,
    },
}

impl NodeKind {
    /// A node of the named type with default attributes.
    pub fn create(node_type: &str) -> Result<Self> {
        match node_type {
            "root" => Ok(NodeKind::Root),
            "div" => Ok(NodeKind::Div {
                color: Color::TRANSPARENT,
                rect: Rect::zero(),
                on_click: Callback::None,
                on_wheel: Callback::None,
            }),
            "text" => Ok(NodeKind::Text {
                text: String::new(),
                origin: Point::zero(),
                color: Color::BLACK,
                layout: None,
            }),
            "scroll" => Ok(NodeKind::Scroll {
                position: Rect::zero(),
                content: Rect::zero(),
                on_wheel: Callback::None,
            }),
            other => Err(PhotonError::UnknownNodeType(other.to_string())),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Div { .. } => "div",
            NodeKind::Text { .. } => "text",
            NodeKind::Scroll { .. } => "scroll",
        }
    }

    pub fn on_click(&self) -> Callback {
        match self {
            NodeKind::Div { on_click, .. } => *on_click,
            _ => Callback::None,
        }
    }

    pub fn on_wheel(&self) -> Callback {
        match self {
            NodeKind::Div { on_wheel, .. } | NodeKind::Scroll { on_wheel, .. } => *on_wheel,
            _ => Callback::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: HashMap<NodeId, Node>,
    root: Option<NodeId>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(PhotonError::UnknownNode(id))
    }
}

/// Mutable state an update may touch besides the tree itself.
pub struct ApplyContext<'a> {
    pub fonts: &'a mut FontManager,
    pub scroll: &'a mut ScrollState,
    pub perf: &'a PerfLog,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// The display list must be rebuilt.
    pub rebuild: bool,
    /// Log ids carried by the message.
    pub log_ids: Vec<LogId>,
    pub applied: usize,
    /// Elements skipped because they did not decode or apply.
    pub rejected: usize,
}

/// Apply one update message to the tree.
///
/// Fails only when the payload is not a JSON array.  Bad elements are logged,
/// counted in `rejected` and skipped.
#[instrument(skip_all, fields(bytes = payload.len()))]
pub fn apply_updates(dom: &mut Dom, ctx: &mut ApplyContext<'_>, payload: &[u8]) -> Result<ApplyOutcome> {
    let mut outcome = ApplyOutcome::default();

    for element in decode_message(payload)? {
        let (node, applied) = match element {
            // The last list in a message wins.
            Ok(UpdateOrLogIds::LogIds(ids)) => {
                outcome.log_ids = ids;
                (None, Ok(false))
            }
            Ok(UpdateOrLogIds::Update(update)) => (Some(update.node_id()), apply_update(dom, ctx, update)),
            Err(e) => (None, Err(e)),
        };
        match applied {
            Ok(rebuild) => {
                outcome.rebuild |= rebuild;
                outcome.applied += 1;
            }
            Err(e) => {
                warn!(node = ?node, error = %e, "skipping update");
                outcome.rejected += 1;
            }
        }
    }

    if !outcome.log_ids.is_empty() {
        ctx.perf.on_server_message(&outcome.log_ids);
    }
    debug!(
        applied = outcome.applied,
        rejected = outcome.rejected,
        rebuild = outcome.rebuild,
        "updates applied"
    );
    Ok(outcome)
}

/// Apply a single update, returning whether the display list is now stale.
fn apply_update(dom: &mut Dom, ctx: &mut ApplyContext<'_>, update: Update) -> Result<bool> {
    match update {
        Update::MakeNode(MakeNode { node_id, node_type }) => {
            let kind = NodeKind::create(&node_type)?;
            if matches!(kind, NodeKind::Root) {
                dom.root = Some(node_id);
            }
            let replaced = dom.nodes.insert(
                node_id,
                Node {
                    id: node_id,
                    kind,
                    children: Vec::new(),
                },
            );
            if replaced.is_some() {
                ctx.scroll.remove(node_id);
            }
            Ok(true)
        }
        Update::Destroy(d) => {
            dom.nodes.remove(&d.node_id).ok_or(PhotonError::UnknownNode(d.node_id))?;
            ctx.scroll.remove(d.node_id);
            if dom.root == Some(d.node_id) {
                dom.root = None;
            }
            Ok(true)
        }
        Update::Add(Add { node_id, attribute, index, value }) => {
            if attribute == CHILDREN {
                let child = parse_node_id(&value)?;
                if !dom.nodes.contains_key(&child) {
                    return Err(PhotonError::UnknownNode(child));
                }
                let node = dom.get_mut(node_id)?;
                let index = index.min(node.children.len());
                node.children.insert(index, child);
            } else {
                dom.get_mut(node_id)?;
                debug!(node = node_id, attribute, "ignoring add to non-list attribute");
            }
            Ok(true)
        }
        Update::Remove(Remove { node_id, attribute, value }) => {
            let node = dom.get_mut(node_id)?;
            if attribute == CHILDREN {
                let child = parse_node_id(&value)?;
                if let Some(pos) = node.children.iter().position(|c| *c == child) {
                    node.children.remove(pos);
                }
            }
            Ok(true)
        }
        Update::SetAttr(SetAttr { node_id, attribute, value }) => {
            let node = dom.get_mut(node_id)?;
            set_attr(node_id, &mut node.kind, &attribute, &value, ctx)
        }
    }
}

fn set_attr(id: NodeId, kind: &mut NodeKind, attribute: &str, value: &Value, ctx: &mut ApplyContext<'_>) -> Result<bool> {
    match (kind, attribute) {
        (NodeKind::Div { color, .. }, "color") => *color = parse_color(value)?,
        (NodeKind::Div { rect, .. }, "rect") => *rect = parse_rect(value)?,
        (NodeKind::Div { on_click, .. }, "on-click") => *on_click = Callback::parse(value)?,
        (NodeKind::Div { on_wheel, .. }, "on-wheel") => *on_wheel = Callback::parse(value)?,

        (NodeKind::Scroll { position, .. }, "position") => *position = parse_rect(value)?,
        (NodeKind::Scroll { content, .. }, "content") => *content = parse_rect(value)?,
        (NodeKind::Scroll { on_wheel, .. }, "on-wheel") => *on_wheel = Callback::parse(value)?,
        (NodeKind::Scroll { .. }, "scroll-position") => {
            let offset = parse_point(value)?;
            ctx.scroll.set(id, Vector::new(offset.x, offset.y));
            return Ok(false);
        }

        (NodeKind::Text { text, layout, .. }, "text") => {
            let new_text = parse_string(value)?;
            *layout = Some(ctx.fonts.layout_text(new_text));
            *text = new_text.to_string();
        }
        (NodeKind::Text { origin, .. }, "origin") => *origin = parse_point(value)?,
        (NodeKind::Text { color, .. }, "color") => *color = parse_color(value)?,

        (kind, attribute) => {
            debug!(node = id, node_type = kind.type_name(), attribute, "ignoring unknown attribute");
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use photon_core::Size;
    use photon_text::FallbackFont;

    use crate::perf::PerfEvent;

    struct Harness {
        dom: Dom,
        fonts: FontManager,
        scroll: ScrollState,
        perf: PerfLog,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                dom: Dom::new(),
                fonts: FontManager::new(Arc::new(FallbackFont), 10.0),
                scroll: ScrollState::new(),
                perf: PerfLog::new(),
            }
        }

        fn apply(&mut self, payload: &str) -> Result<ApplyOutcome> {
            let mut ctx = ApplyContext {
                fonts: &mut self.fonts,
                scroll: &mut self.scroll,
                perf: &self.perf,
            };
            apply_updates(&mut self.dom, &mut ctx, payload.as_bytes())
        }
    }

    const TREE: &str = r#"[
        [7, 8],
        {"update-type":"make-node","type":"root","node":1},
        {"update-type":"make-node","type":"div","node":2},
        {"update-type":"make-node","type":"text","node":3},
        {"update-type":"add","node":1,"attr":"children","index":0,"value":2},
        {"update-type":"add","node":2,"attr":"children","index":0,"value":3}
    ]"#;

    #[test]
    fn builds_tree_and_collects_log_ids() {
        let mut h = Harness::new();
        let outcome = h.apply(TREE).unwrap();

        assert!(outcome.rebuild);
        assert_eq!(outcome.log_ids, vec![7, 8]);
        assert_eq!(outcome.applied, 6);
        assert_eq!(outcome.rejected, 0);
        assert_eq!(h.dom.root(), Some(1));
        assert_eq!(h.dom.get(1).unwrap().children, vec![2]);
        assert_eq!(h.dom.get(2).unwrap().children, vec![3]);
        assert_eq!(h.perf.len(), 1);
    }

    #[test]
    fn last_log_id_list_wins() {
        let mut h = Harness::new();
        let outcome = h
            .apply(r#"[[1, 2], {"update-type":"make-node","type":"root","node":1}, [3]]"#)
            .unwrap();

        assert_eq!(outcome.log_ids, vec![3]);
        assert_eq!(outcome.applied, 3);
        let events: Vec<_> = h.perf.drain().into_iter().map(|(_, e)| e).collect();
        assert_eq!(events, vec![PerfEvent::GetServerMessage { log_ids: vec![3] }]);
    }

    #[test]
    fn make_node_defaults() {
        assert_eq!(
            NodeKind::create("text").unwrap(),
            NodeKind::Text {
                text: String::new(),
                origin: Point::zero(),
                color: Color::BLACK,
                layout: None,
            }
        );
        assert!(matches!(
            NodeKind::create("canvas"),
            Err(PhotonError::UnknownNodeType(t)) if t == "canvas"
        ));
    }

    #[test]
    fn add_clamps_index_and_remove_takes_first_match() {
        let mut h = Harness::new();
        h.apply(TREE).unwrap();
        h.apply(
            r#"[
            {"update-type":"make-node","type":"div","node":4},
            {"update-type":"add","node":1,"attr":"children","index":99,"value":4},
            {"update-type":"add","node":1,"attr":"children","index":0,"value":4}
        ]"#,
        )
        .unwrap();
        assert_eq!(h.dom.get(1).unwrap().children, vec![4, 2, 4]);

        let outcome = h
            .apply(r#"[{"update-type":"remove","node":1,"attr":"children","value":4}]"#)
            .unwrap();
        assert!(outcome.rebuild);
        assert_eq!(h.dom.get(1).unwrap().children, vec![2, 4]);
    }

    #[test]
    fn bad_elements_are_skipped_not_fatal() {
        let mut h = Harness::new();
        let outcome = h
            .apply(
                r#"[
                {"update-type":"make-node","type":"root","node":1},
                {"update-type":"make-node","type":"canvas","node":2},
                {"update-type":"add","node":1,"attr":"children","index":0,"value":55},
                {"update-type":"destroy","node":77},
                {"update-type":"teleport","node":1},
                {"update-type":"make-node","type":"div","node":3},
                {"update-type":"set-attr","node":3,"attr":"on-click","value":"sometimes"}
            ]"#,
            )
            .unwrap();

        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.rejected, 5);
        assert!(h.dom.get(2).is_none());
        assert!(h.dom.get(1).unwrap().children.is_empty());
        assert_eq!(h.dom.get(3).unwrap().kind.on_click(), Callback::None);
    }

    #[test]
    fn non_array_payload_fails_whole_message() {
        let mut h = Harness::new();
        assert!(matches!(
            h.apply(r#"{"update-type":"destroy","node":1}"#),
            Err(PhotonError::Protocol(_))
        ));
    }

    #[test]
    fn destroying_root_clears_it() {
        let mut h = Harness::new();
        h.apply(TREE).unwrap();
        h.apply(r#"[{"update-type":"destroy","node":1}]"#).unwrap();
        assert_eq!(h.dom.root(), None);
        assert_eq!(h.dom.len(), 2);
    }

    #[test]
    fn text_attribute_lays_out() {
        let mut h = Harness::new();
        h.apply(TREE).unwrap();
        h.apply(r#"[{"update-type":"set-attr","node":3,"attr":"text","value":"abc\nd"}]"#)
            .unwrap();

        match &h.dom.get(3).unwrap().kind {
            NodeKind::Text { text, layout, .. } => {
                assert_eq!(text, "abc\nd");
                let layout = layout.as_ref().unwrap();
                assert_eq!(layout.size, Size::new(18.0, 20.0));
                assert_eq!(layout.glyphs.len(), 4);
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn div_handlers_and_color() {
        let mut h = Harness::new();
        h.apply(TREE).unwrap();
        h.apply(
            r#"[
            {"update-type":"set-attr","node":2,"attr":"on-click","value":"noria-handler-sync"},
            {"update-type":"set-attr","node":2,"attr":"on-wheel","value":"noria-handler-async"},
            {"update-type":"set-attr","node":2,"attr":"color","value":{"r":0,"g":0,"b":255,"a":128}}
        ]"#,
        )
        .unwrap();

        let kind = &h.dom.get(2).unwrap().kind;
        assert_eq!(kind.on_click(), Callback::Sync);
        assert_eq!(kind.on_wheel(), Callback::Async);
        assert!(matches!(kind, NodeKind::Div { color, .. } if *color == Color::from_rgba8(0, 0, 255, 128)));

        h.apply(r#"[{"update-type":"set-attr","node":2,"attr":"on-click","value":"-noria-handler"}]"#)
            .unwrap();
        assert_eq!(h.dom.get(2).unwrap().kind.on_click(), Callback::None);
    }

    #[test]
    fn scroll_position_does_not_rebuild() {
        let mut h = Harness::new();
        h.apply(r#"[{"update-type":"make-node","type":"scroll","node":5}]"#).unwrap();

        let outcome = h
            .apply(r#"[{"update-type":"set-attr","node":5,"attr":"scroll-position","value":{"x":0,"y":40}}]"#)
            .unwrap();
        assert!(!outcome.rebuild);
        assert_eq!(h.scroll.requested(5), Vector::new(0.0, 40.0));

        h.apply(r#"[{"update-type":"destroy","node":5}]"#).unwrap();
        assert_eq!(h.scroll.requested(5), Vector::zero());
    }

    #[test]
    fn unknown_attribute_is_ignored_but_rebuilds() {
        let mut h = Harness::new();
        h.apply(TREE).unwrap();
        let outcome = h
            .apply(r#"[{"update-type":"set-attr","node":2,"attr":"opacity","value":0.5}]"#)
            .unwrap();
        assert!(outcome.rebuild);
        assert_eq!(outcome.rejected, 0);
    }
}
