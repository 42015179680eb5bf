// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photon Render — the retained node tree the UI server mutates, the display
// list built from it, hit testing against that list, and a software
// rasteriser for snapshots.

pub mod display_list;
pub mod dom;
pub mod perf;
pub mod raster;
pub mod scene;

pub use display_list::{
    DisplayItem, DisplayList, DisplayListBuilder, HitTag, ItemKind, ResolvedSpace, Space, SpaceId, SpaceKind,
    build_display_list,
};
pub use dom::{ApplyContext, ApplyOutcome, Dom, Node, NodeKind, apply_updates};
pub use perf::{DEFAULT_PERF_CAPACITY, PerfEvent, PerfLog};
pub use raster::{rasterize, save_png};
pub use scene::{HitItem, Scene, ScrollState, hit_test};
