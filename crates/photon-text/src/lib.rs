// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photon Text — font faces, glyph lookup caches, and left-to-right text
// layout used both for painting text nodes and for `measureText`.

pub mod font;
pub mod layout;

pub use font::{FallbackFont, FontMetrics, GlyphOutline, GlyphSource, TrueTypeFont};
pub use layout::{FontHandle, FontManager, GlyphInstance, LayoutedText};
