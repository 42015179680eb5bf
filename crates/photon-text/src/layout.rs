// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simple left-to-right text layout with glyph caches.
//
// No shaping: every char maps to one glyph and glyphs advance by their
// horizontal advance.  Lines are split on '\n' and stacked by the face's
// line height.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use photon_core::error::Result;
use photon_core::{PhotonConfig, Point, Rect, Size, Vector};

use crate::font::{FallbackFont, FontMetrics, GlyphOutline, GlyphSource, TrueTypeFont};

/// A positioned glyph.  `point` is the pen position on the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphInstance {
    pub index: u32,
    pub point: Point,
}

/// Glyphs laid out relative to a (0, 0) top-left origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutedText {
    pub glyphs: Vec<GlyphInstance>,
    pub size: Size,
}

impl LayoutedText {
    pub fn bounds(&self) -> Rect {
        Rect::new(Point::zero(), self.size)
    }
}

/// Cheap, cloneable reference to a face at a pixel size.
///
/// Carried by display lists so painting does not need the `FontManager`.
#[derive(Clone)]
pub struct FontHandle {
    source: Arc<dyn GlyphSource>,
    size: f32,
}

impl FontHandle {
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Font units to pixels.
    pub fn scale(&self) -> f32 {
        self.size / self.source.metrics().units_per_em
    }

    pub fn metrics(&self) -> FontMetrics {
        self.source.metrics()
    }

    pub fn outline(&self, glyph: u32) -> Option<GlyphOutline> {
        self.source.outline(glyph)
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("source", &self.source)
            .field("size", &self.size)
            .finish()
    }
}

/// Owns the active face and caches char -> glyph and glyph -> advance lookups.
pub struct FontManager {
    source: Arc<dyn GlyphSource>,
    font_size: f32,
    index_cache: HashMap<char, Option<u32>>,
    advance_cache: HashMap<u32, Option<f32>>,
}

impl FontManager {
    pub fn new(source: Arc<dyn GlyphSource>, font_size: f32) -> Self {
        Self {
            source,
            font_size,
            index_cache: HashMap::new(),
            advance_cache: HashMap::new(),
        }
    }

    /// The configured font file, or the built-in fallback face.
    pub fn from_config(config: &PhotonConfig) -> Result<Self> {
        let source: Arc<dyn GlyphSource> = match &config.font_path {
            Some(path) => Arc::new(TrueTypeFont::load(path)?),
            None => {
                debug!("no font configured, using fallback metrics");
                Arc::new(FallbackFont)
            }
        };
        Ok(Self::new(source, config.font_size))
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn handle(&self) -> FontHandle {
        FontHandle {
            source: Arc::clone(&self.source),
            size: self.font_size,
        }
    }

    fn scale(&self) -> f32 {
        self.font_size / self.source.metrics().units_per_em
    }

    /// Baseline offset from the top of a line, in pixels.
    pub fn ascent(&self) -> f32 {
        self.source.metrics().ascent * self.scale()
    }

    /// Distance between consecutive baselines, in pixels.
    pub fn line_height(&self) -> f32 {
        let m = self.source.metrics();
        (m.ascent - m.descent + m.line_gap) * self.scale()
    }

    fn glyph_indices(&mut self, chars: &[char]) -> Vec<Option<u32>> {
        let mut indices = vec![None; chars.len()];
        let mut missed = Vec::new();
        let mut miss_positions = Vec::new();
        for (pos, ch) in chars.iter().enumerate() {
            match self.index_cache.get(ch) {
                Some(idx) => indices[pos] = *idx,
                None => {
                    missed.push(*ch);
                    miss_positions.push(pos);
                }
            }
        }

        if !missed.is_empty() {
            let found = self.source.glyph_indices(&missed);
            for ((pos, ch), idx) in miss_positions.iter().zip(&missed).zip(found) {
                indices[*pos] = idx;
                self.index_cache.insert(*ch, idx);
            }
        }
        indices
    }

    fn advances(&mut self, glyphs: &[u32]) -> Vec<Option<f32>> {
        let mut advances = vec![None; glyphs.len()];
        let mut missed = Vec::new();
        let mut miss_positions = Vec::new();
        for (pos, glyph) in glyphs.iter().enumerate() {
            match self.advance_cache.get(glyph) {
                Some(adv) => advances[pos] = *adv,
                None => {
                    missed.push(*glyph);
                    miss_positions.push(pos);
                }
            }
        }

        if !missed.is_empty() {
            let found = self.source.advances(&missed);
            for ((pos, glyph), adv) in miss_positions.iter().zip(&missed).zip(found) {
                advances[*pos] = adv;
                self.advance_cache.insert(*glyph, adv);
            }
        }
        advances
    }

    /// Lay out a single line.  Chars the face cannot draw advance by the font
    /// size and produce no glyph.
    pub fn layout_line(&mut self, text: &str) -> LayoutedText {
        let chars: Vec<char> = text.chars().collect();
        let indices = self.glyph_indices(&chars);
        let present: Vec<u32> = indices.iter().filter_map(|idx| *idx).collect();
        let advances = self.advances(&present);

        let scale = self.scale();
        let baseline = self.ascent();
        let mut pen = 0.0f32;
        let mut glyphs = Vec::with_capacity(present.len());
        let mut advances = advances.into_iter();

        for idx in indices {
            match idx {
                Some(index) => {
                    glyphs.push(GlyphInstance {
                        index,
                        point: Point::new(pen, baseline),
                    });
                    let advance = advances.next().flatten();
                    pen += advance.map_or(self.font_size, |a| a * scale);
                }
                None => pen += self.font_size,
            }
        }

        LayoutedText {
            glyphs,
            size: Size::new(pen, self.line_height()),
        }
    }

    /// Lay out text that may span several lines.
    ///
    /// The width is the widest line; a trailing newline does not add a line.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn layout_text(&mut self, text: &str) -> LayoutedText {
        let line_height = self.line_height();
        let mut result = LayoutedText::default();
        let mut lines = 0usize;

        for line in text.split_terminator('\n') {
            let offset = Vector::new(0.0, lines as f32 * line_height);
            let laid = self.layout_line(line);
            result.size.width = result.size.width.max(laid.size.width);
            result.glyphs.extend(laid.glyphs.into_iter().map(|g| GlyphInstance {
                index: g.index,
                point: g.point + offset,
            }));
            lines += 1;
        }

        result.size.height = lines as f32 * line_height;
        result
    }

    /// Width of `text` as it would be painted.
    pub fn measure(&mut self, text: &str) -> f32 {
        self.layout_text(text).size.width
    }

    /// Entries currently held by the char and advance caches.
    pub fn cache_len(&self) -> (usize, usize) {
        (self.index_cache.len(), self.advance_cache.len())
    }
}
