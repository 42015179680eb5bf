// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font faces.
//
// A `GlyphSource` answers the questions layout and raster need: which glyph
// draws a char, how far it advances, the vertical metrics of the face, and
// the glyph outline.  Lookups are batched so a layout pass parses the font
// tables once per batch of cache misses.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use photon_core::error::{PhotonError, Result};

/// Vertical metrics of a face, in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: f32,
    /// Distance from the baseline to the top of the tallest glyphs (positive).
    pub ascent: f32,
    /// Distance from the baseline to the bottom of descenders (negative).
    pub descent: f32,
    pub line_gap: f32,
}

/// A glyph outline flattened to closed polygons, in font units with y up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOutline {
    pub contours: Vec<Vec<(f32, f32)>>,
}

pub trait GlyphSource: Send + Sync + fmt::Debug {
    fn metrics(&self) -> FontMetrics;

    /// Glyph index for each char, `None` where the face has no glyph.
    fn glyph_indices(&self, chars: &[char]) -> Vec<Option<u32>>;

    /// Horizontal advance for each glyph in font units.
    fn advances(&self, glyphs: &[u32]) -> Vec<Option<f32>>;

    /// Outline of a single glyph, `None` for blank or outline-less glyphs.
    fn outline(&self, glyph: u32) -> Option<GlyphOutline>;
}

// ---------------------------------------------------------------------------
// TrueType / OpenType
// ---------------------------------------------------------------------------

/// A TrueType/OpenType face parsed with `ttf-parser`.
///
/// The font bytes are owned; the borrowed `Face` view is re-created per batch.
pub struct TrueTypeFont {
    data: Arc<Vec<u8>>,
    index: u32,
    metrics: FontMetrics,
}

impl TrueTypeFont {
    /// Parse face `index` of an in-memory font file.
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|e| PhotonError::Font(format!("cannot parse face {index}: {e}")))?;
        let metrics = FontMetrics {
            units_per_em: face.units_per_em() as f32,
            ascent: face.ascender() as f32,
            descent: face.descender() as f32,
            line_gap: face.line_gap() as f32,
        };
        debug!(glyphs = face.number_of_glyphs(), ?metrics, "font face parsed");
        Ok(Self {
            data: Arc::new(data),
            index,
            metrics,
        })
    }

    /// Read and parse the first face of a font file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let font = Self::from_bytes(data, 0)?;
        info!(path = %path.display(), "font loaded");
        Ok(font)
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        // Same bytes and index that parsed in `from_bytes`.
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl GlyphSource for TrueTypeFont {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph_indices(&self, chars: &[char]) -> Vec<Option<u32>> {
        match self.face() {
            Some(face) => chars
                .iter()
                .map(|&ch| face.glyph_index(ch).map(|g| g.0 as u32))
                .collect(),
            None => vec![None; chars.len()],
        }
    }

    fn advances(&self, glyphs: &[u32]) -> Vec<Option<f32>> {
        match self.face() {
            Some(face) => glyphs
                .iter()
                .map(|&g| {
                    let id = ttf_parser::GlyphId(u16::try_from(g).ok()?);
                    face.glyph_hor_advance(id).map(f32::from)
                })
                .collect(),
            None => vec![None; glyphs.len()],
        }
    }

    fn outline(&self, glyph: u32) -> Option<GlyphOutline> {
        let face = self.face()?;
        let id = ttf_parser::GlyphId(u16::try_from(glyph).ok()?);
        let mut flattener = Flattener::default();
        face.outline_glyph(id, &mut flattener)?;
        Some(flattener.finish())
    }
}

/// Segments used to approximate each curve.
const CURVE_STEPS: usize = 8;

/// Collects `ttf-parser` outline commands into polygons.
#[derive(Default)]
struct Flattener {
    contours: Vec<Vec<(f32, f32)>>,
    current: Vec<(f32, f32)>,
}

impl Flattener {
    fn last(&self) -> (f32, f32) {
        self.current.last().copied().unwrap_or((0.0, 0.0))
    }

    fn finish(mut self) -> GlyphOutline {
        self.close_contour();
        GlyphOutline {
            contours: self.contours,
        }
    }

    fn close_contour(&mut self) {
        if self.current.len() > 2 {
            self.contours.push(std::mem::take(&mut self.current));
        } else {
            self.current.clear();
        }
    }
}

impl ttf_parser::OutlineBuilder for Flattener {
    fn move_to(&mut self, x: f32, y: f32) {
        self.close_contour();
        self.current.push((x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current.push((x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x0, y0) = self.last();
        for step in 1..=CURVE_STEPS {
            let t = step as f32 / CURVE_STEPS as f32;
            let mt = 1.0 - t;
            self.current.push((
                mt * mt * x0 + 2.0 * mt * t * x1 + t * t * x,
                mt * mt * y0 + 2.0 * mt * t * y1 + t * t * y,
            ));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x0, y0) = self.last();
        for step in 1..=CURVE_STEPS {
            let t = step as f32 / CURVE_STEPS as f32;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            self.current.push((
                a * x0 + b * x1 + c * x2 + d * x,
                a * y0 + b * y1 + c * y2 + d * y,
            ));
        }
    }

    fn close(&mut self) {
        self.close_contour();
    }
}

// ---------------------------------------------------------------------------
// Built-in fallback
// ---------------------------------------------------------------------------

/// Metric-only monospace face used when no font file is configured.
///
/// Every printable char maps to a glyph whose index is its code point.  There
/// are no outlines, so text still lays out and hit-tests but paints nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackFont;

impl FallbackFont {
    const UNITS_PER_EM: f32 = 1000.0;
    const ADVANCE: f32 = 600.0;
}

impl GlyphSource for FallbackFont {
    fn metrics(&self) -> FontMetrics {
        FontMetrics {
            units_per_em: Self::UNITS_PER_EM,
            ascent: 800.0,
            descent: -200.0,
            line_gap: 0.0,
        }
    }

    fn glyph_indices(&self, chars: &[char]) -> Vec<Option<u32>> {
        chars
            .iter()
            .map(|&ch| (!ch.is_control()).then_some(ch as u32))
            .collect()
    }

    fn advances(&self, glyphs: &[u32]) -> Vec<Option<f32>> {
        vec![Some(Self::ADVANCE); glyphs.len()]
    }

    fn outline(&self, _glyph: u32) -> Option<GlyphOutline> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttf_parser::OutlineBuilder;

    const DEJAVU_MONO: &[u8] = include_bytes!("../tests/fixtures/DejaVuSansMono.ttf");

    fn dejavu() -> TrueTypeFont {
        TrueTypeFont::from_bytes(DEJAVU_MONO.to_vec(), 0).unwrap()
    }

    #[test]
    fn truetype_face_reports_metrics() {
        let metrics = dejavu().metrics();
        assert_eq!(metrics.units_per_em, 2048.0);
        assert!(metrics.ascent > 0.0);
        assert!(metrics.descent < 0.0);
    }

    #[test]
    fn truetype_maps_chars_and_advances() {
        let font = dejavu();
        let indices = font.glyph_indices(&['H', 'g', '\u{10FFFD}']);
        let (h, g) = (indices[0].unwrap(), indices[1].unwrap());
        assert_ne!(h, g);
        assert_eq!(indices[2], None);

        let advances = font.advances(&[h, g]);
        let (ah, ag) = (advances[0].unwrap(), advances[1].unwrap());
        assert!(ah > 0.0);
        // Monospaced face.
        assert_eq!(ah, ag);
    }

    #[test]
    fn truetype_outlines_keep_counters() {
        let font = dejavu();
        let indices = font.glyph_indices(&['H', 'g', ' ']);

        let h = font.outline(indices[0].unwrap()).unwrap();
        assert_eq!(h.contours.len(), 1);
        // Outer shape plus the counter of the bowl.
        let g = font.outline(indices[1].unwrap()).unwrap();
        assert!(g.contours.len() >= 2);
        assert!(g.contours.iter().flatten().any(|&(_, y)| y < 0.0), "g descends below the baseline");

        assert!(font.outline(indices[2].unwrap()).is_none());
    }

    #[test]
    fn truetype_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.ttf");
        std::fs::write(&path, DEJAVU_MONO).unwrap();
        let font = TrueTypeFont::load(&path).unwrap();
        assert_eq!(font.metrics(), dejavu().metrics());
    }

    #[test]
    fn fallback_maps_printable_chars_only() {
        let font = FallbackFont;
        let indices = font.glyph_indices(&['a', '\t', ' ', 'é']);
        assert_eq!(indices, vec![Some('a' as u32), None, Some(' ' as u32), Some('é' as u32)]);
        assert_eq!(font.advances(&[1, 2]), vec![Some(600.0), Some(600.0)]);
        assert!(font.outline('a' as u32).is_none());
    }

    #[test]
    fn garbage_bytes_are_font_error() {
        let err = TrueTypeFont::from_bytes(vec![0u8; 32], 0).unwrap_err();
        assert!(matches!(err, PhotonError::Font(_)));
    }

    #[test]
    fn missing_font_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrueTypeFont::load(dir.path().join("missing.ttf")).unwrap_err();
        assert!(matches!(err, PhotonError::Io(_)));
    }

    #[test]
    fn flattener_splits_contours_and_curves() {
        let mut f = Flattener::default();
        f.move_to(0.0, 0.0);
        f.line_to(10.0, 0.0);
        f.quad_to(10.0, 10.0, 0.0, 10.0);
        f.close();
        f.move_to(2.0, 2.0);
        f.line_to(3.0, 2.0);
        f.line_to(3.0, 3.0);
        let outline = f.finish();

        assert_eq!(outline.contours.len(), 2);
        assert_eq!(outline.contours[0].len(), 2 + CURVE_STEPS);
        assert_eq!(*outline.contours[0].last().unwrap(), (0.0, 10.0));
        assert_eq!(outline.contours[1].len(), 3);
    }

    #[test]
    fn degenerate_contours_are_dropped() {
        let mut f = Flattener::default();
        f.move_to(0.0, 0.0);
        f.line_to(1.0, 1.0);
        f.close();
        assert!(f.finish().contours.is_empty());
    }
}
