// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Software rasteriser for display lists.
//
// Paints into an RGBA image the size of the list's content.  Every pixel goes
// through imageproc's `Blend` canvas, so translucent colours composite over
// what is already there.  Rects and borders are pixel-aligned fills; glyphs
// are filled from their flattened outlines with a non-zero scanline rule and
// four vertical samples per pixel, since polygon drawing cannot cut the holes
// out of glyphs like `o`.  Corner radii are not drawn.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{Blend, Canvas, draw_filled_rect_mut};
use imageproc::rect::Rect as PixelRect;
use tracing::{debug, instrument};

use photon_core::error::{PhotonError, Result};
use photon_core::{Color, Rect, Vector, rect};
use photon_text::{FontHandle, GlyphInstance};

use crate::display_list::{DisplayList, ItemKind};
use crate::scene::ScrollState;

/// Vertical samples per pixel row when filling glyphs.
const SAMPLES: usize = 4;

type Target = Blend<RgbaImage>;

/// Paint `list` with the given scroll offsets.
#[instrument(skip_all, fields(items = list.items.len()))]
pub fn rasterize(list: &DisplayList, scroll: &ScrollState) -> RgbaImage {
    let width = list.content_size.width.max(0.0).ceil() as u32;
    let height = list.content_size.height.max(0.0).ceil() as u32;
    let mut canvas = Blend(RgbaImage::from_pixel(width, height, Rgba(list.background.to_rgba8())));
    let viewport = rect(0.0, 0.0, width as f32, height as f32);

    let spaces = list.resolve_spaces(scroll);
    let mut painted = 0usize;
    for item in &list.items {
        let space = &spaces[item.space];
        if !space.visible() {
            continue;
        }
        let clip = match space.clip {
            Some(clip) => match clip.intersection(&viewport) {
                Some(c) => c,
                None => continue,
            },
            None => viewport,
        };
        let world = item.rect.translate(space.offset);

        match &item.kind {
            ItemKind::Rect { color } => fill_rect(&mut canvas, world, clip, *color),
            ItemKind::Border { width, color, .. } => stroke_rect(&mut canvas, world, *width, clip, *color),
            ItemKind::Text { glyphs, color } => {
                fill_glyphs(&mut canvas, &list.font, glyphs, space.offset, clip, *color)
            }
        }
        painted += 1;
    }

    debug!(width, height, painted, "rasterized display list");
    canvas.0
}

/// Write `image` as a PNG file.
pub fn save_png(image: &RgbaImage, path: impl AsRef<Path>) -> Result<()> {
    image
        .save_with_format(path.as_ref(), ImageFormat::Png)
        .map_err(|err| PhotonError::Image(format!("failed to save image to {}: {}", path.as_ref().display(), err)))
}

fn pixel(color: Color, coverage: f32) -> Rgba<u8> {
    Rgba(Color::new(color.r, color.g, color.b, color.a * coverage).to_rgba8())
}

/// Pixel index range whose centres fall in `[lo, hi)`.
fn pixel_span(lo: f32, hi: f32) -> std::ops::Range<u32> {
    let start = (lo - 0.5).ceil().max(0.0) as u32;
    let end = (hi - 0.5).ceil().max(0.0) as u32;
    start..end.max(start)
}

/// Pixels whose centres lie inside `area`, if any.
fn pixel_rect(area: Rect) -> Option<PixelRect> {
    let xs = pixel_span(area.min_x(), area.max_x());
    let ys = pixel_span(area.min_y(), area.max_y());
    if xs.is_empty() || ys.is_empty() {
        return None;
    }
    Some(PixelRect::at(xs.start as i32, ys.start as i32).of_size(xs.end - xs.start, ys.end - ys.start))
}

fn fill_rect(canvas: &mut Target, area: Rect, clip: Rect, color: Color) {
    if color.is_transparent() {
        return;
    }
    if let Some(px) = area.intersection(&clip).and_then(pixel_rect) {
        draw_filled_rect_mut(canvas, px, pixel(color, 1.0));
    }
}

fn stroke_rect(canvas: &mut Target, area: Rect, width: f32, clip: Rect, color: Color) {
    if color.is_transparent() || width <= 0.0 {
        return;
    }
    let w = width.min(area.size.width / 2.0).min(area.size.height / 2.0);
    let inner_height = area.size.height - 2.0 * w;
    let edges = [
        rect(area.min_x(), area.min_y(), area.size.width, w),
        rect(area.min_x(), area.max_y() - w, area.size.width, w),
        rect(area.min_x(), area.min_y() + w, w, inner_height),
        rect(area.max_x() - w, area.min_y() + w, w, inner_height),
    ];
    for edge in edges {
        fill_rect(canvas, edge, clip, color);
    }
}

fn fill_glyphs(
    canvas: &mut Target,
    font: &FontHandle,
    glyphs: &[GlyphInstance],
    offset: Vector,
    clip: Rect,
    color: Color,
) {
    if color.is_transparent() {
        return;
    }
    let scale = font.scale();
    for glyph in glyphs {
        let Some(outline) = font.outline(glyph.index) else { continue };
        let origin = glyph.point + offset;
        let contours: Vec<Vec<(f32, f32)>> = outline
            .contours
            .iter()
            .map(|c| c.iter().map(|(x, y)| (origin.x + x * scale, origin.y - y * scale)).collect())
            .collect();
        fill_path(canvas, &contours, clip, color);
    }
}

/// Non-zero winding scanline fill of closed polygons in pixel space.
fn fill_path(canvas: &mut Target, contours: &[Vec<(f32, f32)>], clip: Rect, color: Color) {
    let mut points = contours.iter().flatten();
    let Some(&(x, y)) = points.next() else { return };
    let (mut x0, mut y0, mut x1, mut y1) = (x, y, x, y);
    for &(x, y) in points {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    let Some(bounds) = rect(x0, y0, x1 - x0, y1 - y0).inflate(1.0, 1.0).intersection(&clip) else {
        return;
    };

    let (width, height) = canvas.dimensions();
    let columns = pixel_span(bounds.min_x(), bounds.max_x());
    let mut coverage = vec![0.0f32; columns.len()];
    let mut crossings: Vec<(f32, i32)> = Vec::new();

    for y in pixel_span(bounds.min_y(), bounds.max_y()) {
        coverage.iter_mut().for_each(|c| *c = 0.0);

        for sample in 0..SAMPLES {
            let sy = y as f32 + (sample as f32 + 0.5) / SAMPLES as f32;
            crossings.clear();
            for contour in contours {
                for (i, &(x0, y0)) in contour.iter().enumerate() {
                    let (x1, y1) = contour[(i + 1) % contour.len()];
                    if (y0 <= sy && sy < y1) || (y1 <= sy && sy < y0) {
                        let t = (sy - y0) / (y1 - y0);
                        let dir = if y1 > y0 { 1 } else { -1 };
                        crossings.push((x0 + t * (x1 - x0), dir));
                    }
                }
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                for x in pixel_span(pair[0].0.max(clip.min_x()), pair[1].0.min(clip.max_x())) {
                    if let Some(c) = x.checked_sub(columns.start).and_then(|i| coverage.get_mut(i as usize)) {
                        *c += 1.0 / SAMPLES as f32;
                    }
                }
            }
        }

        for (i, c) in coverage.iter().enumerate() {
            let x = columns.start + i as u32;
            if *c > 0.0 && x < width && y < height {
                canvas.draw_pixel(x, y, pixel(color, c.min(1.0)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use photon_core::{Point, Size};
    use photon_text::{FallbackFont, FontManager, FontMetrics, GlyphOutline, GlyphSource, TrueTypeFont};

    use crate::display_list::DisplayListBuilder;

    /// Every glyph is a 500x500 unit square sitting on the baseline.
    #[derive(Debug)]
    struct SquareFont;

    impl GlyphSource for SquareFont {
        fn metrics(&self) -> FontMetrics {
            FallbackFont.metrics()
        }

        fn glyph_indices(&self, chars: &[char]) -> Vec<Option<u32>> {
            FallbackFont.glyph_indices(chars)
        }

        fn advances(&self, glyphs: &[u32]) -> Vec<Option<f32>> {
            FallbackFont.advances(glyphs)
        }

        fn outline(&self, _glyph: u32) -> Option<GlyphOutline> {
            Some(GlyphOutline {
                contours: vec![vec![(0.0, 0.0), (500.0, 0.0), (500.0, 500.0), (0.0, 500.0)]],
            })
        }
    }

    fn builder(font: Arc<dyn GlyphSource>) -> DisplayListBuilder {
        let handle = FontManager::new(font, 10.0).handle();
        DisplayListBuilder::new(Size::new(40.0, 30.0), handle, Color::BLACK)
    }

    fn rgba(image: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
        image.get_pixel(x, y).0
    }

    /// Blending rounds per channel, so compare within a couple of steps.
    fn assert_close(actual: [u8; 4], expected: [u8; 4]) {
        let close = actual.iter().zip(expected).all(|(a, e)| a.abs_diff(e) <= 2);
        assert!(close, "pixel {actual:?} is not close to {expected:?}");
    }

    #[test]
    fn clears_to_background_at_content_size() {
        let list = builder(Arc::new(FallbackFont)).finalize();
        let image = rasterize(&list, &ScrollState::new());
        assert_eq!(image.dimensions(), (40, 30));
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn fills_and_blends_rects() {
        let mut b = builder(Arc::new(FallbackFont));
        b.push_rect(rect(2.0, 2.0, 4.0, 4.0), Color::WHITE, None);
        b.push_rect(rect(4.0, 4.0, 4.0, 4.0), Color::new(1.0, 0.0, 0.0, 0.5), None);
        let image = rasterize(&b.finalize(), &ScrollState::new());

        assert_eq!(rgba(&image, 2, 2), [255, 255, 255, 255]);
        assert_eq!(rgba(&image, 6, 2), [0, 0, 0, 255]);
        assert_close(rgba(&image, 5, 5), [255, 128, 128, 255]);
        assert_close(rgba(&image, 7, 7), [128, 0, 0, 255]);
    }

    #[test]
    fn borders_are_stroked_not_filled() {
        let mut b = builder(Arc::new(FallbackFont));
        b.push_border(rect(10.0, 10.0, 10.0, 10.0), 1.0, 3.0, Color::WHITE, None);
        let image = rasterize(&b.finalize(), &ScrollState::new());

        assert_eq!(rgba(&image, 10, 10), [255, 255, 255, 255]);
        assert_eq!(rgba(&image, 19, 15), [255, 255, 255, 255]);
        assert_eq!(rgba(&image, 15, 15), [0, 0, 0, 255]);
    }

    #[test]
    fn scroll_frames_clip_and_offset() {
        let mut b = builder(Arc::new(FallbackFont));
        b.define_scroll_frame(1, rect(0.0, 0.0, 10.0, 100.0), rect(0.0, 0.0, 10.0, 10.0));
        b.push_rect(rect(0.0, 15.0, 10.0, 5.0), Color::WHITE, None);
        b.pop_space();
        let list = b.finalize();

        let mut scroll = ScrollState::new();
        let image = rasterize(&list, &scroll);
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 255]));

        scroll.set(1, Vector::new(0.0, 12.0));
        let image = rasterize(&list, &scroll);
        assert_eq!(rgba(&image, 5, 3), [255, 255, 255, 255]);
        assert_eq!(rgba(&image, 5, 8), [0, 0, 0, 255]);
    }

    #[test]
    fn glyph_outlines_are_filled_above_the_baseline() {
        let mut b = builder(Arc::new(SquareFont));
        b.push_reference_frame(Vector::new(10.0, 10.0));
        let glyphs = vec![GlyphInstance {
            index: 'a' as u32,
            point: Point::new(0.0, 8.0),
        }];
        b.push_text(rect(0.0, 0.0, 6.0, 10.0), glyphs, Color::WHITE);
        b.pop_space();
        let image = rasterize(&b.finalize(), &ScrollState::new());

        // 5x5 px square spanning x 10..15, y 13..18
        assert_eq!(rgba(&image, 12, 15), [255, 255, 255, 255]);
        assert_eq!(rgba(&image, 14, 13), [255, 255, 255, 255]);
        assert_eq!(rgba(&image, 12, 18), [0, 0, 0, 255]);
        assert_eq!(rgba(&image, 15, 15), [0, 0, 0, 255]);
    }

    #[test]
    fn truetype_text_lights_pixels() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../photon-text/tests/fixtures/DejaVuSansMono.ttf");
        let font: Arc<dyn GlyphSource> = Arc::new(TrueTypeFont::load(path).unwrap());
        let mut fm = FontManager::new(font, 20.0);
        let laid = fm.layout_line("Hg");
        let split = 5 + laid.glyphs[1].point.x as u32;

        let mut b = DisplayListBuilder::new(Size::new(40.0, 30.0), fm.handle(), Color::BLACK);
        b.push_reference_frame(Vector::new(5.0, 2.0));
        b.push_text(laid.bounds(), laid.glyphs.clone(), Color::WHITE);
        b.pop_space();
        let image = rasterize(&b.finalize(), &ScrollState::new());

        let lit = |xs: std::ops::Range<u32>| {
            xs.flat_map(|x| (0..30).map(move |y| (x, y)))
                .filter(|&(x, y)| rgba(&image, x, y)[0] > 128)
                .count()
        };
        assert!(lit(5..split) > 20, "H painted nothing");
        assert!(lit(split..40) > 20, "g painted nothing");
        assert_eq!(lit(0..5), 0);
    }

    #[test]
    fn png_round_trips_through_disk() {
        let mut b = builder(Arc::new(FallbackFont));
        b.push_rect(rect(0.0, 0.0, 1.0, 1.0), Color::WHITE, None);
        let image = rasterize(&b.finalize(), &ScrollState::new());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        save_png(&image, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, image);
    }
}
