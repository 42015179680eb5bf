// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout-space geometry and colour primitives.
//
// All coordinates are logical pixels with the origin at the top-left corner
// and y growing downwards.

use serde::{Deserialize, Serialize};

/// A position in layout space.
pub type Point = euclid::default::Point2D<f32>;
/// A displacement in layout space.
pub type Vector = euclid::default::Vector2D<f32>;
pub type Size = euclid::default::Size2D<f32>;
/// Axis-aligned rectangle described by its top-left corner and size.
///
/// `contains` is half-open: the right and bottom edges are outside.
pub type Rect = euclid::default::Rect<f32>;

/// Rectangle from its top-left corner and size.
pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Rect {
    Rect::new(Point::new(x, y), Size::new(width, height))
}

/// Straight (non-premultiplied) RGBA colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build a colour from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Quantise to 8-bit channels.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = rect(10.0, 10.0, 5.0, 5.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(14.9, 14.9)));
        assert!(!r.contains(Point::new(15.0, 12.0)));
        assert!(!r.contains(Point::new(9.9, 12.0)));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), None);

        let c = rect(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&c), Some(rect(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn rgba8_round_trips_exact_channels() {
        let c = Color::from_rgba8(255, 128, 0, 64);
        assert_eq!(c.to_rgba8(), [255, 128, 0, 64]);
        assert!(!c.is_transparent());
        assert!(Color::TRANSPARENT.is_transparent());
    }

    #[test]
    fn color_defaults_to_transparent() {
        assert_eq!(Color::default(), Color::TRANSPARENT);
    }
}
