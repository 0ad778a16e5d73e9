use crate::stage::frame::Frame;
use crate::stage::layout::StageLayout;
use image::{Rgb, RgbImage};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Position of one LED in normalized stage space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagePoint {
    /// Horizontal position in `[0, 1]`.
    pub x: f64,
    /// Vertical position in `[0, 1]`.
    pub y: f64,
    /// Tangential angle in radians (perpendicular to the strip direction).
    pub angle: f64,
}

/// Linear pixel index -> physical position lookup.
#[derive(Debug, Clone)]
pub struct StageMap {
    layout: StageLayout,
    points: Vec<StagePoint>,
}

impl StageMap {
    /// Derive the map from installation constants.
    pub fn new(layout: StageLayout) -> Self {
        let strips = layout.strips.max(1) as usize;
        let per_strip = layout.pixels_per_strip as usize;
        let inner = layout.inner_radius_ratio.clamp(0.0, 1.0);

        let mut points = Vec::with_capacity(layout.pixel_count());
        for strip in 0..strips {
            let theta = TAU * strip as f64 / strips as f64;
            for px in 0..per_strip {
                let t = if per_strip > 1 {
                    px as f64 / (per_strip - 1) as f64
                } else {
                    0.0
                };
                let r = inner + (1.0 - inner) * t;
                points.push(StagePoint {
                    x: 0.5 + 0.5 * r * theta.cos(),
                    y: 0.5 + 0.5 * r * theta.sin(),
                    angle: (theta + FRAC_PI_2).rem_euclid(TAU),
                });
            }
        }
        Self { layout, points }
    }

    /// Geometry this map was derived from.
    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    /// Position of the LED at linear pixel `index`.
    pub fn point(&self, index: usize) -> Option<StagePoint> {
        self.points.get(index).copied()
    }

    /// All positions in buffer order.
    pub fn points(&self) -> &[StagePoint] {
        &self.points
    }

    /// Plot `frame` onto a square preview image, one small dot per LED.
    pub fn render_preview(&self, frame: &Frame, size: u32) -> RgbImage {
        let size = size.max(1);
        let mut img = RgbImage::new(size, size);
        let max = f64::from(size - 1);
        let dot = i64::from((size / 256).max(1));

        for (p, px) in self.points.iter().zip(frame.pixels()) {
            let cx = (p.x * max).round() as i64;
            let cy = (p.y * max).round() as i64;
            for dy in -dot..=dot {
                for dx in -dot..=dot {
                    let (x, y) = (cx + dx, cy + dy);
                    if x < 0 || y < 0 || x >= i64::from(size) || y >= i64::from(size) {
                        continue;
                    }
                    img.put_pixel(x as u32, y as u32, Rgb(px));
                }
            }
        }
        img
    }
}
