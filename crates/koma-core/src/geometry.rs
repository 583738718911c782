//! Coordinate translation between DOM pixel space and canvas space.
//!
//! The canvas layer can be panned and zoomed independently of the DOM
//! overlay, so pointer events arriving in DOM pixels must be mapped into
//! canvas coordinates before hit-testing canvas elements. Everything here
//! is a pure function of the current `ViewTransform`; the host rebuilds
//! the transform whenever pan or zoom changes.

use serde::{Deserialize, Serialize};

/// A point in either coordinate space (the space is contextual).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// AABB overlap test.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// The canvas pan/zoom state relative to the DOM overlay.
///
/// DOM → canvas: subtract pan, divide by zoom. Zoom is clamped away from
/// zero on construction so the inverse is always defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub pan_x: f32,
    pub pan_y: f32,
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new(pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        Self {
            pan_x,
            pan_y,
            zoom: zoom.max(f32::EPSILON),
        }
    }

    /// Map a DOM-pixel point into canvas coordinates.
    pub fn dom_to_canvas(&self, p: Point) -> Point {
        Point::new((p.x - self.pan_x) / self.zoom, (p.y - self.pan_y) / self.zoom)
    }

    /// Map a canvas point back into DOM pixels.
    pub fn canvas_to_dom(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan_x, p.y * self.zoom + self.pan_y)
    }

    /// Adjust an event the canvas renderer already pan-compensated but
    /// reported in screen pixels: only the zoom factor remains.
    pub fn adjust_canvas_point(&self, p: Point) -> Point {
        Point::new(p.x / self.zoom, p.y / self.zoom)
    }
}
