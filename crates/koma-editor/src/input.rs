//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and stylus events from the host into a
//! `PointerEvent` in DOM pixel coordinates. Coordinate translation into
//! canvas space happens later, inside target resolution — the overlay
//! layer is hit-tested in DOM space first.

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };
}

/// A normalized pointer event, positioned in DOM pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self { x, y, modifiers }
    }

    pub fn position(&self) -> koma_core::Point {
        koma_core::Point::new(self.x, self.y)
    }
}
