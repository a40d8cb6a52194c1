//! Screen rectangles and frame matching.

use serde::{Deserialize, Serialize};

/// Frames closer than this on every axis describe the same window.
pub const FRAME_TOLERANCE: f64 = 2.0;

/// Axis-aligned rectangle in screen points, top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether `self` and `other` describe the same window: every one of
    /// x, y, width, height differs by strictly less than [`FRAME_TOLERANCE`].
    pub fn approx_eq(&self, other: &Rect) -> bool {
        (self.x - other.x).abs() < FRAME_TOLERANCE
            && (self.y - other.y).abs() < FRAME_TOLERANCE
            && (self.width - other.width).abs() < FRAME_TOLERANCE
            && (self.height - other.height).abs() < FRAME_TOLERANCE
    }

    /// Grow (positive `by`) or shrink the rect equally on every side.
    #[must_use]
    pub fn outset(&self, by: f64) -> Rect {
        Rect {
            x: self.x - by,
            y: self.y - by,
            width: (self.width + 2.0 * by).max(0.0),
            height: (self.height + 2.0 * by).max(0.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Convert from top-left origin to bottom-left origin on a screen of
    /// `screen_height` (the primary display's height).
    #[must_use]
    pub fn flipped(&self, screen_height: f64) -> Rect {
        Rect {
            y: screen_height - self.y - self.height,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_tolerance_matches() {
        let a = Rect::new(100.0, 50.0, 800.0, 600.0);
        let b = Rect::new(101.9, 48.1, 801.5, 598.5);
        assert!(a.approx_eq(&b));
        assert!(b.approx_eq(&a));
    }

    #[test]
    fn two_units_on_any_axis_does_not_match() {
        let a = Rect::new(100.0, 50.0, 800.0, 600.0);
        assert!(!a.approx_eq(&Rect::new(102.0, 50.0, 800.0, 600.0)));
        assert!(!a.approx_eq(&Rect::new(100.0, 52.0, 800.0, 600.0)));
        assert!(!a.approx_eq(&Rect::new(100.0, 50.0, 798.0, 600.0)));
        assert!(!a.approx_eq(&Rect::new(100.0, 50.0, 800.0, 602.5)));
    }

    #[test]
    fn outset_grows_all_sides() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0).outset(8.0);
        assert_eq!(r, Rect::new(2.0, 2.0, 116.0, 66.0));
        assert_eq!(r.right(), 118.0);
        assert_eq!(r.bottom(), 68.0);
    }

    #[test]
    fn flip_to_bottom_left_origin() {
        let r = Rect::new(0.0, 100.0, 300.0, 200.0).flipped(1000.0);
        assert_eq!(r.y, 700.0);
        assert_eq!(r.height, 200.0);
    }
}
