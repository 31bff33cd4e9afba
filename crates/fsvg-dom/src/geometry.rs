//! Geometry
//!
//! Axis-aligned rectangle with an explicit "unset" state, used for cached,
//! rendered and removed bounds. Points and transforms come from tiny-skia.

use tiny_skia::{Point, Transform};

/// Axis-aligned rectangle stored as edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// The unset rectangle; union with it is a no-op
    pub const INVALID: Rect = Rect {
        left: f32::INFINITY,
        top: f32::INFINITY,
        right: f32::NEG_INFINITY,
        bottom: f32::NEG_INFINITY,
    };

    pub fn ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::ltrb(left, top, left + width, top + height)
    }

    /// Rectangle at the origin
    pub fn wh(width: f32, height: f32) -> Self {
        Self::ltwh(0.0, 0.0, width, height)
    }

    pub fn is_valid(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    pub fn width(&self) -> f32 {
        if self.is_valid() { self.right - self.left } else { 0.0 }
    }

    pub fn height(&self) -> f32 {
        if self.is_valid() { self.bottom - self.top } else { 0.0 }
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn origin(&self) -> (f32, f32) {
        (self.left, self.top)
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        if !other.is_valid() {
            return *self;
        }
        if !self.is_valid() {
            return *other;
        }
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Overlapping area; invalid when the rectangles do not overlap
    pub fn intersect(&self, other: &Rect) -> Rect {
        if !self.is_valid() || !other.is_valid() {
            return Rect::INVALID;
        }
        let r = Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if r.is_valid() { r } else { Rect::INVALID }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersect(other).is_valid()
    }

    /// Whether `other` lies entirely inside; an invalid `other` is never contained
    pub fn contains(&self, other: &Rect) -> bool {
        self.is_valid()
            && other.is_valid()
            && other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.is_valid() && x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// Grow by `d` on every side
    pub fn pad(&self, d: f32) -> Rect {
        if !self.is_valid() {
            return *self;
        }
        Rect::ltrb(self.left - d, self.top - d, self.right + d, self.bottom + d)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        if !self.is_valid() {
            return *self;
        }
        Rect::ltrb(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    /// Bounding box of the transformed corners
    pub fn map(&self, ts: &Transform) -> Rect {
        if !self.is_valid() {
            return *self;
        }
        if ts.is_identity() {
            return *self;
        }
        let mut pts = [
            Point::from_xy(self.left, self.top),
            Point::from_xy(self.right, self.top),
            Point::from_xy(self.right, self.bottom),
            Point::from_xy(self.left, self.bottom),
        ];
        ts.map_points(&mut pts);
        let mut r = Rect::INVALID;
        for p in pts {
            r = r.union(&Rect::ltrb(p.x, p.y, p.x, p.y));
        }
        r
    }

    pub fn to_skia(&self) -> Option<tiny_skia::Rect> {
        if !self.is_valid() {
            return None;
        }
        tiny_skia::Rect::from_ltrb(self.left, self.top, self.right, self.bottom)
    }

    pub fn from_skia(r: tiny_skia::Rect) -> Self {
        Rect::ltrb(r.left(), r.top(), r.right(), r.bottom())
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::INVALID
    }
}

/// Geometric mean of the transform's axis scales
pub fn avg_scale(ts: &Transform) -> f32 {
    (ts.sx * ts.sy - ts.kx * ts.ky).abs().sqrt()
}
