//! Geometry primitives shared by all layout algorithms.
//!
//! `Rect` is center-anchored: the center is the vertex position and the
//! extents are half the vertex size. Clipping points are computed against the
//! rectangle boundary so edges and forces attach to the border, not the
//! center.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Half of the box diagonal, used by the circular layout as the space a
    /// vertex occupies along the circle.
    pub fn half_diagonal(&self) -> f64 {
        self.width.hypot(self.height) / 2.0
    }

    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub center: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(center: Point, size: Size) -> Self {
        Self { center, size }
    }

    pub fn half_width(&self) -> f64 {
        self.size.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.size.height / 2.0
    }

    pub fn left(&self) -> f64 {
        self.center.x - self.half_width()
    }

    pub fn right(&self) -> f64 {
        self.center.x + self.half_width()
    }

    pub fn top(&self) -> f64 {
        self.center.y - self.half_height()
    }

    pub fn bottom(&self) -> f64 {
        self.center.y + self.half_height()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::from_bounds(left, top, right, bottom)
    }

    pub fn from_bounds(left: f64, top: f64, right: f64, bottom: f64) -> Rect {
        Rect {
            center: Point::new((left + right) / 2.0, (top + bottom) / 2.0),
            size: Size::new((right - left).max(0.0), (bottom - top).max(0.0)),
        }
    }

    /// Grows the rectangle by `dx` on the left and right sides and `dy` on the
    /// top and bottom sides. Negative amounts shrink it (never below zero
    /// size).
    pub fn inflate(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            center: self.center,
            size: Size::new(
                (self.size.width + 2.0 * dx).max(0.0),
                (self.size.height + 2.0 * dy).max(0.0),
            ),
        }
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Nearest point inside the rectangle to `p`.
    pub fn clamp_point(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.left(), self.right()),
            p.y.clamp(self.top(), self.bottom()),
        )
    }

    /// The point where the segment from this rectangle's center towards
    /// `target` crosses the rectangle boundary.
    ///
    /// When `target` coincides with the center there is no direction to clip
    /// along; the center itself is returned so callers never see NaN.
    pub fn clip_point_towards(&self, target: Point) -> Point {
        let dx = target.x - self.center.x;
        let dy = target.y - self.center.y;

        if dx == 0.0 && dy == 0.0 {
            return self.center;
        }

        let mut t_x = f64::INFINITY;
        let mut t_y = f64::INFINITY;
        if dx != 0.0 {
            t_x = (self.half_width() / dx.abs()).max(0.0);
        }
        if dy != 0.0 {
            t_y = (self.half_height() / dy.abs()).max(0.0);
        }
        let t = t_x.min(t_y);
        Point::new(self.center.x + t * dx, self.center.y + t * dy)
    }

    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.size.is_finite()
    }

    pub fn area(&self) -> f64 {
        self.size.width * self.size.height
    }
}

/// Boundary-to-boundary distance between two rectangles along the line
/// connecting their centers: the distance between the two facing clip points,
/// or zero when the rectangles intersect.
pub fn clipped_distance(a: &Rect, b: &Rect) -> f64 {
    if a.intersects(b) {
        return 0.0;
    }
    let pa = a.clip_point_towards(b.center);
    let pb = b.clip_point_towards(a.center);
    pa.distance_to(pb)
}
