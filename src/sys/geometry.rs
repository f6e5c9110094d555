//! Plain rectangle math in physical pixels.
//!
//! The y axis grows downward, so a rect's `min_y` is its top edge.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn distance_to(&self, other: Point) -> f64 { (other.x - self.x).hypot(other.y - self.y) }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point { Point::new(self.x + rhs.x, self.y + rhs.y) }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point { Point::new(self.x - rhs.x, self.y - rhs.y) }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    #[inline]
    pub fn min_x(&self) -> f64 { self.origin.x }

    #[inline]
    pub fn min_y(&self) -> f64 { self.origin.y }

    #[inline]
    pub fn max_x(&self) -> f64 { self.origin.x + self.size.width }

    #[inline]
    pub fn max_y(&self) -> f64 { self.origin.y + self.size.height }

    pub fn mid(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    /// Length of the shared span on the x axis. Zero or negative when the
    /// rects do not overlap horizontally.
    pub fn horizontal_overlap(&self, other: &Rect) -> f64 {
        self.max_x().min(other.max_x()) - self.min_x().max(other.min_x())
    }

    /// Length of the shared span on the y axis. Zero or negative when the
    /// rects do not overlap vertically.
    pub fn vertical_overlap(&self, other: &Rect) -> f64 {
        self.max_y().min(other.max_y()) - self.min_y().max(other.min_y())
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.horizontal_overlap(other);
        let h = self.vertical_overlap(other);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_non_positive_for_disjoint_rects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(150.0, 0.0, 50.0, 50.0);
        assert!(a.horizontal_overlap(&b) <= 0.0);
        assert_eq!(a.vertical_overlap(&b), 50.0);
        assert_eq!(a.intersection_area(&b), 0.0);
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(100.0, 0.0, 100.0, 100.0);
        assert_eq!(a.horizontal_overlap(&b), 0.0);
    }

    #[test]
    fn point_distance() {
        assert_eq!(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0);
    }
}
