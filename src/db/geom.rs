// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Integer geometry in database units

use serde::{Deserialize, Serialize};

use crate::utils::EnumStr;

pub type Int = i32;

/// Point in database units
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: Int,
    pub y: Int,
}

impl Point {
    pub fn new(x: Int, y: Int) -> Self {
        Self { x, y }
    }

    /// Point shifted by `p`
    pub fn shift(&self, p: &Point) -> Point {
        Point::new(self.x + p.x, self.y + p.y)
    }

    /// Point moved by the rotation/mirror of `orient` about the origin
    pub fn orient(&self, orient: Orient) -> Point {
        let (x, y) = (self.x, self.y);
        match orient {
            Orient::R0 => Point::new(x, y),
            Orient::R90 => Point::new(-y, x),
            Orient::R180 => Point::new(-x, -y),
            Orient::R270 => Point::new(y, -x),
            Orient::MY => Point::new(-x, y),
            Orient::MYR90 => Point::new(-y, -x),
            Orient::MX => Point::new(x, -y),
            Orient::MXR90 => Point::new(y, x),
        }
    }
}

/// Axis-aligned rectangle.
///
/// Always stored with `xl <= xh` and `yl <= yh`.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub xl: Int,
    pub yl: Int,
    pub xh: Int,
    pub yh: Int,
}

impl Rect {
    /// Create from any two opposite corners
    pub fn new(x0: Int, y0: Int, x1: Int, y1: Int) -> Self {
        Self {
            xl: x0.min(x1),
            yl: y0.min(y1),
            xh: x0.max(x1),
            yh: y0.max(y1),
        }
    }

    pub fn from_points(p0: Point, p1: Point) -> Self {
        Self::new(p0.x, p0.y, p1.x, p1.y)
    }

    /// Bounding box of a point set, `None` when empty
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Rect::new(first.x, first.y, first.x, first.y);
        Some(points.iter().fold(init, |r, p| Rect {
            xl: r.xl.min(p.x),
            yl: r.yl.min(p.y),
            xh: r.xh.max(p.x),
            yh: r.yh.max(p.y),
        }))
    }

    pub fn width(&self) -> Int {
        self.xh - self.xl
    }

    pub fn height(&self) -> Int {
        self.yh - self.yl
    }

    /// Rectangle placed with `orient` and then moved to `origin`
    pub fn place(&self, orient: Orient, origin: Point) -> Rect {
        let p0 = Point::new(self.xl, self.yl).orient(orient).shift(&origin);
        let p1 = Point::new(self.xh, self.yh).orient(orient).shift(&origin);
        Rect::from_points(p0, p1)
    }
}

/// Closed polygon, closure from last to first point implied
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

/// Blockage and fill geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
}

crate::enumstr!(
    /// Database orientation: rotations and their mirrored forms
    Orient {
        R0: "R0",
        R90: "R90",
        R180: "R180",
        R270: "R270",
        MY: "MY",
        MYR90: "MYR90",
        MX: "MX",
        MXR90: "MXR90",
    }
);

impl Default for Orient {
    fn default() -> Self {
        Self::R0
    }
}

impl Orient {
    pub const ALL: [Orient; 8] = [
        Orient::R0,
        Orient::R90,
        Orient::R180,
        Orient::R270,
        Orient::MY,
        Orient::MYR90,
        Orient::MX,
        Orient::MXR90,
    ];

    pub fn name(&self) -> &'static str {
        self.to_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_corners() {
        let r = Rect::new(10, 20, -5, 0);
        assert_eq!(r, Rect { xl: -5, yl: 0, xh: 10, yh: 20 });
        assert_eq!(r.width(), 15);
        assert_eq!(r.height(), 20);
    }

    #[test]
    fn test_bounding_box() {
        let pts = [Point::new(0, 0), Point::new(100, 0), Point::new(50, 80)];
        assert_eq!(Rect::bounding(&pts), Some(Rect::new(0, 0, 100, 80)));
        assert_eq!(Rect::bounding(&[]), None);
    }

    #[test]
    fn test_orient_rotations() {
        let p = Point::new(10, 2);
        assert_eq!(p.orient(Orient::R90), Point::new(-2, 10));
        assert_eq!(p.orient(Orient::R180), Point::new(-10, -2));
        assert_eq!(p.orient(Orient::MX), Point::new(10, -2));
        assert_eq!(p.orient(Orient::MXR90), Point::new(2, 10));
    }

    #[test]
    fn test_rect_place() {
        let r = Rect::new(-10, -20, 10, 20);
        assert_eq!(
            r.place(Orient::R90, Point::new(100, 100)),
            Rect::new(80, 90, 120, 110)
        );
    }
}
