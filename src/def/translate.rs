// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Pure conversions from DEF values to database values

use thiserror::Error;

use super::{DefOrient, DefPath, DefPlacementStatus, DefPoint, DefRect, PathToken};
use crate::db::{Int, Orient, PlacementStatus, Point, Rect};

/// DEF distance units to database units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    factor: f64,
}

impl Default for UnitScale {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl UnitScale {
    pub fn new(dbu_per_micron: u32, def_units: f64) -> Self {
        Self {
            factor: f64::from(dbu_per_micron) / def_units,
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn dbdist(&self, value: i32) -> Int {
        (f64::from(value) * self.factor).round() as Int
    }

    /// Scale a real-valued distance
    pub fn dbdist_f(&self, value: f64) -> Int {
        (value * self.factor).round() as Int
    }

    pub fn point(&self, p: DefPoint) -> Point {
        Point::new(self.dbdist(p.x), self.dbdist(p.y))
    }

    /// Rectangle with normalized corners
    pub fn rect(&self, r: &DefRect) -> Rect {
        Rect::new(
            self.dbdist(r.xl),
            self.dbdist(r.yl),
            self.dbdist(r.xh),
            self.dbdist(r.yh),
        )
    }
}

pub fn translate_orientation(orient: DefOrient) -> Orient {
    match orient {
        DefOrient::N => Orient::R0,
        DefOrient::W => Orient::R90,
        DefOrient::S => Orient::R180,
        DefOrient::E => Orient::R270,
        DefOrient::FN => Orient::MY,
        DefOrient::FE => Orient::MYR90,
        DefOrient::FS => Orient::MX,
        DefOrient::FW => Orient::MXR90,
    }
}

pub fn def_orientation(orient: Orient) -> DefOrient {
    match orient {
        Orient::R0 => DefOrient::N,
        Orient::R90 => DefOrient::W,
        Orient::R180 => DefOrient::S,
        Orient::R270 => DefOrient::E,
        Orient::MY => DefOrient::FN,
        Orient::MYR90 => DefOrient::FE,
        Orient::MX => DefOrient::FS,
        Orient::MXR90 => DefOrient::FW,
    }
}

pub fn translate_placement(status: DefPlacementStatus) -> PlacementStatus {
    match status {
        DefPlacementStatus::Fixed => PlacementStatus::Firm,
        DefPlacementStatus::Placed => PlacementStatus::Placed,
        DefPlacementStatus::Cover => PlacementStatus::Cover,
        DefPlacementStatus::Unplaced => PlacementStatus::Unplaced,
    }
}

/// Points in source order, scaled to database units
pub fn translate_points(points: &[DefPoint], scale: &UnitScale) -> Vec<Point> {
    points.iter().map(|p| scale.point(*p)).collect()
}

/// How a die area was derived from its points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DieAreaNote {
    /// Two corners
    Rect,
    /// Polygon outline replaced by its bounding box
    BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DieAreaError {
    #[error("Invalid DIEAREA statement, missing point(s)")]
    MissingPoints(usize),
}

pub fn die_area(points: &[Point]) -> Result<(Rect, DieAreaNote), DieAreaError> {
    match points {
        [] | [_] => Err(DieAreaError::MissingPoints(points.len())),
        [p0, p1] => Ok((Rect::from_points(*p0, *p1), DieAreaNote::Rect)),
        _ => match Rect::bounding(points) {
            Some(r) => Ok((r, DieAreaNote::BoundingBox)),
            None => Err(DieAreaError::MissingPoints(0)),
        },
    }
}

/// Rectangle corner offsets relative to an anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deltas {
    pub dx1: Int,
    pub dy1: Int,
    pub dx2: Int,
    pub dy2: Int,
}

/// A path made of exactly one layer, one point and one rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectPath<'a> {
    pub layer: &'a str,
    pub anchor: DefPoint,
    pub rect: DefRect,
}

/// Match the single-rectangle path shape, in any token order
pub fn is_rect_path(path: &DefPath) -> Option<RectPath<'_>> {
    let mut layer = None;
    let mut anchor = None;
    let mut rect = None;
    for token in &path.tokens {
        match token {
            PathToken::Layer(name) if layer.is_none() => layer = Some(name.as_str()),
            PathToken::Point(p) if anchor.is_none() => anchor = Some(*p),
            PathToken::Rect(r) if rect.is_none() => rect = Some(*r),
            _ => return None,
        }
    }
    Some(RectPath {
        layer: layer?,
        anchor: anchor?,
        rect: rect?,
    })
}

/// Two-point centerline equivalent to a minimum-width rectangle.
///
/// The rectangle must span exactly `min_width` across one axis and be
/// centered on `anchor` along that axis. The returned endpoints are pulled in
/// by half the width so the default extension restores the original extent.
pub fn rect_path_points(anchor: Point, d: Deltas, min_width: Int) -> Option<(Point, Point)> {
    let ext = min_width / 2;
    if d.dx2 - d.dx1 == min_width {
        // vertical
        if -d.dx1 != d.dx2 {
            return None;
        }
        Some((
            Point::new(anchor.x, anchor.y + d.dy1 + ext),
            Point::new(anchor.x, anchor.y + d.dy2 - ext),
        ))
    } else if d.dy2 - d.dy1 == min_width {
        // horizontal
        if -d.dy1 != d.dy2 {
            return None;
        }
        Some((
            Point::new(anchor.x + d.dx1 + ext, anchor.y),
            Point::new(anchor.x + d.dx2 - ext, anchor.y),
        ))
    } else {
        None
    }
}
