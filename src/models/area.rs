use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of the surface points are captured on.
pub const SURFACE_WIDTH: u32 = 640;
/// Height of the surface points are captured on.
pub const SURFACE_HEIGHT: u32 = 360;

/// Number of points in a committed region of interest.
pub const AREA_POINTS: usize = 4;

/// A click position on the capture surface, origin top-left.
///
/// Travels on the wire as a two-element array `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn within_surface(&self) -> bool {
        self.x <= SURFACE_WIDTH && self.y <= SURFACE_HEIGHT
    }
}

impl From<(u32, u32)> for Point {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (u32, u32) {
    fn from(point: Point) -> Self {
        (point.x, point.y)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("an area holds at most {} points, got {}", AREA_POINTS, .0)]
pub struct TooManyPoints(pub usize);

/// Quadrilateral region of interest, in click order.
///
/// Never holds more than [`AREA_POINTS`] points. Order is kept as entered
/// since it defines the winding used downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct AreaPolygon {
    points: Vec<Point>,
}

impl AreaPolygon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `point` unless the polygon is already complete. Returns
    /// whether the point was taken.
    pub fn push(&mut self, point: Point) -> bool {
        if self.is_complete() {
            return false;
        }
        self.points.push(point);
        true
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() == AREA_POINTS
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Builds a polygon from an untrusted list, keeping at most the first
    /// four points.
    pub fn truncated(mut points: Vec<Point>) -> Self {
        points.truncate(AREA_POINTS);
        Self { points }
    }
}

impl TryFrom<Vec<Point>> for AreaPolygon {
    type Error = TooManyPoints;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        if points.len() > AREA_POINTS {
            return Err(TooManyPoints(points.len()));
        }
        Ok(Self { points })
    }
}

impl From<AreaPolygon> for Vec<Point> {
    fn from(area: AreaPolygon) -> Self {
        area.points
    }
}
