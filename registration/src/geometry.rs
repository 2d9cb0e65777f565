#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in client, viewport, or content space (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Width/height pair in CSS or natural pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are strictly positive.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned rectangle in client or viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    #[must_use]
    pub fn origin(self) -> Point {
        Point::new(self.left, self.top)
    }

    #[must_use]
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bottom-centre point, where a pin marker's tip sits.
    #[must_use]
    pub fn bottom_center(self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height)
    }
}

/// A terrain point in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside lat ∈ [-90, 90], lon ∈ [-180, 180].
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A pixel in the natural (unscaled) pixel space of the overlay image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Geographic box of a registered overlay, north-west and south-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub nw: LatLon,
    pub se: LatLon,
}

impl GeoBounds {
    #[must_use]
    pub fn new(nw: LatLon, se: LatLon) -> Self {
        Self { nw, se }
    }

    /// Build bounds from `[lat, lon]` corner pairs as sent by the backend.
    #[must_use]
    pub fn from_corners(nw: [f64; 2], se: [f64; 2]) -> Option<Self> {
        let bounds = Self::new(LatLon::new(nw[0], nw[1]), LatLon::new(se[0], se[1]));
        if bounds.nw.is_valid() && bounds.se.is_valid() {
            Some(bounds)
        } else {
            None
        }
    }

    #[must_use]
    pub fn center(self) -> LatLon {
        LatLon::new((self.nw.lat + self.se.lat) / 2.0, (self.nw.lon + self.se.lon) / 2.0)
    }
}
