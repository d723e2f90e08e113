use serde::{Deserialize, Serialize};

/// Viewport pixel space: origin at the top-left of the map container, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScreenSpace;

pub type ScreenPoint = euclid::Point2D<f64, ScreenSpace>;
pub type ScreenVector = euclid::Vector2D<f64, ScreenSpace>;

pub fn point(x: f64, y: f64) -> ScreenPoint {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> ScreenVector {
    euclid::vec2(x, y)
}

pub(crate) fn is_finite(p: ScreenPoint) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Geographic coordinate in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}
