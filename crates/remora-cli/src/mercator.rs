use remora::{Error, LatLng, Projection, Result, ScreenPoint, point};
use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;

/// Latitude at which the Web-Mercator world becomes square.
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Spherical Web-Mercator viewport, pixel origin at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    center: LatLng,
    zoom: f64,
    width: f64,
    height: f64,
}

impl WebMercator {
    pub fn new(center: LatLng, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn with_zoom(self, zoom: f64) -> Self {
        Self { zoom, ..self }
    }

    fn is_ready(&self) -> bool {
        self.zoom.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && self.center.is_valid()
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    fn to_world(&self, coord: LatLng) -> (f64, f64) {
        let size = self.world_size();
        let lat = coord.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (coord.lng + 180.0) / 360.0 * size;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
        (x, y)
    }

    fn top_left(&self) -> (f64, f64) {
        let (cx, cy) = self.to_world(self.center);
        (cx - self.width / 2.0, cy - self.height / 2.0)
    }
}

impl Projection for WebMercator {
    fn project(&self, coord: LatLng) -> Result<ScreenPoint> {
        if !self.is_ready() || !coord.is_valid() {
            return Err(Error::ProjectionUnavailable);
        }
        let (x, y) = self.to_world(coord);
        let (ox, oy) = self.top_left();
        Ok(point(x - ox, y - oy))
    }

    fn unproject(&self, pixel: ScreenPoint) -> Result<LatLng> {
        if !self.is_ready() || !pixel.x.is_finite() || !pixel.y.is_finite() {
            return Err(Error::ProjectionUnavailable);
        }
        let size = self.world_size();
        let (ox, oy) = self.top_left();
        let x = pixel.x + ox;
        let y = pixel.y + oy;
        let lng = x / size * 360.0 - 180.0;
        let n = PI - 2.0 * PI * y / size;
        let lat = n.sinh().atan().to_degrees();
        Ok(LatLng::new(lat, lng))
    }
}
