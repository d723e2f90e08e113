use crate::error::Result;
use crate::geom::{LatLng, ScreenPoint};

/// Geographic ↔ pixel mapping supplied by the host map for its current viewport state.
///
/// Implementations are assumed pure and cheap for the duration of a tick. A host whose map is
/// not ready yet returns [`crate::Error::ProjectionUnavailable`]; the solver then skips the tick.
pub trait Projection {
    fn project(&self, coord: LatLng) -> Result<ScreenPoint>;

    fn unproject(&self, pixel: ScreenPoint) -> Result<LatLng>;
}

impl<P: Projection + ?Sized> Projection for &P {
    fn project(&self, coord: LatLng) -> Result<ScreenPoint> {
        (**self).project(coord)
    }

    fn unproject(&self, pixel: ScreenPoint) -> Result<LatLng> {
        (**self).unproject(pixel)
    }
}
