use super::{LatLng, Vec2};

/// Side length of one map tile in pixels.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Maps a geographic position to pixel coordinates at a zoom level.
///
/// The live map supplies its own projection; anything with the same shape
/// (including a plain closure) can stand in for it.
pub trait PixelProjector {
    fn project(&self, position: LatLng, zoom: f64) -> Vec2;
}

impl<F> PixelProjector for F
where
    F: Fn(LatLng, f64) -> Vec2,
{
    fn project(&self, position: LatLng, zoom: f64) -> Vec2 {
        self(position, zoom)
    }
}

/// Spherical Web Mercator in world-pixel space (origin at the north-west corner).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct WebMercator;

impl PixelProjector for WebMercator {
    fn project(&self, position: LatLng, zoom: f64) -> Vec2 {
        let scale = TILE_SIZE_PX * zoom.exp2();
        // Clamp just short of the poles, where y diverges.
        let sin_lat = position.lat.to_radians().sin().clamp(-0.9999, 0.9999);
        let x = (position.lng + 180.0) / 360.0;
        let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * std::f64::consts::PI);
        Vec2::new(x * scale, y * scale)
    }
}
