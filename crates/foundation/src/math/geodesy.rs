use serde::{Deserialize, Serialize};

use crate::GeoError;

/// Mean Earth radius used by all spherical formulas (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Statute mile in meters.
pub const METERS_PER_MILE: f64 = 1_609.344;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a position, rejecting non-finite or out-of-range values.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        let p = Self { lat, lng };
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(GeoError::NonFiniteCoordinate {
                lat: self.lat,
                lng: self.lng,
            });
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(GeoError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(GeoError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    /// Linear interpolation in degree space (not along the geodesic).
    pub fn lerp(self, to: LatLng, t: f64) -> LatLng {
        LatLng::new(
            self.lat + (to.lat - self.lat) * t,
            self.lng + (to.lng - self.lng) * t,
        )
    }

    /// Like [`LatLng::lerp`], but takes the shorter way around in longitude
    /// and wraps the result, so a path over the antimeridian stays short.
    pub fn lerp_wrapped(self, to: LatLng, t: f64) -> LatLng {
        let unwrapped = LatLng::new(to.lat, self.lng + wrap_longitude(to.lng - self.lng));
        let p = self.lerp(unwrapped, t);
        LatLng::new(p.lat, wrap_longitude(p.lng))
    }
}

/// Wraps a longitude into `[-180, 180]`. Values already in range are returned untouched.
pub fn wrap_longitude(lng_deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng_deg) {
        return lng_deg;
    }
    (lng_deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Normalizes a finite heading into `[0, 360)`.
pub fn normalize_heading(deg: f64) -> f64 {
    let h = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if h >= 360.0 { 0.0 } else { h }
}

/// Spherical direct problem: the point reached after travelling `distance_m`
/// from `origin` along a great circle with initial bearing `bearing_deg`.
pub fn destination_point(origin: LatLng, bearing_deg: f64, distance_m: f64) -> LatLng {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lng.to_radians();

    let sin_phi2 =
        (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).clamp(-1.0, 1.0);
    let phi2 = sin_phi2.asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    LatLng::new(phi2.to_degrees(), wrap_longitude(lambda2.to_degrees()))
}

/// Great-circle distance in meters (haversine).
pub fn haversine_distance_m(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().clamp(0.0, 1.0).asin()
}
