use foundation::{LatLng, haversine_distance_m};

/// Points for a perfect guess.
pub const MAX_ROUND_SCORE: u32 = 5_000;
/// Points lost per kilometer of error.
pub const POINTS_PER_KM: f64 = 2.0;

pub fn guess_distance_km(guess: LatLng, actual: LatLng) -> f64 {
    haversine_distance_m(guess, actual) / 1_000.0
}

/// `max(5000 - floor(km * 2), 0)`.
pub fn score_guess(distance_km: f64) -> u32 {
    let lost = (distance_km.max(0.0) * POINTS_PER_KM).floor();
    (f64::from(MAX_ROUND_SCORE) - lost).max(0.0) as u32
}
