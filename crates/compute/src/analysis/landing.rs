use foundation::{BalloonId, LatLng, METERS_PER_MILE, destination_point};
use scene::Balloon;
use serde::Serialize;

/// How long a balloon is assumed to keep drifting before it comes down.
pub const LANDING_HORIZON_HOURS: f64 = 1.0;

/// Where `balloon` lands after drifting for [`LANDING_HORIZON_HOURS`] at its
/// current speed and heading along a great circle.
///
/// A stationary balloon lands where it is.
pub fn project_landing_point(balloon: &Balloon) -> LatLng {
    project_after_hours(balloon, LANDING_HORIZON_HOURS)
}

pub fn project_after_hours(balloon: &Balloon, hours: f64) -> LatLng {
    let distance_m = balloon.speed * METERS_PER_MILE * hours;
    destination_point(balloon.position(), balloon.direction, distance_m)
}

/// Origin-to-landing segment drawn for each balloon on the live map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub id: BalloonId,
    pub origin: LatLng,
    pub landing: LatLng,
    pub heading: f64,
}

pub fn trajectories(balloons: &[Balloon]) -> Vec<Trajectory> {
    balloons
        .iter()
        .map(|b| Trajectory {
            id: b.id.clone(),
            origin: b.position(),
            landing: project_landing_point(b),
            heading: b.direction,
        })
        .collect()
}
