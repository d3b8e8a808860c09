use std::time::Duration;

use foundation::{LatLng, haversine_distance_m};
use scene::Balloon;
use serde::Serialize;

use crate::analysis::landing::project_landing_point;

/// Fraction of the original speed lost by touchdown.
pub const SPEED_DECAY: f64 = 0.7;

/// Shape of a descent animation: `steps + 1` frames spread evenly over `duration`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DescentConfig {
    pub steps: u32,
    pub duration: Duration,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            duration: Duration::from_millis(5_000),
        }
    }
}

impl DescentConfig {
    /// Keeps the default step count and stretches/shrinks the per-frame wait.
    pub fn with_frame_interval(interval: Duration) -> Self {
        let steps = Self::default().steps;
        Self {
            steps,
            duration: interval * steps,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.steps.max(1) + 1
    }

    /// Wait between two consecutive frames.
    pub fn frame_interval(&self) -> Duration {
        self.duration / self.steps.max(1)
    }
}

/// One step of a descent, as shown in the info panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationFrame {
    pub index: u32,
    pub progress: f64,
    pub position: LatLng,
    /// Feet.
    pub altitude: f64,
    /// Meters from the release point.
    pub distance_traveled: f64,
    pub elapsed_seconds: f64,
    /// Miles per hour.
    pub current_speed: f64,
    /// Set on the final frame only.
    pub landing_location: Option<LatLng>,
}

impl AnimationFrame {
    pub fn is_final(&self) -> bool {
        self.landing_location.is_some()
    }
}

/// Precomputed descent of one balloon snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DescentPath {
    origin: LatLng,
    landing: LatLng,
    altitude: f64,
    speed: f64,
    config: DescentConfig,
}

impl DescentPath {
    pub fn new(balloon: &Balloon, config: DescentConfig) -> Self {
        Self {
            origin: balloon.position(),
            landing: project_landing_point(balloon),
            altitude: balloon.altitude,
            speed: balloon.speed,
            config,
        }
    }

    pub fn origin(&self) -> LatLng {
        self.origin
    }

    pub fn landing(&self) -> LatLng {
        self.landing
    }

    pub fn config(&self) -> DescentConfig {
        self.config
    }

    /// Frame `index`, clamped to the last frame.
    pub fn frame(&self, index: u32) -> AnimationFrame {
        let steps = self.config.steps.max(1);
        let index = index.min(steps);
        let is_last = index == steps;
        let progress = if is_last {
            1.0
        } else {
            f64::from(index) / f64::from(steps)
        };

        let position = if is_last {
            self.landing
        } else {
            self.origin.lerp_wrapped(self.landing, progress)
        };

        AnimationFrame {
            index,
            progress,
            position,
            altitude: self.altitude * (1.0 - progress.sqrt()),
            distance_traveled: haversine_distance_m(self.origin, position),
            elapsed_seconds: progress * self.config.duration.as_secs_f64(),
            current_speed: self.speed * (1.0 - progress * SPEED_DECAY),
            landing_location: is_last.then_some(self.landing),
        }
    }

    pub fn frames(&self) -> impl Iterator<Item = AnimationFrame> + '_ {
        (0..=self.config.steps.max(1)).map(|i| self.frame(i))
    }
}
