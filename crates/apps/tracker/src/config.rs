use std::env;
use std::time::Duration;

use compute::{DEFAULT_CLUSTER_THRESHOLD_PX, DescentConfig};

/// Runtime settings: environment first, command-line flags on top.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub seed: u64,
    pub balloons: usize,
    pub frame_ms: u64,
    pub cluster_threshold_px: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            balloons: 10,
            frame_ms: 50,
            cluster_threshold_px: DEFAULT_CLUSTER_THRESHOLD_PX,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            seed: env_var_u64("TRACKER_SEED", defaults.seed),
            balloons: env_var_usize("TRACKER_BALLOONS", defaults.balloons),
            frame_ms: env_var_u64("TRACKER_FRAME_MS", defaults.frame_ms),
            cluster_threshold_px: env_var_f64("TRACKER_CLUSTER_PX", defaults.cluster_threshold_px),
        }
    }

    pub fn descent(&self) -> DescentConfig {
        DescentConfig::with_frame_interval(Duration::from_millis(self.frame_ms))
    }
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::TrackerConfig;
    use std::time::Duration;

    #[test]
    fn default_descent_is_five_seconds() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.descent().duration, Duration::from_millis(5_000));
        assert_eq!(cfg.descent().steps, 100);
    }
}
