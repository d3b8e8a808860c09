use compute::{guess_distance_km, score_guess};
use foundation::{GeoError, LatLng};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::panorama::{PanoramaProvider, PanoramaRequest};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GameConfig {
    pub rounds: u32,
    /// Targets are drawn from `[-lat_limit, lat_limit]`; street-level coverage
    /// near the poles is too sparse to be worth probing.
    pub lat_limit: f64,
    /// How far from a random point a panorama may be and still count.
    pub lookup_radius_m: f64,
    /// Random points probed per target before giving up.
    pub max_attempts: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rounds: 5,
            lat_limit: 70.0,
            lookup_radius_m: 50_000.0,
            max_attempts: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("the game is over")]
    Finished,
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] GeoError),
    #[error("round {0} has no target yet")]
    NoTarget(u32),
    #[error("round {0} has already been guessed")]
    AlreadyGuessed(u32),
    #[error("round {0} has not been guessed yet")]
    NotGuessed(u32),
}

pub fn random_location<R: Rng + ?Sized>(rng: &mut R, lat_limit: f64) -> LatLng {
    let lat_limit = lat_limit.clamp(0.0, 90.0);
    LatLng::new(
        rng.gen_range(-lat_limit..=lat_limit),
        rng.gen_range(-180.0..=180.0),
    )
}

/// Draws random points until one has a panorama within the lookup radius.
///
/// Every attempt uses a fresh point. Returns the panorama's own location, or
/// `None` after `max_attempts` misses or a provider failure.
pub async fn find_playable_location<P, R>(
    provider: &P,
    rng: &mut R,
    config: &GameConfig,
) -> Option<LatLng>
where
    P: PanoramaProvider + ?Sized,
    R: Rng + ?Sized,
{
    for attempt in 1..=config.max_attempts {
        let location = random_location(rng, config.lat_limit);
        let request = PanoramaRequest {
            location,
            radius_m: config.lookup_radius_m,
        };
        match provider.nearest(request).await {
            Ok(Some(pano)) => {
                debug!(attempt, pano = %pano.pano_id, "playable location found");
                return Some(pano.location);
            }
            Ok(None) => debug!(attempt, ?location, "no coverage near candidate"),
            Err(err) => {
                warn!("panorama provider failed: {err}");
                return None;
            }
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub round: u32,
    pub target: LatLng,
    pub guess: LatLng,
    pub distance_km: f64,
    pub points: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RoundPhase {
    Guessing,
    Revealed,
}

/// Score keeping for the location-guessing game.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    round: u32,
    phase: RoundPhase,
    target: Option<LatLng>,
    score: u32,
    results: Vec<RoundResult>,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            round: 1,
            phase: RoundPhase::Guessing,
            target: None,
            score: 0,
            results: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// 1-based.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target(&self) -> Option<LatLng> {
        self.target
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn is_finished(&self) -> bool {
        self.round >= self.config.rounds && self.phase == RoundPhase::Revealed
    }

    /// Places the hidden location for the current round.
    pub fn set_target(&mut self, target: LatLng) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::Finished);
        }
        if self.phase == RoundPhase::Revealed {
            return Err(GameError::AlreadyGuessed(self.round));
        }
        target.validate()?;
        self.target = Some(target);
        Ok(())
    }

    pub fn submit_guess(&mut self, guess: LatLng) -> Result<RoundResult, GameError> {
        if self.is_finished() {
            return Err(GameError::Finished);
        }
        if self.phase == RoundPhase::Revealed {
            return Err(GameError::AlreadyGuessed(self.round));
        }
        let target = self.target.ok_or(GameError::NoTarget(self.round))?;
        guess.validate()?;

        let distance_km = guess_distance_km(guess, target);
        let points = score_guess(distance_km);
        let result = RoundResult {
            round: self.round,
            target,
            guess,
            distance_km,
            points,
        };
        self.score += points;
        self.phase = RoundPhase::Revealed;
        self.results.push(result.clone());
        info!(
            round = self.round,
            distance_km = distance_km.round(),
            points,
            total = self.score,
            "guess scored"
        );
        Ok(result)
    }

    pub fn next_round(&mut self) -> Result<u32, GameError> {
        if self.is_finished() {
            return Err(GameError::Finished);
        }
        if self.phase != RoundPhase::Revealed {
            return Err(GameError::NotGuessed(self.round));
        }
        self.round += 1;
        self.phase = RoundPhase::Guessing;
        self.target = None;
        Ok(self.round)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        GameConfig, GameError, GameSession, RoundPhase, find_playable_location, random_location,
    };
    use crate::panorama::GridPanoramaProvider;
    use compute::MAX_ROUND_SCORE;
    use foundation::{GeoError, LatLng};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_locations_respect_the_latitude_band() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let p = random_location(&mut rng, 70.0);
            assert!((-70.0..=70.0).contains(&p.lat));
            assert!((-180.0..=180.0).contains(&p.lng));
        }
    }

    #[test]
    fn five_rounds_then_finished() {
        let mut game = GameSession::new(GameConfig::default());
        for round in 1..=5 {
            assert_eq!(game.round(), round);
            game.set_target(LatLng::new(10.0, 10.0)).unwrap();
            let r = game.submit_guess(LatLng::new(10.0, 10.0)).unwrap();
            assert_eq!(r.points, MAX_ROUND_SCORE);
            if round < 5 {
                assert_eq!(game.next_round(), Ok(round + 1));
            }
        }
        assert!(game.is_finished());
        assert_eq!(game.score(), 5 * MAX_ROUND_SCORE);
        assert_eq!(game.results().len(), 5);
        assert_eq!(game.next_round(), Err(GameError::Finished));
    }

    #[test]
    fn guesses_need_a_target_and_only_count_once() {
        let mut game = GameSession::new(GameConfig::default());
        assert_eq!(
            game.submit_guess(LatLng::new(0.0, 0.0)),
            Err(GameError::NoTarget(1))
        );
        assert_eq!(game.next_round(), Err(GameError::NotGuessed(1)));

        game.set_target(LatLng::new(0.0, 0.0)).unwrap();
        let r = game.submit_guess(LatLng::new(0.0, 10.0)).unwrap();
        assert_eq!(r.points, 2_777);
        assert_eq!(game.phase(), RoundPhase::Revealed);
        assert_eq!(
            game.submit_guess(LatLng::new(0.0, 0.0)),
            Err(GameError::AlreadyGuessed(1))
        );
        assert_eq!(game.score(), 2_777);
    }

    #[test]
    fn invalid_coordinates_are_rejected_without_scoring() {
        let mut game = GameSession::new(GameConfig::default());
        assert!(matches!(
            game.set_target(LatLng::new(f64::NAN, 0.0)),
            Err(GameError::InvalidLocation(GeoError::NonFiniteCoordinate { .. }))
        ));
        assert_eq!(game.target(), None);

        game.set_target(LatLng::new(0.0, 0.0)).unwrap();
        assert!(matches!(
            game.submit_guess(LatLng::new(f64::NAN, f64::NAN)),
            Err(GameError::InvalidLocation(_))
        ));
        assert_eq!(
            game.submit_guess(LatLng::new(95.0, 0.0)),
            Err(GameError::InvalidLocation(GeoError::LatitudeOutOfRange(95.0)))
        );
        assert_eq!(game.phase(), RoundPhase::Guessing);
        assert_eq!(game.score(), 0);
        assert!(game.results().is_empty());

        let r = game.submit_guess(LatLng::new(0.0, 0.0)).unwrap();
        assert_eq!(r.points, MAX_ROUND_SCORE);
    }

    #[tokio::test]
    async fn playable_locations_come_from_the_provider() {
        let provider = GridPanoramaProvider {
            cell_deg: 0.25,
            coverage_pct: 100,
        };
        let mut rng = StdRng::seed_from_u64(11);
        let found = find_playable_location(&provider, &mut rng, &GameConfig::default())
            .await
            .expect("full coverage always plays");
        let snapped = (found.lat / 0.25).fract().abs();
        assert!(snapped < 1e-9 || snapped > 1.0 - 1e-9);
    }

    #[tokio::test]
    async fn playable_location_search_is_bounded() {
        let provider = GridPanoramaProvider {
            cell_deg: 0.25,
            coverage_pct: 0,
        };
        let mut rng = StdRng::seed_from_u64(11);
        let found = find_playable_location(&provider, &mut rng, &GameConfig::default()).await;
        assert!(found.is_none());
    }
}
