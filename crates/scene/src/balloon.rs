use foundation::{BalloonId, GeoError, LatLng, normalize_heading};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Center of the seeded fleet (geographic center of the contiguous US).
pub const SEED_CENTER: LatLng = LatLng {
    lat: 39.8283,
    lng: -98.5795,
};

/// A tracked weather balloon.
///
/// Units: degrees for position and heading (clockwise from north), feet for
/// altitude, miles per hour for ground speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balloon {
    pub id: BalloonId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed: f64,
    pub direction: f64,
}

impl Balloon {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<(), GeoError> {
        self.position().validate()?;
        check_non_negative("altitude", self.altitude)?;
        check_non_negative("speed", self.speed)?;
        if !self.direction.is_finite() {
            return Err(GeoError::NonFiniteHeading(self.direction));
        }
        Ok(())
    }

    /// Validates the record and folds its heading into `[0, 360)`.
    pub fn normalized(mut self) -> Result<Self, GeoError> {
        self.validate()?;
        self.direction = normalize_heading(self.direction);
        Ok(self)
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), GeoError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GeoError::NegativeQuantity { field, value })
    }
}

/// Generates `count` synthetic balloons scattered around [`SEED_CENTER`].
pub fn seed_balloons<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Balloon> {
    (0..count)
        .map(|i| Balloon {
            id: BalloonId::seeded(i),
            name: format!("Weather Balloon {}", i + 1),
            latitude: SEED_CENTER.lat + (rng.r#gen::<f64>() - 0.5) * 20.0,
            longitude: SEED_CENTER.lng + (rng.r#gen::<f64>() - 0.5) * 40.0,
            altitude: rng.gen_range(10_000.0..40_000.0),
            speed: rng.gen_range(20.0..70.0),
            direction: rng.gen_range(0.0..360.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Balloon, SEED_CENTER, seed_balloons};
    use foundation::{BalloonId, GeoError};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample() -> Balloon {
        Balloon {
            id: BalloonId::from("b"),
            name: "B".to_string(),
            latitude: 10.0,
            longitude: 20.0,
            altitude: 1000.0,
            speed: 30.0,
            direction: 45.0,
        }
    }

    #[test]
    fn seeded_fleet_is_valid_and_deterministic() {
        let a = seed_balloons(&mut StdRng::seed_from_u64(7), 10);
        let b = seed_balloons(&mut StdRng::seed_from_u64(7), 10);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        for (i, balloon) in a.iter().enumerate() {
            assert_eq!(balloon.id, BalloonId::seeded(i));
            assert_eq!(balloon.name, format!("Weather Balloon {}", i + 1));
            assert!(balloon.validate().is_ok());
            assert!((balloon.latitude - SEED_CENTER.lat).abs() <= 10.0);
            assert!((balloon.longitude - SEED_CENTER.lng).abs() <= 20.0);
            assert!((10_000.0..40_000.0).contains(&balloon.altitude));
            assert!((20.0..70.0).contains(&balloon.speed));
            assert!((0.0..360.0).contains(&balloon.direction));
        }
    }

    #[test]
    fn rejects_negative_speed_and_nan_heading() {
        let mut b = sample();
        b.speed = -1.0;
        assert_eq!(
            b.validate(),
            Err(GeoError::NegativeQuantity {
                field: "speed",
                value: -1.0
            })
        );

        let mut b = sample();
        b.direction = f64::INFINITY;
        assert!(matches!(b.validate(), Err(GeoError::NonFiniteHeading(_))));
    }

    #[test]
    fn normalized_wraps_heading() {
        let mut b = sample();
        b.direction = -90.0;
        assert_eq!(b.normalized().map(|b| b.direction), Ok(270.0));
    }
}
