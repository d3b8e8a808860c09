//! Street-level panorama lookup.
//!
//! The panorama service itself lives outside this crate; it is reached through
//! the [`PanoramaProvider`] trait. The lookup policy here widens the search
//! radius until a panorama turns up or a ceiling is passed.

use std::future::Future;
use std::pin::Pin;

use compute::AnimationFrame;
use foundation::{EARTH_RADIUS_M, LatLng, haversine_distance_m, wrap_longitude};
use serde::Serialize;
use tracing::{debug, warn};

/// Error type for panorama provider failures.
///
/// "Nothing within the radius" is not an error; providers report it as `Ok(None)`.
#[derive(Debug)]
pub struct PanoramaError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for PanoramaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PanoramaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl PanoramaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanoramaRequest {
    pub location: LatLng,
    pub radius_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Panorama {
    pub pano_id: String,
    pub location: LatLng,
}

/// Nearest-panorama lookup offered by the map provider.
pub trait PanoramaProvider: Send + Sync {
    /// Returns `Ok(None)` when no panorama lies within `request.radius_m`.
    fn nearest(&self, request: PanoramaRequest)
    -> BoxFuture<'_, Result<Option<Panorama>, PanoramaError>>;
}

/// Radius-doubling search policy.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PanoramaSearch {
    pub initial_radius_m: f64,
    /// The search keeps growing while the last failed radius is below this.
    pub radius_ceiling_m: f64,
    pub growth: f64,
}

impl Default for PanoramaSearch {
    fn default() -> Self {
        Self {
            initial_radius_m: 50.0,
            radius_ceiling_m: 5_000.0,
            growth: 2.0,
        }
    }
}

impl PanoramaSearch {
    /// Radii tried in order. With the defaults: 50, 100, …, 3200, 6400.
    pub fn radii(&self) -> impl Iterator<Item = f64> + '_ {
        let grows = self.growth > 1.0 && self.growth.is_finite();
        std::iter::successors(Some(self.initial_radius_m), move |&r| {
            (grows && r < self.radius_ceiling_m).then_some(r * self.growth)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanoramaLookup {
    pub panorama: Panorama,
    pub attempts: u32,
    pub radius_m: f64,
}

/// Finds the panorama nearest to `location`, widening the radius after every miss.
///
/// Returns `None` once the radius ladder is exhausted or the provider fails;
/// callers drop the panorama view instead of failing.
pub async fn find_nearest_panorama<P>(
    provider: &P,
    location: LatLng,
    search: PanoramaSearch,
) -> Option<PanoramaLookup>
where
    P: PanoramaProvider + ?Sized,
{
    let mut attempts = 0u32;
    for radius_m in search.radii() {
        attempts += 1;
        match provider.nearest(PanoramaRequest { location, radius_m }).await {
            Ok(Some(panorama)) => {
                debug!(attempts, radius_m, pano = %panorama.pano_id, "panorama found");
                return Some(PanoramaLookup {
                    panorama,
                    attempts,
                    radius_m,
                });
            }
            Ok(None) => debug!(attempts, radius_m, "no panorama within radius"),
            Err(err) => {
                warn!("panorama lookup failed: {err}");
                return None;
            }
        }
    }
    debug!(attempts, ?location, "no panorama available");
    None
}

/// Street-level view of a landing site.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingView {
    pub panorama: Panorama,
    /// Camera heading, matching the balloon's direction of travel.
    pub heading: f64,
    pub search_radius_m: f64,
}

/// Resolves the landing view for the final frame of a descent.
///
/// Non-final frames and failed lookups yield `None`.
pub async fn landing_view<P>(
    provider: &P,
    frame: &AnimationFrame,
    heading: f64,
    search: PanoramaSearch,
) -> Option<LandingView>
where
    P: PanoramaProvider + ?Sized,
{
    let landing = frame.landing_location?;
    let lookup = find_nearest_panorama(provider, landing, search).await?;
    Some(LandingView {
        panorama: lookup.panorama,
        heading,
        search_radius_m: lookup.radius_m,
    })
}

/// Offline provider: panoramas sit on a regular lat/lng grid, and a
/// deterministic hash decides which grid nodes have coverage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridPanoramaProvider {
    pub cell_deg: f64,
    /// Share of grid nodes with a panorama, in `0..=100`.
    pub coverage_pct: u8,
}

impl Default for GridPanoramaProvider {
    fn default() -> Self {
        Self {
            cell_deg: 0.02,
            coverage_pct: 60,
        }
    }
}

impl GridPanoramaProvider {
    fn covered(&self, i: i64, j: i64) -> bool {
        let mut h = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (j as u64);
        h ^= h >> 33;
        h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        h ^= h >> 33;
        h % 100 < u64::from(self.coverage_pct)
    }

    fn lookup(&self, request: PanoramaRequest) -> Option<Panorama> {
        if self.cell_deg <= 0.0 || !self.cell_deg.is_finite() {
            return None;
        }
        let origin = request.location;
        let ci = (origin.lat / self.cell_deg).round() as i64;
        let cj = (origin.lng / self.cell_deg).round() as i64;
        let half_turn = (180.0 / self.cell_deg).ceil() as i64;
        let angular = (request.radius_m / EARTH_RADIUS_M).to_degrees();
        let lat_reach = ((angular / self.cell_deg).ceil() as i64 + 1).min(half_turn);

        let mut best: Option<(f64, i64, i64)> = None;
        for i in (ci - lat_reach)..=(ci + lat_reach) {
            let lat = i as f64 * self.cell_deg;
            if !(-90.0..=90.0).contains(&lat) {
                continue;
            }
            let lng_reach = longitude_reach_deg(origin.lat, lat, request.radius_m)
                .map_or(half_turn, |deg| {
                    ((deg / self.cell_deg).ceil() as i64 + 1).min(half_turn)
                });
            for j in (cj - lng_reach)..=(cj + lng_reach) {
                let lng = wrap_longitude(j as f64 * self.cell_deg);
                let j = (lng / self.cell_deg).round() as i64;
                if !self.covered(i, j) {
                    continue;
                }
                let d = haversine_distance_m(origin, LatLng::new(lat, lng));
                if d <= request.radius_m && best.is_none_or(|(bd, _, _)| d < bd) {
                    best = Some((d, i, j));
                }
            }
        }

        best.map(|(_, i, j)| Panorama {
            pano_id: format!("grid-{i}-{j}"),
            location: LatLng::new(
                i as f64 * self.cell_deg,
                wrap_longitude(j as f64 * self.cell_deg),
            ),
        })
    }
}

/// Widest longitude offset at which a point on latitude `row_lat` can still
/// lie within `radius_m` of a point on `origin_lat`. `None` means any longitude.
///
/// From the haversine form: `cos φ0 · cos φ1 · sin²(Δλ/2) <= sin²(d / 2R)`.
fn longitude_reach_deg(origin_lat: f64, row_lat: f64, radius_m: f64) -> Option<f64> {
    let half_angle = (radius_m / (2.0 * EARTH_RADIUS_M)).min(std::f64::consts::FRAC_PI_2);
    let cos_product = origin_lat.to_radians().cos() * row_lat.to_radians().cos();
    if cos_product <= 0.0 {
        return None;
    }
    let s = half_angle.sin() / cos_product.sqrt();
    (s < 1.0).then(|| (2.0 * s.asin()).to_degrees())
}

impl PanoramaProvider for GridPanoramaProvider {
    fn nearest(
        &self,
        request: PanoramaRequest,
    ) -> BoxFuture<'_, Result<Option<Panorama>, PanoramaError>> {
        Box::pin(async move { Ok(self.lookup(request)) })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BoxFuture, GridPanoramaProvider, longitude_reach_deg, Panorama, PanoramaError, PanoramaProvider,
        PanoramaRequest, PanoramaSearch, find_nearest_panorama, landing_view,
    };
    use compute::{DescentConfig, DescentPath};
    use foundation::{BalloonId, LatLng, haversine_distance_m};
    use parking_lot::Mutex;
    use scene::Balloon;

    /// Finds a panorama only once the radius reaches `found_at`.
    struct Scripted {
        found_at: Option<f64>,
        fail: bool,
        radii: Mutex<Vec<f64>>,
    }

    impl Scripted {
        fn new(found_at: Option<f64>) -> Self {
            Self {
                found_at,
                fail: false,
                radii: Mutex::new(Vec::new()),
            }
        }
    }

    impl PanoramaProvider for Scripted {
        fn nearest(
            &self,
            request: PanoramaRequest,
        ) -> BoxFuture<'_, Result<Option<Panorama>, PanoramaError>> {
            self.radii.lock().push(request.radius_m);
            let result = if self.fail {
                Err(PanoramaError::new("service unavailable"))
            } else {
                Ok(self
                    .found_at
                    .filter(|&r| request.radius_m >= r)
                    .map(|_| Panorama {
                        pano_id: "p".to_string(),
                        location: request.location,
                    }))
            };
            Box::pin(async move { result })
        }
    }

    #[test]
    fn default_ladder_doubles_past_the_ceiling_once() {
        let radii: Vec<f64> = PanoramaSearch::default().radii().collect();
        assert_eq!(
            radii,
            vec![50.0, 100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0]
        );
    }

    #[test]
    fn non_growing_ladder_tries_once() {
        let search = PanoramaSearch {
            growth: 1.0,
            ..PanoramaSearch::default()
        };
        assert_eq!(search.radii().count(), 1);
    }

    #[tokio::test]
    async fn widens_until_found() {
        let provider = Scripted::new(Some(400.0));
        let found = find_nearest_panorama(
            &provider,
            LatLng::new(1.0, 2.0),
            PanoramaSearch::default(),
        )
        .await
        .expect("found at 400");
        assert_eq!(found.attempts, 4);
        assert_eq!(found.radius_m, 400.0);
        assert_eq!(*provider.radii.lock(), vec![50.0, 100.0, 200.0, 400.0]);
    }

    #[tokio::test]
    async fn gives_up_after_the_ceiling() {
        let provider = Scripted::new(None);
        let found =
            find_nearest_panorama(&provider, LatLng::new(0.0, 0.0), PanoramaSearch::default())
                .await;
        assert!(found.is_none());
        assert_eq!(provider.radii.lock().len(), 8);
    }

    #[tokio::test]
    async fn provider_errors_degrade_to_none() {
        let mut provider = Scripted::new(Some(50.0));
        provider.fail = true;
        let found =
            find_nearest_panorama(&provider, LatLng::new(0.0, 0.0), PanoramaSearch::default())
                .await;
        assert!(found.is_none());
        assert_eq!(provider.radii.lock().len(), 1);
    }

    #[tokio::test]
    async fn landing_view_needs_the_final_frame() {
        let balloon = Balloon {
            id: BalloonId::from("a"),
            name: "A".to_string(),
            latitude: 40.0,
            longitude: -100.0,
            altitude: 20_000.0,
            speed: 40.0,
            direction: 135.0,
        };
        let path = DescentPath::new(&balloon, DescentConfig::default());
        let provider = Scripted::new(Some(50.0));

        let mid = landing_view(&provider, &path.frame(50), 135.0, PanoramaSearch::default()).await;
        assert!(mid.is_none());

        let view = landing_view(&provider, &path.frame(100), 135.0, PanoramaSearch::default())
            .await
            .expect("landing view");
        assert_eq!(view.heading, 135.0);
        assert_eq!(view.panorama.location, path.landing());
    }

    #[tokio::test]
    async fn grid_provider_respects_the_radius() {
        let provider = GridPanoramaProvider {
            cell_deg: 0.01,
            coverage_pct: 100,
        };
        let origin = LatLng::new(45.0051, 7.0049);
        let tight = provider
            .nearest(PanoramaRequest {
                location: origin,
                radius_m: 10.0,
            })
            .await
            .unwrap();
        assert!(tight.is_none());

        let wide = provider
            .nearest(PanoramaRequest {
                location: origin,
                radius_m: 2_000.0,
            })
            .await
            .unwrap()
            .expect("full coverage");
        assert!(haversine_distance_m(origin, wide.location) <= 2_000.0);
        assert_eq!(wide.pano_id, "grid-4501-700");
    }

    #[test]
    fn longitude_reach_widens_toward_the_poles() {
        let equator = longitude_reach_deg(0.0, 0.0, 50_000.0).unwrap();
        let high = longitude_reach_deg(70.0, 70.0, 50_000.0).unwrap();
        assert!((equator - 0.4497).abs() < 1e-3, "{equator}");
        assert!((high - equator / 70f64.to_radians().cos()).abs() < 1e-3, "{high}");
        assert_eq!(longitude_reach_deg(89.9, 89.9, 50_000.0), None);
    }

    #[tokio::test]
    async fn grid_provider_matches_a_full_scan_at_high_latitude() {
        let provider = GridPanoramaProvider {
            cell_deg: 0.5,
            coverage_pct: 30,
        };
        let radius_m = 150_000.0;
        for lng in [3.1, 7.4, 10.0, 12.6] {
            let origin = LatLng::new(75.2, lng);
            let mut expected: Option<f64> = None;
            for i in 140..=162 {
                for j in -30..=60 {
                    if !provider.covered(i, j) {
                        continue;
                    }
                    let node = LatLng::new(i as f64 * 0.5, j as f64 * 0.5);
                    let d = haversine_distance_m(origin, node);
                    if d <= radius_m && expected.is_none_or(|e| d < e) {
                        expected = Some(d);
                    }
                }
            }

            let found = provider
                .nearest(PanoramaRequest {
                    location: origin,
                    radius_m,
                })
                .await
                .unwrap()
                .map(|p| haversine_distance_m(origin, p.location));
            assert_eq!(found, expected, "origin {origin:?}");
        }
    }

    #[tokio::test]
    async fn grid_provider_with_no_coverage_finds_nothing() {
        let provider = GridPanoramaProvider {
            cell_deg: 0.05,
            coverage_pct: 0,
        };
        let found =
            find_nearest_panorama(&provider, LatLng::new(10.0, 10.0), PanoramaSearch::default())
                .await;
        assert!(found.is_none());
    }
}
