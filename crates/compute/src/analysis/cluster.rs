use foundation::{BalloonId, LatLng, PixelProjector, Vec2};
use scene::Balloon;
use serde::Serialize;

/// Zoom level at and above which markers are shown individually.
pub const CLUSTERING_MAX_ZOOM: f64 = 8.0;
/// Default merge distance between a marker and a cluster centroid.
pub const DEFAULT_CLUSTER_THRESHOLD_PX: f64 = 50.0;

/// Balloons merged into one marker. Rebuilt from scratch on every viewport
/// or registry change; clusters carry no identity between rebuilds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub center: LatLng,
    pub count: usize,
    pub member_ids: Vec<BalloonId>,
}

impl Cluster {
    fn singleton(balloon: &Balloon) -> Self {
        Self {
            center: balloon.position(),
            count: 1,
            member_ids: vec![balloon.id.clone()],
        }
    }
}

/// Greedy single pass proximity clustering in pixel space.
///
/// Balloons are visited in slice order. Each unassigned balloon seeds a
/// cluster, which then absorbs every later unassigned balloon whose projected
/// position lies strictly within `threshold_px` of the cluster's running
/// centroid. O(n²); membership depends on visit order for borderline points.
///
/// The result partitions the input: every balloon lands in exactly one cluster.
pub fn cluster_by_proximity<P>(
    balloons: &[Balloon],
    projector: &P,
    threshold_px: f64,
    zoom: f64,
) -> Vec<Cluster>
where
    P: PixelProjector + ?Sized,
{
    let points: Vec<Vec2> = balloons
        .iter()
        .map(|b| projector.project(b.position(), zoom))
        .collect();
    let mut assigned = vec![false; balloons.len()];
    let mut clusters = Vec::new();

    for seed in 0..balloons.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;

        let mut cluster = Cluster::singleton(&balloons[seed]);
        let mut centroid_px = points[seed];

        for candidate in (seed + 1)..balloons.len() {
            if assigned[candidate] || points[candidate].distance(centroid_px) >= threshold_px {
                continue;
            }
            assigned[candidate] = true;

            let member = &balloons[candidate];
            cluster.count += 1;
            cluster.member_ids.push(member.id.clone());

            let w = 1.0 / cluster.count as f64;
            centroid_px = centroid_px + (points[candidate] - centroid_px).scale(w);
            cluster.center = cluster.center.lerp(member.position(), w);
        }

        clusters.push(cluster);
    }

    clusters
}

/// Clusters for the current view: merged below [`CLUSTERING_MAX_ZOOM`],
/// one marker per balloon at or above it.
pub fn clusters_for_view<P>(
    balloons: &[Balloon],
    projector: &P,
    threshold_px: f64,
    zoom: f64,
) -> Vec<Cluster>
where
    P: PixelProjector + ?Sized,
{
    if zoom >= CLUSTERING_MAX_ZOOM {
        return balloons.iter().map(Cluster::singleton).collect();
    }
    cluster_by_proximity(balloons, projector, threshold_px, zoom)
}
