//! Nearest-sample matching of POIs against a bucketed route.
//!
//! ## Algorithm
//!
//! For each candidate:
//!
//! 1. **Coarse pass.** Compare the candidate with every bucket's midpoint and
//!    pick the closest bucket. The running minimum starts at
//!    [`MatchConfig::coarse_sentinel_km`]; if no midpoint beats it, bucket 0
//!    is used.
//! 2. **Fine pass.** Scan every `fine_stride`-th sample of that bucket and keep
//!    the closest one.
//! 3. Keep the candidate only if that distance is strictly below
//!    [`MatchConfig::threshold_km`].
//!
//! All distances are geodesic (WGS84) in kilometers. The result is an
//! approximation: the distance is to the nearest scanned sample, not to the
//! route polyline.
//!
//! ## Example
//!
//! ```rust
//! use route_poi::{Candidate, GpsPoint, MatchConfig, PoiMatcher, RouteIndex};
//!
//! let route: Vec<GpsPoint> = (0..30)
//!     .map(|i| GpsPoint::new(0.0, i as f64 * 0.03 / 29.0))
//!     .collect();
//! let index = RouteIndex::build(route);
//!
//! let matcher = PoiMatcher::new(&index, MatchConfig::default());
//! let matches = matcher.match_candidates(&[
//!     Candidate::point(0.0001, 0.015), // beside the route
//!     Candidate::point(0.5, 0.015),    // ~55 km away
//! ]);
//!
//! assert_eq!(matches.len(), 1);
//! assert!(matches[0].distance_km < 3.0);
//! ```

use crate::candidate::{Candidate, Resolution};
use crate::category::PoiCategory;
use crate::geo_utils::geodesic_distance_km;
use crate::route_index::{RouteBucket, RouteIndex};
use crate::split::{SplitPlanner, MIN_ROUTE_SPLITS};
use crate::GpsPoint;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Default match threshold in kilometers.
pub const DISTANCE_THRESHOLD_KM: f64 = 3.0;

/// Starting value for the coarse pass minimum, in kilometers.
pub const COARSE_SENTINEL_KM: f64 = 10.0;

/// Default fine pass stride (every third sample is checked).
pub const FINE_PASS_STRIDE: usize = 3;

/// Configuration for POI matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Maximum distance from the route for a POI to be kept (exclusive).
    /// Default: 3.0 km
    pub threshold_km: f64,

    /// Initial minimum for the coarse pass. A candidate further than this
    /// from every bucket midpoint falls back to bucket 0.
    /// Default: 10.0 km
    pub coarse_sentinel_km: f64,

    /// Only every n-th sample of the chosen bucket is measured.
    /// Larger strides are faster but less precise. 0 is treated as 1.
    /// Default: 3
    pub fine_stride: usize,

    /// Minimum number of buckets a route is split into when the index is
    /// built from this config (see [`MatchConfig::split_planner`]). A
    /// [`PoiMatcher`] over a prebuilt index does not re-split it.
    /// Default: 10
    pub min_buckets: usize,

    /// Extra margin around the route's bounding box when querying for
    /// candidates. 0 queries exactly the route's extent.
    /// Default: 0.0 km
    pub bbox_padding_km: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold_km: DISTANCE_THRESHOLD_KM,
            coarse_sentinel_km: COARSE_SENTINEL_KM,
            fine_stride: FINE_PASS_STRIDE,
            min_buckets: MIN_ROUTE_SPLITS,
            bbox_padding_km: 0.0,
        }
    }
}

impl MatchConfig {
    /// Planner that splits routes into at least `min_buckets` buckets.
    pub fn split_planner(&self) -> SplitPlanner {
        SplitPlanner::new(self.min_buckets)
    }
}

/// A candidate associated with its nearest route sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiMatch {
    /// Source identifier of the candidate, if any
    pub candidate_id: Option<i64>,
    pub category: Option<PoiCategory>,
    /// The POI's own coordinate
    pub poi: GpsPoint,
    /// Closest scanned route sample
    pub nearest_sample: GpsPoint,
    /// Index of `nearest_sample` in the full route
    pub sample_index: usize,
    /// Bucket selected by the coarse pass
    pub bucket_index: usize,
    /// Geodesic distance between `poi` and `nearest_sample`
    pub distance_km: f64,
}

/// Matches candidates against a prebuilt [`RouteIndex`].
///
/// Holds only a shared reference to the index, so any number of matchers
/// (one per category, one per thread) can run over the same route.
#[derive(Debug, Clone)]
pub struct PoiMatcher<'a> {
    index: &'a RouteIndex,
    config: MatchConfig,
}

impl<'a> PoiMatcher<'a> {
    pub fn new(index: &'a RouteIndex, config: MatchConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Match a bare coordinate. Returns `None` when it is not on the route.
    pub fn match_point(&self, poi: GpsPoint) -> Option<PoiMatch> {
        let bucket = self.nearest_bucket(&poi)?;
        let (sample_index, nearest_sample, distance_km) =
            self.closest_in_bucket(&bucket, &poi)?;

        if distance_km < self.config.threshold_km {
            Some(PoiMatch {
                candidate_id: None,
                category: None,
                poi,
                nearest_sample,
                sample_index,
                bucket_index: bucket.index,
                distance_km,
            })
        } else {
            None
        }
    }

    /// Match a single candidate; unresolved candidates are skipped.
    pub fn match_candidate(&self, candidate: &Candidate) -> Option<PoiMatch> {
        let poi = match &candidate.resolution {
            Resolution::Point(p) => *p,
            Resolution::Unresolved { reason } => {
                warn!(
                    "[PoiMatcher] Skipping unresolved candidate {:?}: {}",
                    candidate.id, reason
                );
                return None;
            }
        };

        self.match_point(poi).map(|m| PoiMatch {
            candidate_id: candidate.id,
            category: candidate.category,
            ..m
        })
    }

    /// Match every candidate, keeping input order.
    pub fn match_candidates(&self, candidates: &[Candidate]) -> Vec<PoiMatch> {
        if self.index.is_empty() {
            debug!("[PoiMatcher] Empty route, nothing to match");
            return Vec::new();
        }

        let start = std::time::Instant::now();

        let matches: Vec<PoiMatch> = candidates
            .iter()
            .filter_map(|c| self.match_candidate(c))
            .collect();

        info!(
            "[PoiMatcher] Matched {}/{} candidates against {} buckets in {:?}",
            matches.len(),
            candidates.len(),
            self.index.num_buckets(),
            start.elapsed()
        );

        matches
    }

    /// Match every candidate on the rayon pool, keeping input order.
    #[cfg(feature = "parallel")]
    pub fn match_candidates_parallel(&self, candidates: &[Candidate]) -> Vec<PoiMatch> {
        use rayon::prelude::*;

        if self.index.is_empty() {
            debug!("[PoiMatcher] Empty route, nothing to match");
            return Vec::new();
        }

        let start = std::time::Instant::now();

        let matches: Vec<PoiMatch> = candidates
            .par_iter()
            .filter_map(|c| self.match_candidate(c))
            .collect();

        info!(
            "[PoiMatcher] Matched {}/{} candidates (parallel) in {:?}",
            matches.len(),
            candidates.len(),
            start.elapsed()
        );

        matches
    }

    /// Coarse pass: bucket whose midpoint is closest to `poi`.
    fn nearest_bucket(&self, poi: &GpsPoint) -> Option<RouteBucket<'a>> {
        let mut closest = self.config.coarse_sentinel_km;
        let mut best = 0;

        for bucket in self.index.buckets() {
            let dist = geodesic_distance_km(&bucket.midpoint(), poi);
            if dist < closest {
                closest = dist;
                best = bucket.index;
            }
        }

        self.index.bucket_at(best)
    }

    /// Fine pass: closest strided sample in `bucket` as (global index, sample, km).
    fn closest_in_bucket(
        &self,
        bucket: &RouteBucket<'_>,
        poi: &GpsPoint,
    ) -> Option<(usize, GpsPoint, f64)> {
        let stride = self.config.fine_stride.max(1);
        let mut best: Option<(usize, GpsPoint, f64)> = None;

        for (offset, sample) in bucket.samples.iter().enumerate().step_by(stride) {
            let dist = geodesic_distance_km(sample, poi);
            if best.map_or(true, |(_, _, d)| dist < d) {
                best = Some((bucket.start + offset, *sample, dist));
            }
        }

        best
    }
}

/// Match candidates against a route with the default configuration and a
/// custom threshold.
pub fn match_candidates(
    index: &RouteIndex,
    candidates: &[Candidate],
    threshold_km: f64,
) -> Vec<PoiMatch> {
    let config = MatchConfig {
        threshold_km,
        ..MatchConfig::default()
    };
    PoiMatcher::new(index, config).match_candidates(candidates)
}
