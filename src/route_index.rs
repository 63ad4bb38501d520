//! Bucketed route index.
//!
//! A route is split into equal, contiguous buckets (see [`SplitPlanner`]).
//! Each bucket is represented by its midpoint sample, which is what the
//! matcher's coarse pass compares candidates against.

use crate::geo_utils::compute_bounds;
use crate::split::SplitPlanner;
use crate::{Bounds, GpsPoint};
use log::debug;

/// Immutable, bucketed view over a route's samples.
///
/// Built once per route and shared by every matcher invocation.
///
/// # Example
/// ```
/// use route_poi::{GpsPoint, RouteIndex};
///
/// let route: Vec<GpsPoint> = (0..30)
///     .map(|i| GpsPoint::new(57.0 + i as f64 * 0.001, 24.0))
///     .collect();
///
/// let index = RouteIndex::build(route);
/// assert_eq!(index.num_buckets(), 10);
/// assert_eq!(index.bucket_size(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct RouteIndex {
    samples: Vec<GpsPoint>,
    num_buckets: usize,
    bucket_size: usize,
    bounds: Option<Bounds>,
}

/// A contiguous slice of the route.
#[derive(Debug, Clone, Copy)]
pub struct RouteBucket<'a> {
    /// Bucket index in `0..num_buckets`
    pub index: usize,
    /// Global index of the bucket's first sample
    pub start: usize,
    /// The bucket's samples, borrowed from the route
    pub samples: &'a [GpsPoint],
}

impl<'a> RouteBucket<'a> {
    /// Local index of the representative midpoint.
    pub fn midpoint_offset(&self) -> usize {
        self.samples.len() / 2
    }

    /// The representative sample used by the coarse pass.
    pub fn midpoint(&self) -> GpsPoint {
        self.samples[self.midpoint_offset()]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl RouteIndex {
    /// Build an index using the default split planner.
    pub fn build(samples: Vec<GpsPoint>) -> Self {
        Self::build_with(samples, &SplitPlanner::default())
    }

    /// Build an index with a custom split planner.
    ///
    /// An empty route produces an index with zero buckets; matching against
    /// it yields nothing.
    pub fn build_with(samples: Vec<GpsPoint>, planner: &SplitPlanner) -> Self {
        let Some(num_buckets) = planner.compute_split_count(samples.len()) else {
            debug!("[RouteIndex] Empty route, no buckets");
            return Self {
                samples,
                num_buckets: 0,
                bucket_size: 0,
                bounds: None,
            };
        };

        debug_assert_eq!(
            samples.len() % num_buckets,
            0,
            "split count must divide the sample count"
        );
        let bucket_size = samples.len() / num_buckets;
        let bounds = compute_bounds(&samples);

        debug!(
            "[RouteIndex] {} samples -> {} buckets of {}",
            samples.len(),
            num_buckets,
            bucket_size
        );

        Self {
            samples,
            num_buckets,
            bucket_size,
            bounds,
        }
    }

    pub fn num_buckets(&self) -> usize {
        self.num_buckets
    }

    /// Samples per bucket (0 for an empty route).
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// All route samples in traversal order.
    pub fn samples(&self) -> &[GpsPoint] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Bounding box of the whole route, `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// The `i`-th bucket, or `None` if out of range.
    pub fn bucket_at(&self, i: usize) -> Option<RouteBucket<'_>> {
        if i >= self.num_buckets {
            return None;
        }
        let start = i * self.bucket_size;
        Some(RouteBucket {
            index: i,
            start,
            samples: &self.samples[start..start + self.bucket_size],
        })
    }

    /// Midpoint sample of the `i`-th bucket.
    pub fn midpoint_of(&self, i: usize) -> Option<GpsPoint> {
        self.bucket_at(i).map(|b| b.midpoint())
    }

    /// Iterate over buckets in index order.
    pub fn buckets(&self) -> impl Iterator<Item = RouteBucket<'_>> + '_ {
        (0..self.num_buckets).filter_map(move |i| self.bucket_at(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_route(n: usize) -> Vec<GpsPoint> {
        (0..n)
            .map(|i| GpsPoint::new(57.0 + i as f64 * 0.0005, 24.0 + i as f64 * 0.0002))
            .collect()
    }

    #[test]
    fn test_build_partitions_route() {
        for n in [1, 7, 10, 12, 30, 97, 1000, 1234] {
            let route = line_route(n);
            let index = RouteIndex::build(route.clone());

            let sizes: usize = index.buckets().map(|b| b.len()).sum();
            assert_eq!(sizes, n);
            assert_eq!(index.buckets().count(), index.num_buckets());

            let rebuilt: Vec<GpsPoint> = index
                .buckets()
                .flat_map(|b| b.samples.iter().copied())
                .collect();
            assert_eq!(rebuilt, route);
        }
    }

    #[test]
    fn test_buckets_are_contiguous_and_equal() {
        let index = RouteIndex::build(line_route(120));
        assert_eq!(index.num_buckets(), 10);
        assert_eq!(index.bucket_size(), 12);

        for (i, bucket) in index.buckets().enumerate() {
            assert_eq!(bucket.index, i);
            assert_eq!(bucket.start, i * 12);
            assert_eq!(bucket.len(), 12);
        }
    }

    #[test]
    fn test_midpoint() {
        let route = line_route(30);
        let index = RouteIndex::build(route.clone());

        // Bucket size 3, midpoint at local index 1
        assert_eq!(index.midpoint_of(0), Some(route[1]));
        assert_eq!(index.midpoint_of(4), Some(route[13]));
        assert_eq!(index.midpoint_of(9), Some(route[28]));
        assert_eq!(index.midpoint_of(10), None);
    }

    #[test]
    fn test_single_sample_buckets() {
        let route = line_route(5);
        let index = RouteIndex::build(route.clone());
        assert_eq!(index.num_buckets(), 5);
        assert_eq!(index.bucket_size(), 1);
        assert_eq!(index.midpoint_of(3), Some(route[3]));
    }

    #[test]
    fn test_empty_route() {
        let index = RouteIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.num_buckets(), 0);
        assert_eq!(index.bucket_size(), 0);
        assert!(index.bucket_at(0).is_none());
        assert!(index.bounds().is_none());
        assert_eq!(index.buckets().count(), 0);
    }

    #[test]
    fn test_bounds() {
        let index = RouteIndex::build(line_route(10));
        let bounds = index.bounds().unwrap();
        assert_eq!(bounds.min_lat, 57.0);
        assert_eq!(bounds.min_lng, 24.0);
        assert!(bounds.max_lat > bounds.min_lat);
    }

    #[test]
    fn test_custom_planner() {
        let index = RouteIndex::build_with(line_route(12), &SplitPlanner::new(4));
        assert_eq!(index.num_buckets(), 4);
        assert_eq!(index.bucket_size(), 3);
    }
}
