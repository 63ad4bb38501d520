//! # Route POI
//!
//! Overlay points of interest from OpenStreetMap onto a GPS route.
//!
//! This library provides:
//! - Route bucketing for coarse nearest-segment lookup
//! - Nearest-sample matching of POIs with a distance threshold
//! - Overpass API queries per POI category, including way resolution
//! - Parallel matching for large candidate sets
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel matching with rayon
//! - **`http`** - Enable the Overpass client and end-to-end pipeline
//! - **`gpx`** - Enable GPX route parsing
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use route_poi::{Candidate, GpsPoint, MatchConfig, PoiMatcher, RouteIndex};
//!
//! // A short route along the Daugava embankment in Riga
//! let route: Vec<GpsPoint> = (0..100)
//!     .map(|i| GpsPoint::new(56.9400 + i as f64 * 0.0001, 24.1000 + i as f64 * 0.0002))
//!     .collect();
//!
//! let index = RouteIndex::build(route);
//! let matcher = PoiMatcher::new(&index, MatchConfig::default());
//!
//! let candidates = vec![
//!     Candidate::point(56.9452, 24.1105), // next to the route
//!     Candidate::point(57.3100, 25.2700), // Sigulda, far away
//! ];
//!
//! for m in matcher.match_candidates(&candidates) {
//!     println!("POI {:?} is {:.2} km from sample {}", m.poi, m.distance_km, m.sample_index);
//! }
//! ```

use geo::Point;
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{OptionExt, Result, RoutePoiError};

pub mod geo_utils;

// Route bucketing
pub mod split;
pub use split::{compute_split_count, SplitPlanner, MIN_ROUTE_SPLITS};

pub mod route_index;
pub use route_index::{RouteBucket, RouteIndex};

// Candidates and categories
pub mod candidate;
pub use candidate::{Candidate, CandidateIndex, ElementKind, Resolution, WayResolver};

pub mod category;
pub use category::{MarkerStyle, PoiCategory};

// Matching
pub mod matcher;
pub use matcher::{
    match_candidates, MatchConfig, PoiMatch, PoiMatcher, COARSE_SENTINEL_KM,
    DISTANCE_THRESHOLD_KM, FINE_PASS_STRIDE,
};

// GPX input
#[cfg(feature = "gpx")]
pub mod gpx_route;

#[cfg(feature = "gpx")]
pub use gpx_route::{parse_route, parse_route_bytes};

// Overpass client
#[cfg(feature = "http")]
pub mod overpass;

#[cfg(feature = "http")]
pub use overpass::{find_route_pois, find_route_pois_blocking, CategoryMatches, OverpassClient};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude, in degrees (WGS84).
///
/// # Example
/// ```
/// use route_poi::GpsPoint;
/// let point = GpsPoint::new(56.9496, 24.1052); // Riga
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// As a `geo` point (x = longitude, y = latitude).
    #[inline]
    pub fn to_point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

/// Bounding box of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

// ============================================================================
// Tests
// ============================================================================
