//! Candidate POIs and their resolution into a single coordinate.
//!
//! A candidate arrives either as a point (an OSM node) or as a way that
//! has to be reduced to one representative coordinate by a secondary lookup.
//! That lookup can fail; instead of bubbling an error, the outcome is kept on
//! the candidate as a [`Resolution`] and the matcher skips unresolved ones.

use crate::category::PoiCategory;
use crate::error::Result;
use crate::{Bounds, GpsPoint};
use log::warn;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// The kind of source element a candidate was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
}

/// Outcome of locating a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Candidate has a usable coordinate
    Point(GpsPoint),
    /// Secondary resolution failed; the candidate will be skipped
    Unresolved { reason: String },
}

/// A POI eligible for matching against a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Source identifier (OSM element id), if known
    pub id: Option<i64>,
    pub kind: ElementKind,
    pub category: Option<PoiCategory>,
    pub resolution: Resolution,
}

impl Candidate {
    /// An anonymous point candidate.
    pub fn point(latitude: f64, longitude: f64) -> Self {
        Self {
            id: None,
            kind: ElementKind::Node,
            category: None,
            resolution: Resolution::Point(GpsPoint::new(latitude, longitude)),
        }
    }

    /// A node candidate with a known id.
    pub fn node(id: i64, location: GpsPoint) -> Self {
        Self {
            id: Some(id),
            kind: ElementKind::Node,
            category: None,
            resolution: Resolution::Point(location),
        }
    }

    /// A way candidate already reduced to a single coordinate.
    pub fn way(id: i64, location: GpsPoint) -> Self {
        Self {
            id: Some(id),
            kind: ElementKind::Way,
            category: None,
            resolution: Resolution::Point(location),
        }
    }

    /// A candidate whose location could not be determined.
    pub fn unresolved(id: Option<i64>, kind: ElementKind, reason: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            category: None,
            resolution: Resolution::Unresolved {
                reason: reason.into(),
            },
        }
    }

    /// Resolve a way through `resolver`, recording failure instead of returning it.
    pub fn from_way<R: WayResolver + ?Sized>(way_id: i64, resolver: &R) -> Self {
        match resolver.resolve_way(way_id) {
            Ok(location) => Self::way(way_id, location),
            Err(e) => {
                warn!("[Candidate] Failed to resolve way {}: {}", way_id, e);
                Self::unresolved(Some(way_id), ElementKind::Way, e.to_string())
            }
        }
    }

    pub fn with_category(mut self, category: PoiCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// The candidate's coordinate, if resolved.
    pub fn location(&self) -> Option<GpsPoint> {
        match &self.resolution {
            Resolution::Point(p) => Some(*p),
            Resolution::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Point(_))
    }
}

/// Reduces a way element to a single representative coordinate.
pub trait WayResolver {
    fn resolve_way(&self, way_id: i64) -> Result<GpsPoint>;
}

impl<F> WayResolver for F
where
    F: Fn(i64) -> Result<GpsPoint>,
{
    fn resolve_way(&self, way_id: i64) -> Result<GpsPoint> {
        self(way_id)
    }
}

// ============================================================================
// In-memory candidate source
// ============================================================================

#[derive(Debug, Clone)]
struct IndexedCandidate {
    seq: usize,
    location: GpsPoint,
    candidate: Candidate,
}

impl RTreeObject for IndexedCandidate {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.longitude, self.location.latitude])
    }
}

/// R-tree over a fixed set of candidates, answering bounding-box queries.
///
/// Offline stand-in for the Overpass query: load POIs once (e.g. from a
/// previous export), then pull the ones inside each route's bounds.
/// Unresolved candidates cannot be placed and are dropped on construction.
pub struct CandidateIndex {
    tree: RTree<IndexedCandidate>,
}

impl CandidateIndex {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let total = candidates.len();
        let items: Vec<IndexedCandidate> = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(seq, candidate)| {
                candidate.location().map(|location| IndexedCandidate {
                    seq,
                    location,
                    candidate,
                })
            })
            .collect();

        if items.len() < total {
            warn!(
                "[CandidateIndex] Dropped {} unresolved candidates",
                total - items.len()
            );
        }

        Self {
            tree: RTree::bulk_load(items),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Candidates inside `bounds` (inclusive), optionally restricted to a category.
    ///
    /// Results are returned in the order the candidates were supplied.
    pub fn query(&self, bounds: &Bounds, category: Option<PoiCategory>) -> Vec<Candidate> {
        let envelope = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );

        let mut hits: Vec<&IndexedCandidate> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter(|c| category.map_or(true, |cat| c.candidate.category == Some(cat)))
            .collect();
        hits.sort_by_key(|c| c.seq);

        hits.into_iter().map(|c| c.candidate.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutePoiError;

    #[test]
    fn test_point_candidate() {
        let c = Candidate::point(57.0, 24.0);
        assert!(c.is_resolved());
        assert_eq!(c.location(), Some(GpsPoint::new(57.0, 24.0)));
        assert_eq!(c.kind, ElementKind::Node);
    }

    #[test]
    fn test_way_resolution_success() {
        let resolver = |id: i64| -> Result<GpsPoint> {
            assert_eq!(id, 42);
            Ok(GpsPoint::new(57.5, 24.5))
        };
        let c = Candidate::from_way(42, &resolver);
        assert_eq!(c.id, Some(42));
        assert_eq!(c.kind, ElementKind::Way);
        assert_eq!(c.location(), Some(GpsPoint::new(57.5, 24.5)));
    }

    #[test]
    fn test_way_resolution_failure_is_recorded() {
        let resolver = |id: i64| -> Result<GpsPoint> {
            Err(RoutePoiError::WayResolution {
                way_id: id,
                message: "no nodes".to_string(),
            })
        };
        let c = Candidate::from_way(7, &resolver);
        assert!(!c.is_resolved());
        assert!(c.location().is_none());
        match c.resolution {
            Resolution::Unresolved { reason } => assert!(reason.contains("no nodes")),
            other => panic!("expected unresolved, got {:?}", other),
        }
    }

    #[test]
    fn test_candidate_index_query() {
        let candidates = vec![
            Candidate::node(1, GpsPoint::new(57.05, 24.05)).with_category(PoiCategory::Fuel),
            Candidate::node(2, GpsPoint::new(58.00, 25.00)).with_category(PoiCategory::Fuel),
            Candidate::node(3, GpsPoint::new(57.02, 24.08))
                .with_category(PoiCategory::DrinkingWater),
            Candidate::unresolved(Some(4), ElementKind::Way, "timeout"),
        ];
        let index = CandidateIndex::new(candidates);
        assert_eq!(index.len(), 3);

        let bounds = Bounds {
            min_lat: 57.0,
            max_lat: 57.1,
            min_lng: 24.0,
            max_lng: 24.1,
        };

        let all = index.query(&bounds, None);
        let ids: Vec<Option<i64>> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);

        let water = index.query(&bounds, Some(PoiCategory::DrinkingWater));
        assert_eq!(water.len(), 1);
        assert_eq!(water[0].id, Some(3));
    }

    #[test]
    fn test_candidate_serialization() {
        let c = Candidate::node(10, GpsPoint::new(57.0, 24.0)).with_category(PoiCategory::Fuel);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"kind\":\"node\""));
        let back: Candidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
