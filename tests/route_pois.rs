//! End-to-end matching without the network: route -> index -> candidates -> matches.

use route_poi::{
    compute_split_count, Candidate, CandidateIndex, GpsPoint, MatchConfig, PoiCategory,
    PoiMatcher, Resolution, RouteIndex, RoutePoiError,
};

/// Loop around Lake Ķīšezers, roughly 1000 samples.
fn lake_loop() -> Vec<GpsPoint> {
    let center = GpsPoint::new(57.00, 24.17);
    (0..1000)
        .map(|i| {
            let angle = i as f64 / 1000.0 * std::f64::consts::TAU;
            GpsPoint::new(
                center.latitude + 0.03 * angle.sin(),
                center.longitude + 0.05 * angle.cos(),
            )
        })
        .collect()
}

#[test]
fn test_straight_line_scenario() {
    let route: Vec<GpsPoint> = (0..30)
        .map(|i| GpsPoint::new(0.0, i as f64 * 0.03 / 29.0))
        .collect();
    assert_eq!(compute_split_count(route.len()), Some(10));

    let index = RouteIndex::build(route);
    let matcher = PoiMatcher::new(&index, MatchConfig::default());
    let matches = matcher.match_candidates(&[Candidate::point(0.0001, 0.015)]);

    assert_eq!(matches.len(), 1);
    assert!(matches[0].distance_km < 3.0);
    assert!(matches[0].sample_index.abs_diff(15) <= 3);
}

#[test]
fn test_lake_loop_with_candidate_index() {
    let route = lake_loop();
    let index = RouteIndex::build(route.clone());
    assert_eq!(index.num_buckets(), 10);

    let pois = vec![
        // On the shore path
        Candidate::node(1, route[250]).with_category(PoiCategory::DrinkingWater),
        // Lake center: just over 3 km from the nearest shore sample
        Candidate::node(2, GpsPoint::new(57.00, 24.17)).with_category(PoiCategory::DrinkingWater),
        // Just outside the loop on the west side
        Candidate::node(3, GpsPoint::new(57.00, 24.115)).with_category(PoiCategory::DrinkingWater),
        // Outside the route bounds entirely
        Candidate::node(4, GpsPoint::new(57.20, 24.50)).with_category(PoiCategory::DrinkingWater),
        // Different category
        Candidate::node(5, route[600]).with_category(PoiCategory::Fuel),
    ];
    let poi_index = CandidateIndex::new(pois);

    let bounds = index.bounds().unwrap();
    let water = poi_index.query(&bounds, Some(PoiCategory::DrinkingWater));
    let ids: Vec<Option<i64>> = water.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2)]);

    let matcher = PoiMatcher::new(&index, MatchConfig::default());
    let matches = matcher.match_candidates(&water);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].candidate_id, Some(1));
    assert_eq!(matches[0].category, Some(PoiCategory::DrinkingWater));

    // Candidate 3 sits outside the bounding box but close to the route
    let padded = route_poi::geo_utils::expand_bounds(&bounds, 3.0);
    let padded_ids: Vec<Option<i64>> = poi_index
        .query(&padded, Some(PoiCategory::DrinkingWater))
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(padded_ids, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_way_resolution_failures_do_not_stop_matching() {
    let route = lake_loop();
    let index = RouteIndex::build(route.clone());

    let resolver = |way_id: i64| -> route_poi::Result<GpsPoint> {
        if way_id % 2 == 0 {
            Ok(route[(way_id as usize * 37) % route.len()])
        } else {
            Err(RoutePoiError::WayResolution {
                way_id,
                message: "gateway timeout".to_string(),
            })
        }
    };

    let candidates: Vec<Candidate> = (1..=10)
        .map(|id| Candidate::from_way(id, &resolver))
        .collect();
    assert_eq!(candidates.iter().filter(|c| c.is_resolved()).count(), 5);
    assert!(matches!(
        candidates[0].resolution,
        Resolution::Unresolved { .. }
    ));

    let matches = PoiMatcher::new(&index, MatchConfig::default()).match_candidates(&candidates);
    let ids: Vec<Option<i64>> = matches.iter().map(|m| m.candidate_id).collect();
    assert_eq!(ids, vec![Some(2), Some(4), Some(6), Some(8), Some(10)]);
}

#[test]
fn test_match_serializes_for_presentation() {
    let route = lake_loop();
    let index = RouteIndex::build(route.clone());
    let m = PoiMatcher::new(&index, MatchConfig::default())
        .match_candidate(&Candidate::node(42, route[3]).with_category(PoiCategory::RmkHut))
        .unwrap();

    let json = serde_json::to_value(&m).unwrap();
    assert_eq!(json["candidate_id"], 42);
    assert_eq!(json["category"], "rmk_hut");
    assert!(json["distance_km"].as_f64().unwrap() < 1e-6);
}
