//! Basic example of matching POIs against a route.
//!
//! Run with: cargo run --example basic_matching

use route_poi::{
    geo_utils, Candidate, GpsPoint, MatchConfig, PoiCategory, PoiMatcher, RouteIndex,
};

fn main() {
    env_logger::init();

    // A straight ~7 km route heading north-east out of Riga
    let route: Vec<GpsPoint> = (0..240)
        .map(|i| GpsPoint::new(56.9500 + i as f64 * 0.0002, 24.1000 + i as f64 * 0.0003))
        .collect();

    let candidates = vec![
        // Beside the start
        Candidate::node(1, GpsPoint::new(56.9505, 24.1010))
            .with_category(PoiCategory::DrinkingWater),
        // About 1 km off the middle of the route
        Candidate::node(2, GpsPoint::new(56.9700, 24.1250)).with_category(PoiCategory::Fuel),
        // Jurmala, too far away
        Candidate::node(3, GpsPoint::new(56.9680, 23.7704)).with_category(PoiCategory::Fuel),
        // A way whose lookup failed
        Candidate::unresolved(Some(4), route_poi::ElementKind::Way, "HTTP 504"),
    ];

    let config = MatchConfig::default();
    let index = RouteIndex::build(route);

    println!("POI Matching Example\n");
    println!(
        "Route: {} samples, {:.1} km, {} buckets of {}",
        index.len(),
        geo_utils::polyline_length_km(index.samples()),
        index.num_buckets(),
        index.bucket_size()
    );
    println!(
        "Config: threshold={}km, stride={}, sentinel={}km\n",
        config.threshold_km, config.fine_stride, config.coarse_sentinel_km
    );

    let matcher = PoiMatcher::new(&index, config);
    let matches = matcher.match_candidates(&candidates);

    for m in &matches {
        let label = m.category.map_or("Unknown", |c| c.label());
        let style = m.category.map(|c| c.marker_style());
        println!(
            "  #{:?} {} ({:?}): {:.3} km from sample {} (bucket {})",
            m.candidate_id,
            label,
            style.map(|s| s.icon),
            m.distance_km,
            m.sample_index,
            m.bucket_index
        );
    }

    println!(
        "\n{} of {} candidates are on the route",
        matches.len(),
        candidates.len()
    );
}
