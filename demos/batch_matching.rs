//! Example of matching a large candidate set in parallel.
//!
//! Run with: cargo run --example batch_matching --features parallel

use route_poi::{
    Candidate, CandidateIndex, GpsPoint, MatchConfig, PoiCategory, PoiMatcher, RouteIndex,
};
use std::time::Instant;

fn main() {
    env_logger::init();

    println!("Batch POI Matching Example\n");

    // ~60 km gently curving route, 20k samples
    let route: Vec<GpsPoint> = (0..20_000)
        .map(|i| {
            let t = i as f64 / 20_000.0;
            GpsPoint::new(56.9 + t * 0.5, 24.1 + t * 0.4 + (t * 12.0).sin() * 0.02)
        })
        .collect();

    // Candidate grid over a larger area, loaded into an in-memory index
    let mut all = Vec::new();
    let mut id = 0;
    for row in 0..120 {
        for col in 0..120 {
            id += 1;
            let category = if (row + col) % 3 == 0 {
                PoiCategory::Fuel
            } else {
                PoiCategory::DrinkingWater
            };
            let location = GpsPoint::new(56.8 + row as f64 * 0.006, 24.0 + col as f64 * 0.006);
            all.push(Candidate::node(id, location).with_category(category));
        }
    }
    let poi_index = CandidateIndex::new(all);

    let index = RouteIndex::build(route);
    let Some(bounds) = index.bounds() else {
        return;
    };
    let candidates = poi_index.query(&bounds, Some(PoiCategory::DrinkingWater));

    println!(
        "Route: {} samples in {} buckets; {} of {} candidates inside route bounds",
        index.len(),
        index.num_buckets(),
        candidates.len(),
        poi_index.len()
    );

    let matcher = PoiMatcher::new(&index, MatchConfig::default());

    let start = Instant::now();
    let sequential = matcher.match_candidates(&candidates);
    let sequential_time = start.elapsed();

    let start = Instant::now();
    let parallel = matcher.match_candidates_parallel(&candidates);
    let parallel_time = start.elapsed();

    println!("Sequential: {} matches in {:?}", sequential.len(), sequential_time);
    println!("Parallel:   {} matches in {:?}", parallel.len(), parallel_time);
    println!("Identical results: {}", sequential == parallel);
}
