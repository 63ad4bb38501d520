//! Fetch POIs from Overpass for a GPX route and print the ones on it.
//!
//! Run with: cargo run --example overpass_route --features "http gpx" -- route.gpx water fuel

use route_poi::{find_route_pois, parse_route, MatchConfig, OverpassClient, PoiCategory};
use std::fs::File;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or("usage: overpass_route <route.gpx> [water|fuel|store|rmk ...]")?;

    let mut categories: Vec<PoiCategory> = args
        .map(|a| a.parse())
        .collect::<Result<_, _>>()?;
    if categories.is_empty() {
        categories = PoiCategory::ALL.to_vec();
    }

    let route = parse_route(File::open(&path)?)?;
    println!("Loaded {} samples from {}", route.len(), path);

    let client = OverpassClient::new()?;
    let config = MatchConfig::default();

    let start = Instant::now();
    let results = find_route_pois(&client, route, &categories, &config).await?;

    for result in &results {
        println!(
            "\n{} ({} candidates, {} unresolved): {} on route",
            result.category.label(),
            result.candidate_count,
            result.unresolved_count,
            result.matches.len()
        );
        for m in &result.matches {
            println!(
                "  {:.5},{:.5}  {:.2} km from route (sample {})",
                m.poi.latitude, m.poi.longitude, m.distance_km, m.sample_index
            );
        }
    }

    println!("\nDone in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
